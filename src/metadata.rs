//! Declarative variable and dimension definitions, and file inspection
//!
//! A write is described by a [`VarDefs`] map (variable name to [`VarDef`]), a
//! [`DimDefs`] map (dimension name to length) and optional [`Attributes`].
//! [`print_metadata`] shows what ended up in a file.

use crate::array::VarType;
use crate::errors::Result;
use netcdf::{AttributeValue, File};
use std::collections::BTreeMap;

/// Dimension name to length.
pub type DimDefs = BTreeMap<String, usize>;

/// Variable name to definition.
pub type VarDefs = BTreeMap<String, VarDef>;

/// Attribute name to value, for a variable or the file root.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Ordered dimension names of a variable.
///
/// A single name converts to a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dims(pub Vec<String>);

impl Dims {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Dims {
    fn from(name: &str) -> Self {
        Dims(vec![name.to_string()])
    }
}

impl From<String> for Dims {
    fn from(name: String) -> Self {
        Dims(vec![name])
    }
}

impl From<Vec<String>> for Dims {
    fn from(names: Vec<String>) -> Self {
        Dims(names)
    }
}

impl From<Vec<&str>> for Dims {
    fn from(names: Vec<&str>) -> Self {
        Dims(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Dims {
    fn from(names: &[&str]) -> Self {
        Dims(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Dims {
    fn from(names: [&str; N]) -> Self {
        Dims(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Schema of one variable to be written.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub dims: Dims,
    pub var_type: VarType,
    pub units: String,
    pub long_name: String,
    /// Extra attributes written after `units` and `long_name`
    pub attributes: Attributes,
}

impl VarDef {
    pub fn new(
        dims: impl Into<Dims>,
        var_type: VarType,
        units: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Self {
        Self {
            dims: dims.into(),
            var_type,
            units: units.into(),
            long_name: long_name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Like [`VarDef::new`] with the storage type given as a code such as `"float"`.
    pub fn with_type_code(
        dims: impl Into<Dims>,
        type_code: &str,
        units: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(dims, type_code.parse()?, units, long_name))
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

/// Definitions for the 10x10 `testarr` demo.
pub fn example_var_defs() -> VarDefs {
    let mut defs = VarDefs::new();
    defs.insert(
        "testarr".to_string(),
        VarDef::new(
            ["npts", "npts"],
            VarType::Double,
            "none",
            "test array to demonstrate code",
        ),
    );
    defs
}

/// Prints dimensions, variables with their attributes, and global attributes.
pub fn print_metadata(file: &File) -> Result<()> {
    println!("\n===== Dimensions =====");
    for dim in file.dimensions() {
        let unlimited = if dim.is_unlimited() { " (unlimited)" } else { "" };
        println!("- {} = {}{}", dim.name(), dim.len(), unlimited);
    }

    println!("\n===== Variables =====");
    for var in file.variables() {
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| format!("{}[{}]", d.name(), d.len()))
            .collect();
        let data_type = format!("{:?}", var.vartype()).to_lowercase();
        if dims.is_empty() {
            println!("- {} ({}): scalar", var.name(), data_type);
        } else {
            println!("- {} ({}): {}", var.name(), data_type, dims.join(", "));
        }
        for attr in var.attributes() {
            match attr.value() {
                Ok(AttributeValue::Str(s)) => println!("    {}: \"{}\"", attr.name(), s),
                Ok(value) => println!("    {}: {:?}", attr.name(), value),
                Err(e) => println!("    {}: (error reading value: {})", attr.name(), e),
            }
        }
    }

    println!("\n===== Global Attributes =====");
    for attr in file.attributes() {
        println!("- {}: {:?}", attr.name(), attr.value()?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_dim_is_promoted() {
        let def = VarDef::new("time", VarType::Double, "s", "time");
        assert_eq!(def.dims.names(), &["time".to_string()]);
    }

    #[test]
    fn test_type_code_definition() -> Result<()> {
        let def = VarDef::with_type_code(["npts", "npts"], "float", "none", "demo")?;
        assert_eq!(def.var_type, VarType::Double);
        assert_eq!(def.dims.len(), 2);
        assert!(VarDef::with_type_code("npts", "bogus", "none", "demo").is_err());
        Ok(())
    }

    #[test]
    fn test_example_var_defs() {
        let defs = example_var_defs();
        let testarr = &defs["testarr"];
        assert_eq!(testarr.units, "none");
        assert_eq!(testarr.dims.names(), &["npts", "npts"]);
    }

    #[test]
    fn test_extra_attributes() {
        let def = VarDef::new("x", VarType::Float, "m", "distance")
            .with_attribute("standard_name", "distance")
            .with_attribute("valid_min", 0.0f32);
        assert_eq!(def.attributes.len(), 2);
        assert!(matches!(
            def.attributes.get("standard_name"),
            Some(AttributeValue::Str(s)) if s == "distance"
        ));
    }
}
