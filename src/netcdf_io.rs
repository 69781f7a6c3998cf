//! NetCDF I/O: flatten-read of whole files and declarative writes
//!
//! [`ncread_vars`] materializes every top-level variable of a file into an
//! [`ArrayValue`], unpacking `scale_factor`/`add_offset` and masking fill
//! values unless [`ReadOptions`] asks for the stored values. [`write_nc`] creates a new file from [`VarDefs`],
//! [`DimDefs`] and a map of output arrays, letting a [`SetHeader`] callback
//! attach dataset-level description before the variables are declared.

use crate::array::{with_numeric, ArrayValue, VarType};
use crate::errors::{NcUtilsError, Result};
use crate::metadata::{example_var_defs, Attributes, DimDefs, VarDefs};
use crate::utils::{ensure_parent_dir, expand_user, normalize_path};
use ndarray::{Array2, ArrayD, Dimension};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::{AttributeValue, File, FileMut, GroupMut, Options, Variable, VariableMut};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Variable name to the array written into it.
pub type OutVars = BTreeMap<String, ArrayValue>;

/// Variable name to the array read from a file.
pub type NcVars = BTreeMap<String, ArrayValue>;

/// Configuration for [`ncread_vars_with`].
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Apply `scale_factor`/`add_offset` and replace fill values with NaN
    mask_and_scale: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            mask_and_scale: true,
        }
    }
}

impl ReadOptions {
    pub fn with_mask_and_scale(mut self, mask_and_scale: bool) -> Self {
        self.mask_and_scale = mask_and_scale;
        self
    }

    pub fn mask_and_scale(&self) -> bool {
        self.mask_and_scale
    }
}

/// On-disk format of a newly created file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// HDF5-backed netCDF-4 (groups, unsigned and 64-bit integer types).
    #[default]
    Netcdf4,
    /// netCDF classic with 64-bit offsets.
    Classic,
}

impl FileFormat {
    fn create_options(self) -> Options {
        match self {
            FileFormat::Netcdf4 => Options::NETCDF4,
            FileFormat::Classic => Options::_64BIT_OFFSET,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Netcdf4 => f.write_str("netCDF4"),
            FileFormat::Classic => f.write_str("netCDF classic"),
        }
    }
}

/// Configuration for [`write_nc`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Replace an existing destination instead of failing
    overwrite: bool,
    format: FileFormat,
    /// Global attributes set on the root group
    attributes: Option<Attributes>,
    /// Write dimensions and variables into this sub-group of the root
    group: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            format: FileFormat::default(),
            attributes: None,
            group: None,
        }
    }
}

impl WriteOptions {
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Checks the options against the variables about to be written.
    ///
    /// # Errors
    ///
    /// Returns [`NcUtilsError::InvalidOptions`] if a sub-group or a
    /// non-classic storage type is requested for a classic file.
    fn validate(&self, var_defs: &VarDefs) -> Result<()> {
        if self.format != FileFormat::Classic {
            return Ok(());
        }
        if let Some(group) = &self.group {
            return Err(NcUtilsError::InvalidOptions(format!(
                "group '{}' requires the netCDF4 format",
                group
            )));
        }
        if let Some((name, def)) = var_defs.iter().find(|(_, def)| !def.var_type.is_classic()) {
            return Err(NcUtilsError::InvalidOptions(format!(
                "type {} of variable '{}' is not available in the classic format",
                def.var_type, name
            )));
        }
        Ok(())
    }
}

/// A group that dimensions, attributes and variables can be added to.
///
/// Implemented for the root of a file being written and for its sub-groups.
pub trait NcGroup {
    fn create_dimension(&mut self, name: &str, len: usize) -> Result<()>;

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()>;

    fn create_variable(
        &mut self,
        name: &str,
        dims: &[&str],
        var_type: VarType,
    ) -> Result<VariableMut<'_>>;

    fn variable_to_write(&mut self, name: &str) -> Option<VariableMut<'_>>;
}

macro_rules! add_typed_variable {
    ($grp:expr, $name:expr, $dims:expr, $var_type:expr) => {
        match $var_type {
            VarType::Byte => $grp.add_variable::<i8>($name, $dims),
            VarType::UByte => $grp.add_variable::<u8>($name, $dims),
            VarType::Short => $grp.add_variable::<i16>($name, $dims),
            VarType::UShort => $grp.add_variable::<u16>($name, $dims),
            VarType::Int => $grp.add_variable::<i32>($name, $dims),
            VarType::UInt => $grp.add_variable::<u32>($name, $dims),
            VarType::Int64 => $grp.add_variable::<i64>($name, $dims),
            VarType::UInt64 => $grp.add_variable::<u64>($name, $dims),
            VarType::Float => $grp.add_variable::<f32>($name, $dims),
            VarType::Double => $grp.add_variable::<f64>($name, $dims),
            VarType::String => $grp.add_string_variable($name, $dims),
            VarType::Char => return Err(char_not_writable($name)),
        }
    };
}

fn char_not_writable(var: &str) -> NcUtilsError {
    NcUtilsError::UnsupportedType {
        var: var.to_string(),
        vartype: "char (write text as str)".to_string(),
    }
}

impl NcGroup for FileMut {
    fn create_dimension(&mut self, name: &str, len: usize) -> Result<()> {
        self.add_dimension(name, len)?;
        Ok(())
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()> {
        self.add_attribute(name, value)?;
        Ok(())
    }

    fn create_variable(
        &mut self,
        name: &str,
        dims: &[&str],
        var_type: VarType,
    ) -> Result<VariableMut<'_>> {
        Ok(add_typed_variable!(self, name, dims, var_type)?)
    }

    fn variable_to_write(&mut self, name: &str) -> Option<VariableMut<'_>> {
        self.variable_mut(name)
    }
}

impl NcGroup for GroupMut<'_> {
    fn create_dimension(&mut self, name: &str, len: usize) -> Result<()> {
        self.add_dimension(name, len)?;
        Ok(())
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()> {
        self.add_attribute(name, value)?;
        Ok(())
    }

    fn create_variable(
        &mut self,
        name: &str,
        dims: &[&str],
        var_type: VarType,
    ) -> Result<VariableMut<'_>> {
        Ok(add_typed_variable!(self, name, dims, var_type)?)
    }

    fn variable_to_write(&mut self, name: &str) -> Option<VariableMut<'_>> {
        self.variable_mut(name)
    }
}

/// Attaches dataset-level description to a group before its variables are declared.
pub trait SetHeader {
    fn set_header(&self, grp: &mut dyn NcGroup, out_vars: &OutVars) -> Result<()>;
}

impl<F> SetHeader for F
where
    F: Fn(&mut dyn NcGroup, &OutVars) -> Result<()>,
{
    fn set_header(&self, grp: &mut dyn NcGroup, out_vars: &OutVars) -> Result<()> {
        self(grp, out_vars)
    }
}

/// Header callback that leaves the group untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeader;

impl SetHeader for NoHeader {
    fn set_header(&self, _grp: &mut dyn NcGroup, _out_vars: &OutVars) -> Result<()> {
        Ok(())
    }
}

/// Where [`ncread_vars`] takes its variables from.
pub enum NcSource {
    Path(PathBuf),
    File(File),
}

impl From<&str> for NcSource {
    fn from(path: &str) -> Self {
        NcSource::Path(PathBuf::from(path))
    }
}

impl From<String> for NcSource {
    fn from(path: String) -> Self {
        NcSource::Path(PathBuf::from(path))
    }
}

impl From<&Path> for NcSource {
    fn from(path: &Path) -> Self {
        NcSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for NcSource {
    fn from(path: PathBuf) -> Self {
        NcSource::Path(path)
    }
}

impl From<&PathBuf> for NcSource {
    fn from(path: &PathBuf) -> Self {
        NcSource::Path(path.clone())
    }
}

impl From<File> for NcSource {
    fn from(file: File) -> Self {
        NcSource::File(file)
    }
}

/// Opens an existing NetCDF file for reading.
///
/// # Errors
///
/// Returns [`NcUtilsError::NotFound`] if the `~`-expanded path is not a file.
pub fn load_nc<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = expand_user(path);
    if !path.is_file() {
        return Err(NcUtilsError::NotFound { path });
    }
    Ok(netcdf::open(&path)?)
}

/// Reads every top-level variable of a file into memory.
///
/// Accepts a path or an already-open file; the file is closed before
/// returning either way. Packed variables are unpacked to `f64` and fill
/// values masked, see [`ReadOptions`].
pub fn ncread_vars(source: impl Into<NcSource>) -> Result<NcVars> {
    ncread_vars_with(source, &ReadOptions::default())
}

/// Like [`ncread_vars`] with explicit read options.
pub fn ncread_vars_with(source: impl Into<NcSource>, options: &ReadOptions) -> Result<NcVars> {
    let (file, origin) = match source.into() {
        NcSource::Path(path) => {
            let file = load_nc(&path)?;
            (file, path.display().to_string())
        }
        NcSource::File(file) => (file, "open dataset".to_string()),
    };

    let mut out = NcVars::new();
    for var in file.variables() {
        let value = read_variable(&var)?;
        let value = if options.mask_and_scale {
            mask_and_scale(&var, value)?
        } else {
            value
        };
        out.insert(var.name(), value);
    }
    drop(file);

    info!("Loaded {} variables from {}", out.len(), origin);
    Ok(out)
}

/// Materializes one variable with its stored element type and shape.
pub(crate) fn read_variable(var: &Variable) -> Result<ArrayValue> {
    let shape = var_shape(var);

    macro_rules! read_as {
        ($t:ty) => {
            ArrayValue::from_shape_vec(shape, var.get_values::<$t, _>(..)?)?
        };
    }

    let value = match var.vartype() {
        NcVariableType::Int(IntType::I8) => read_as!(i8),
        NcVariableType::Int(IntType::U8) => read_as!(u8),
        NcVariableType::Int(IntType::I16) => read_as!(i16),
        NcVariableType::Int(IntType::U16) => read_as!(u16),
        NcVariableType::Int(IntType::I32) => read_as!(i32),
        NcVariableType::Int(IntType::U32) => read_as!(u32),
        NcVariableType::Int(IntType::I64) => read_as!(i64),
        NcVariableType::Int(IntType::U64) => read_as!(u64),
        NcVariableType::Float(FloatType::F32) => read_as!(f32),
        NcVariableType::Float(FloatType::F64) => read_as!(f64),
        NcVariableType::Char => {
            ArrayValue::Char(ArrayD::from_shape_vec(shape, var.get_raw_values(..)?)?)
        }
        NcVariableType::String => read_strings(var, shape)?,
        other => {
            return Err(NcUtilsError::UnsupportedType {
                var: var.name(),
                vartype: format!("{:?}", other).to_lowercase(),
            })
        }
    };
    Ok(value)
}

fn var_shape(var: &Variable) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

fn read_strings(var: &Variable, shape: Vec<usize>) -> Result<ArrayValue> {
    let mut values = Vec::with_capacity(shape.iter().product());
    for index in ndarray::indices(shape.as_slice()) {
        values.push(var.get_string(index.slice())?);
    }
    ArrayValue::from_shape_vec(shape, values)
}

/// Every number held by a numeric attribute; empty if absent or textual.
fn numeric_attribute(var: &Variable, name: &str) -> Result<Vec<f64>> {
    let Some(value) = var.attribute_value(name) else {
        return Ok(Vec::new());
    };

    fn widen<T: Into<f64>>(values: Vec<T>) -> Vec<f64> {
        values.into_iter().map(Into::into).collect()
    }

    let numbers = match value? {
        AttributeValue::Uchar(v) => vec![f64::from(v)],
        AttributeValue::Schar(v) => vec![f64::from(v)],
        AttributeValue::Ushort(v) => vec![f64::from(v)],
        AttributeValue::Short(v) => vec![f64::from(v)],
        AttributeValue::Uint(v) => vec![f64::from(v)],
        AttributeValue::Int(v) => vec![f64::from(v)],
        AttributeValue::Ulonglong(v) => vec![v as f64],
        AttributeValue::Longlong(v) => vec![v as f64],
        AttributeValue::Float(v) => vec![f64::from(v)],
        AttributeValue::Double(v) => vec![v],
        AttributeValue::Uchars(v) => widen(v),
        AttributeValue::Schars(v) => widen(v),
        AttributeValue::Ushorts(v) => widen(v),
        AttributeValue::Shorts(v) => widen(v),
        AttributeValue::Uints(v) => widen(v),
        AttributeValue::Ints(v) => widen(v),
        AttributeValue::Ulonglongs(v) => v.into_iter().map(|x| x as f64).collect(),
        AttributeValue::Longlongs(v) => v.into_iter().map(|x| x as f64).collect(),
        AttributeValue::Floats(v) => widen(v),
        AttributeValue::Doubles(v) => v,
        _ => Vec::new(),
    };
    Ok(numbers)
}

/// Unpacks `scale_factor`/`add_offset` into `f64` and turns `_FillValue`
/// and `missing_value` entries into NaN.
///
/// Integer variables without packing attributes keep their stored values,
/// fill values included, since integers have no NaN.
fn mask_and_scale(var: &Variable, value: ArrayValue) -> Result<ArrayValue> {
    let scale = numeric_attribute(var, "scale_factor")?.first().copied();
    let offset = numeric_attribute(var, "add_offset")?.first().copied();
    let mut fills = numeric_attribute(var, "_FillValue")?;
    fills.extend(numeric_attribute(var, "missing_value")?);

    if scale.is_none() && offset.is_none() && fills.is_empty() {
        return Ok(value);
    }

    if scale.is_some() || offset.is_some() {
        let Some(stored) = value.to_f64() else {
            return Ok(value);
        };
        let (scale, offset) = (scale.unwrap_or(1.0), offset.unwrap_or(0.0));
        debug!("Unpacking {} with scale {} and offset {}", var.name(), scale, offset);
        let unpacked = stored.mapv(|x| {
            if fills.contains(&x) {
                f64::NAN
            } else {
                x * scale + offset
            }
        });
        return Ok(ArrayValue::F64(unpacked));
    }

    let masked = match value {
        ArrayValue::F32(a) => ArrayValue::F32(a.mapv(|x| {
            if fills.contains(&f64::from(x)) {
                f32::NAN
            } else {
                x
            }
        })),
        ArrayValue::F64(a) => ArrayValue::F64(a.mapv(|x| if fills.contains(&x) { f64::NAN } else { x })),
        other => other,
    };
    Ok(masked)
}

/// Checks that every output array has a definition whose declared
/// dimensions exist and match the array's shape.
pub fn validate_out_vars(var_defs: &VarDefs, dim_defs: &DimDefs, out_vars: &OutVars) -> Result<()> {
    for (name, def) in var_defs {
        if def.var_type == VarType::Char {
            return Err(char_not_writable(name));
        }
        if let Some(dim) = def.dims.names().iter().find(|d| !dim_defs.contains_key(*d)) {
            return Err(NcUtilsError::DimensionNotDefined {
                var: name.clone(),
                dim: dim.clone(),
            });
        }
    }

    for (name, value) in out_vars {
        let def = var_defs
            .get(name)
            .ok_or_else(|| NcUtilsError::VariableNotDefined { var: name.clone() })?;
        if value.var_type().is_text() != def.var_type.is_text() {
            return Err(NcUtilsError::IncompatibleType {
                var: name.clone(),
                declared: def.var_type.to_string(),
                got: value.var_type().to_string(),
            });
        }
        let expected: Vec<usize> = def.dims.names().iter().map(|d| dim_defs[d]).collect();
        if value.shape() != expected.as_slice() {
            return Err(NcUtilsError::ShapeMismatch {
                var: name.clone(),
                expected,
                got: value.shape().to_vec(),
            });
        }
    }
    Ok(())
}

/// Writes dimensions, header, variable definitions and data into a group.
///
/// Works on the root of a file or any sub-group. The arrays are validated
/// against the definitions before the group is modified.
pub fn write_grp<H: SetHeader + ?Sized>(
    grp: &mut dyn NcGroup,
    dim_defs: &DimDefs,
    set_header: &H,
    var_defs: &VarDefs,
    out_vars: &OutVars,
) -> Result<()> {
    validate_out_vars(var_defs, dim_defs, out_vars)?;
    define_group(grp, dim_defs, set_header, var_defs, out_vars)?;
    fill_group(grp, var_defs, out_vars)
}

fn define_group<H: SetHeader + ?Sized>(
    grp: &mut dyn NcGroup,
    dim_defs: &DimDefs,
    set_header: &H,
    var_defs: &VarDefs,
    out_vars: &OutVars,
) -> Result<()> {
    for (name, &len) in dim_defs {
        grp.create_dimension(name, len)?;
    }

    set_header.set_header(grp, out_vars)?;

    for (name, def) in var_defs {
        let dims: Vec<&str> = def.dims.names().iter().map(String::as_str).collect();
        let mut var = grp.create_variable(name, &dims, def.var_type)?;
        var.put_attribute("units", def.units.as_str())?;
        var.put_attribute("long_name", def.long_name.as_str())?;
        for (attr_name, value) in &def.attributes {
            var.put_attribute(attr_name, value.clone())?;
        }
        debug!("Defined variable {} ({}) over [{}]", name, def.var_type, dims.join(", "));
    }
    Ok(())
}

fn fill_group(grp: &mut dyn NcGroup, var_defs: &VarDefs, out_vars: &OutVars) -> Result<()> {
    for (name, value) in out_vars {
        let def = var_defs
            .get(name)
            .ok_or_else(|| NcUtilsError::VariableNotDefined { var: name.clone() })?;
        let mut var = grp
            .variable_to_write(name)
            .ok_or_else(|| NcUtilsError::VariableNotFound { var: name.clone() })?;

        let converted;
        let value = if value.var_type() == def.var_type {
            value
        } else {
            converted = value
                .cast(def.var_type)
                .ok_or_else(|| NcUtilsError::IncompatibleType {
                    var: name.clone(),
                    declared: def.var_type.to_string(),
                    got: value.var_type().to_string(),
                })?;
            &converted
        };
        put_array(&mut var, value)?;
    }
    Ok(())
}

/// Assigns a whole array of any rank to a variable.
pub(crate) fn put_array(var: &mut VariableMut, value: &ArrayValue) -> Result<()> {
    with_numeric!(value, a => {
        var.put(a.view(), ..)?;
        Ok(())
    }, _ => put_text(var, value))
}

fn put_text(var: &mut VariableMut, value: &ArrayValue) -> Result<()> {
    match value {
        ArrayValue::Str(strings) => {
            for (index, s) in strings.indexed_iter() {
                var.put_string(s, index.slice())?;
            }
            Ok(())
        }
        _ => Err(char_not_writable(&var.name())),
    }
}

/// Removes an existing destination.
///
/// Failures are logged and otherwise ignored; creating the new file reports
/// anything that really prevents the write.
fn remove_existing(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed existing {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove existing {}: {}", path.display(), e),
    }
}

/// Creates a new NetCDF file from declarative definitions.
///
/// Global attributes are set first, then [`write_grp`] runs on the root (or
/// on the sub-group named in the options). Returns the normalized path of
/// the written file.
///
/// # Errors
///
/// Fails before touching the filesystem if the arrays do not match their
/// definitions, if the options are inconsistent, or with
/// [`NcUtilsError::AlreadyExists`] if overwriting is disabled and the
/// destination exists.
pub fn write_nc<P: AsRef<Path>, H: SetHeader + ?Sized>(
    path: P,
    var_defs: &VarDefs,
    out_vars: &OutVars,
    set_header: &H,
    dim_defs: &DimDefs,
    options: &WriteOptions,
) -> Result<PathBuf> {
    options.validate(var_defs)?;
    validate_out_vars(var_defs, dim_defs, out_vars)?;

    let path = normalize_path(path)?;
    if options.overwrite {
        remove_existing(&path);
    } else if path.exists() {
        return Err(NcUtilsError::AlreadyExists { path });
    }
    ensure_parent_dir(&path)?;

    info!("writing with {}", options.format);
    let mut file = netcdf::create_with(&path, options.format.create_options())?;

    if let Some(attributes) = &options.attributes {
        for (name, value) in attributes {
            file.add_attribute(name, value.clone())?;
        }
    }

    match (&options.group, options.format) {
        (Some(group), _) => {
            let mut grp = file.add_group(group)?;
            write_grp(&mut grp, dim_defs, set_header, var_defs, out_vars)?;
        }
        (None, FileFormat::Netcdf4) => {
            write_grp(&mut file, dim_defs, set_header, var_defs, out_vars)?;
        }
        (None, FileFormat::Classic) => {
            // Classic files only accept data outside define mode; reopening ends it.
            define_group(&mut file, dim_defs, set_header, var_defs, out_vars)?;
            drop(file);
            file = netcdf::append(&path)?;
            fill_group(&mut file, var_defs, out_vars)?;
        }
    }
    drop(file);

    info!("File written to {}", path.display());
    Ok(path)
}

/// Writes the 10x10 `testarr` demo file.
pub fn example_write_nc<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let set_header = |grp: &mut dyn NcGroup, _out_vars: &OutVars| -> Result<()> {
        grp.set_attribute("description", "test nc for ndarray writing".into())
    };

    let testarr = Array2::<f64>::ones((10, 10));
    let mut dim_defs = DimDefs::new();
    dim_defs.insert("npts".to_string(), testarr.nrows());

    let mut out_vars = OutVars::new();
    out_vars.insert("testarr".to_string(), testarr.into());

    write_nc(
        path,
        &example_var_defs(),
        &out_vars,
        &set_header,
        &dim_defs,
        &WriteOptions::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::VarDef;
    use ndarray::{Array1, Array3};

    fn defs_and_dims() -> (VarDefs, DimDefs) {
        let mut var_defs = VarDefs::new();
        var_defs.insert(
            "grid".to_string(),
            VarDef::new(["x", "y"], VarType::Float, "K", "grid values"),
        );
        let mut dim_defs = DimDefs::new();
        dim_defs.insert("x".to_string(), 3);
        dim_defs.insert("y".to_string(), 4);
        (var_defs, dim_defs)
    }

    #[test]
    fn test_validate_accepts_matching_shape() {
        let (var_defs, dim_defs) = defs_and_dims();
        let mut out_vars = OutVars::new();
        out_vars.insert("grid".to_string(), ndarray::Array2::<f32>::zeros((3, 4)).into());
        assert!(validate_out_vars(&var_defs, &dim_defs, &out_vars).is_ok());
    }

    #[test]
    fn test_validate_shape_mismatch() {
        let (var_defs, dim_defs) = defs_and_dims();
        let mut out_vars = OutVars::new();
        out_vars.insert("grid".to_string(), Array3::<f32>::zeros((3, 4, 1)).into());
        match validate_out_vars(&var_defs, &dim_defs, &out_vars) {
            Err(NcUtilsError::ShapeMismatch { var, expected, got }) => {
                assert_eq!(var, "grid");
                assert_eq!(expected, vec![3, 4]);
                assert_eq!(got, vec![3, 4, 1]);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_undefined_variable() {
        let (var_defs, dim_defs) = defs_and_dims();
        let mut out_vars = OutVars::new();
        out_vars.insert("extra".to_string(), Array1::<f64>::zeros(3).into());
        match validate_out_vars(&var_defs, &dim_defs, &out_vars) {
            Err(NcUtilsError::VariableNotDefined { var }) => assert_eq!(var, "extra"),
            other => panic!("Expected VariableNotDefined, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_undefined_dimension() {
        let (var_defs, mut dim_defs) = defs_and_dims();
        dim_defs.remove("y");
        match validate_out_vars(&var_defs, &dim_defs, &OutVars::new()) {
            Err(NcUtilsError::DimensionNotDefined { var, dim }) => {
                assert_eq!(var, "grid");
                assert_eq!(dim, "y");
            }
            other => panic!("Expected DimensionNotDefined, got {:?}", other),
        }
    }

    #[test]
    fn test_write_options_defaults() {
        let options = WriteOptions::default();
        assert!(options.overwrite());
        assert_eq!(options.format(), FileFormat::Netcdf4);
    }

    #[test]
    fn test_classic_rejects_groups_and_wide_types() {
        let (mut var_defs, _) = defs_and_dims();
        let classic = WriteOptions::default().with_format(FileFormat::Classic);
        assert!(classic.validate(&var_defs).is_ok());

        let grouped = classic.clone().with_group("sub");
        assert!(matches!(
            grouped.validate(&var_defs),
            Err(NcUtilsError::InvalidOptions(_))
        ));

        var_defs.insert(
            "count".to_string(),
            VarDef::new("x", VarType::UInt64, "1", "count"),
        );
        assert!(matches!(
            classic.validate(&var_defs),
            Err(NcUtilsError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_text_declared_numeric_is_rejected() {
        let (var_defs, dim_defs) = defs_and_dims();
        let mut out_vars = OutVars::new();
        let labels = ndarray::Array2::from_elem((3, 4), "x".to_string());
        out_vars.insert("grid".to_string(), labels.into());
        match validate_out_vars(&var_defs, &dim_defs, &out_vars) {
            Err(NcUtilsError::IncompatibleType { var, declared, got }) => {
                assert_eq!(var, "grid");
                assert_eq!(declared, "f4");
                assert_eq!(got, "str");
            }
            other => panic!("Expected IncompatibleType, got {:?}", other),
        }
    }

    #[test]
    fn test_char_definitions_are_not_writable() {
        let (mut var_defs, dim_defs) = defs_and_dims();
        var_defs.insert("flag".to_string(), VarDef::new("x", VarType::Char, "", "flag"));
        assert!(matches!(
            validate_out_vars(&var_defs, &dim_defs, &OutVars::new()),
            Err(NcUtilsError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_remove_existing_ignores_failures() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

        // Absent file
        remove_existing(&temp_dir.path().join("absent.nc"));

        // A directory cannot be removed as a file; the failure is swallowed
        let blocker = temp_dir.path().join("blocker.nc");
        fs::create_dir(&blocker).expect("Failed to create dir");
        fs::write(blocker.join("inner"), b"x").expect("Failed to write file");
        remove_existing(&blocker);
        assert!(blocker.is_dir());

        let file = temp_dir.path().join("old.nc");
        fs::write(&file, b"old").expect("Failed to write file");
        remove_existing(&file);
        assert!(!file.exists());
    }

    #[test]
    fn test_read_options_default_unpacks() {
        assert!(ReadOptions::default().mask_and_scale());
        assert!(!ReadOptions::default().with_mask_and_scale(false).mask_and_scale());
    }

    #[test]
    fn test_ncread_missing_file_is_not_found() {
        match ncread_vars("/nonexistent/dir/missing.nc") {
            Err(NcUtilsError::NotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/dir/missing.nc"))
            }
            other => panic!("Expected NotFound, got {:?}", other.map(|v| v.len())),
        }
    }
}
