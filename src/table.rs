//! Conversion of time-indexed tables into NetCDF files
//!
//! A [`TimeTable`] is a set of equally long `f64` columns sharing one index.
//! [`write_netcdf_from_table`] turns it into a file with one variable per
//! column, a coordinate variable for the index and a derived integer
//! `POSIXtime` column.

use crate::array::VarType;
use crate::errors::{NcUtilsError, Result};
use crate::metadata::{Attributes, DimDefs, VarDef, VarDefs};
use crate::netcdf_io::{write_nc, NoHeader, OutVars, WriteOptions};
use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array1;
use netcdf::AttributeValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the derived seconds-since-epoch column.
pub const POSIX_TIME: &str = "POSIXtime";

/// Row labels of a [`TimeTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum TableIndex {
    Datetime(Vec<NaiveDateTime>),
    /// Plain 0..n row numbers
    Positional(usize),
}

impl TableIndex {
    pub fn len(&self) -> usize {
        match self {
            TableIndex::Datetime(times) => times.len(),
            TableIndex::Positional(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Equally long named columns sharing one index.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTable {
    pub index: TableIndex,
    pub index_name: String,
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl TimeTable {
    /// Creates an empty table indexed by `times`, with the index named `"time"`.
    pub fn new(times: Vec<NaiveDateTime>) -> Self {
        Self {
            index: TableIndex::Datetime(times),
            index_name: "time".to_string(),
            columns: BTreeMap::new(),
        }
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Whole seconds since 1970-01-01, rounded towards negative infinity.
pub fn posix_seconds(times: &[NaiveDateTime]) -> Vec<i64> {
    let epoch = epoch();
    times
        .iter()
        .map(|t| {
            let delta = *t - epoch;
            let secs = delta.num_seconds();
            // num_seconds truncates towards zero
            if delta < chrono::Duration::seconds(secs) {
                secs - 1
            } else {
                secs
            }
        })
        .collect()
}

/// Writes `table` to `path`, replacing any existing file.
///
/// `metadata` maps column names (including [`POSIX_TIME`] and the index
/// name) to attributes; `units` and `long_name` found there become the
/// variable's own definition fields.
///
/// # Errors
///
/// Returns [`NcUtilsError::NotDatetimeIndex`] for a positional index,
/// [`NcUtilsError::ReservedColumn`] for a column named like the index or
/// [`POSIX_TIME`],
/// [`NcUtilsError::ShapeMismatch`] for a column of the wrong length and
/// [`NcUtilsError::VariableNotFound`] for metadata naming an unknown column.
pub fn write_netcdf_from_table<P: AsRef<Path>>(
    table: &TimeTable,
    metadata: &BTreeMap<String, Attributes>,
    global_atts: &Attributes,
    path: P,
) -> Result<PathBuf> {
    let TableIndex::Datetime(times) = &table.index else {
        return Err(NcUtilsError::NotDatetimeIndex);
    };
    let nrows = times.len();
    let dim = table.index_name.as_str();

    for (name, values) in &table.columns {
        if name == dim || name == POSIX_TIME {
            return Err(NcUtilsError::ReservedColumn {
                column: name.clone(),
            });
        }
        if values.len() != nrows {
            return Err(NcUtilsError::ShapeMismatch {
                var: name.clone(),
                expected: vec![nrows],
                got: vec![values.len()],
            });
        }
    }

    let posix = posix_seconds(times);
    let mut var_defs = VarDefs::new();
    let mut out_vars = OutVars::new();

    var_defs.insert(
        dim.to_string(),
        VarDef::new(dim, VarType::Double, "seconds since 1970-01-01 00:00:00", dim)
            .with_attribute("calendar", "proleptic_gregorian"),
    );
    let index_secs: Vec<f64> = times
        .iter()
        .map(|t| (*t - epoch()).num_milliseconds() as f64 / 1000.0)
        .collect();
    out_vars.insert(dim.to_string(), Array1::from(index_secs).into());

    for (name, values) in &table.columns {
        var_defs.insert(name.clone(), VarDef::new(dim, VarType::Double, "", ""));
        out_vars.insert(name.clone(), Array1::from(values.clone()).into());
    }

    var_defs.insert(
        POSIX_TIME.to_string(),
        VarDef::new(dim, VarType::Int64, "", ""),
    );
    out_vars.insert(POSIX_TIME.to_string(), Array1::from(posix).into());

    for (name, attributes) in metadata {
        let def = var_defs
            .get_mut(name)
            .ok_or_else(|| NcUtilsError::VariableNotFound { var: name.clone() })?;
        for (attr_name, value) in attributes {
            match (attr_name.as_str(), value) {
                ("units", AttributeValue::Str(s)) => def.units = s.clone(),
                ("long_name", AttributeValue::Str(s)) => def.long_name = s.clone(),
                _ => {
                    def.attributes.insert(attr_name.clone(), value.clone());
                }
            }
        }
    }

    let mut dim_defs = DimDefs::new();
    dim_defs.insert(dim.to_string(), nrows);

    let options = WriteOptions::default().with_attributes(global_atts.clone());
    write_nc(path, &var_defs, &out_vars, &NoHeader, &dim_defs, &options)
}

fn attrs(units: &str, long_name: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("units".to_string(), units.into());
    attributes.insert("long_name".to_string(), long_name.into());
    attributes
}

/// Column metadata for the Swarm cross-track drift demo table.
pub fn example_table_metadata() -> BTreeMap<String, Attributes> {
    [
        (POSIX_TIME, attrs("Seconds", "POSIX time (seconds since 1/1/1970)")),
        ("Latitude", attrs("degrees", "Latitude")),
        ("Longitude", attrs("degrees", "Longitude")),
        ("Radius", attrs("Metres", "Radius")),
        ("Vn", attrs("m/s", "North component of vi")),
        ("Ve", attrs("m/s", "East component of vi")),
        ("Vc", attrs("m/s", "Down component of vi")),
        ("Viy", attrs("m/s", "S/C right component of vi")),
        ("Viy_error", attrs("m/s", "error in S/C right component of vi")),
    ]
    .into_iter()
    .map(|(name, attributes)| (name.to_string(), attributes))
    .collect()
}

/// Global attributes for the Swarm cross-track drift demo table.
pub fn example_table_global_atts() -> Attributes {
    [
        ("Conventions", "CF-1.6"),
        ("title", "Swarm cross-track drift data"),
        ("summary", "Data generated"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.into()))
    .collect()
}
