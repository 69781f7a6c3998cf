//! nc_utils: basic NetCDF and other file manipulation routines
//!
//! Helper routines for loading the variables of self-describing scientific
//! array files into memory, writing computed arrays back out with metadata,
//! and persisting arbitrary structures to disk.
//!
//! ## Key Features
//!
//! - **Flatten-read**: every top-level variable of a NetCDF (or HDF5) file as a typed array,
//!   with packed variables unpacked and fill values masked
//! - **Declarative writes**: dimensions and variables described as data, arrays of any rank
//! - **Header callbacks**: attach dataset-level description without touching the writer
//! - **Table conversion**: datetime-indexed columns to NetCDF with a POSIX time column
//! - **Object persistence**: `serde` values to and from binary files
//!
//! ## Module Organization
//!
//! - [`netcdf_io`]: NetCDF reading and writing
//! - [`metadata`]: variable/dimension definitions and file inspection
//! - [`array`]: typed N-dimensional buffers
//! - [`table`]: time-indexed table conversion
//! - [`pickle`]: generic object persistence
//! - `hdf5_io`: HDF5 flatten-read (feature `hdf5`); NASA CDF files are not supported
//! - [`utils`]: filename normalization
//! - [`errors`]: centralized error handling
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use nc_utils::prelude::*;
//! use ndarray::Array2;
//!
//! let mut var_defs = VarDefs::new();
//! var_defs.insert(
//!     "testarr".to_string(),
//!     VarDef::with_type_code(["npts", "npts"], "float", "none", "demo").unwrap(),
//! );
//! let mut dim_defs = DimDefs::new();
//! dim_defs.insert("npts".to_string(), 10);
//! let mut out_vars = OutVars::new();
//! out_vars.insert("testarr".to_string(), Array2::<f64>::ones((10, 10)).into());
//!
//! let set_header = |grp: &mut dyn NcGroup, _: &OutVars| -> Result<()> {
//!     grp.set_attribute("description", "test nc for ndarray writing".into())
//! };
//! write_nc("out/test.nc", &var_defs, &out_vars, &set_header, &dim_defs, &WriteOptions::default()).unwrap();
//!
//! let vars = ncread_vars("out/test.nc").unwrap();
//! assert_eq!(vars["testarr"].shape(), &[10, 10]);
//! ```

// Core modules
pub mod array;
pub mod errors;
#[cfg(feature = "hdf5")]
pub mod hdf5_io;
pub mod metadata;
pub mod netcdf_io;
pub mod pickle;
pub mod table;
pub mod utils;

// Direct re-exports for the public API
pub use array::*;
pub use errors::*;
#[cfg(feature = "hdf5")]
pub use hdf5_io::*;
pub use metadata::*;
pub use netcdf_io::*;
pub use pickle::{pickle, unpickle};
pub use table::*;
pub use utils::*;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::array::{ArrayValue, VarType};
    pub use crate::errors::{NcUtilsError, Result};
    pub use crate::metadata::{Attributes, DimDefs, VarDef, VarDefs};
    pub use crate::netcdf_io::{
        ncread_vars, ncread_vars_with, write_grp, write_nc, FileFormat, NcGroup, NoHeader, OutVars,
        ReadOptions, SetHeader, WriteOptions,
    };
    pub use crate::pickle::{pickle, unpickle, Value};
    pub use crate::table::{write_netcdf_from_table, TimeTable};
}
