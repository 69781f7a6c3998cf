//! Centralized error handling for nc_utils
//!
//! Every fallible operation in the crate returns [`NcUtilsError`]. Errors from
//! the NetCDF/HDF5 libraries, the filesystem and the serializer are wrapped
//! unmodified; the remaining variants describe contract violations detected
//! before anything is written to disk.

use std::path::PathBuf;

/// Main error type for nc_utils operations
#[derive(Debug, thiserror::Error)]
pub enum NcUtilsError {
    /// NetCDF library errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// HDF5 library errors
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5Error(#[from] hdf5::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape errors while materializing buffers
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Encoding or decoding of a persisted structure failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::Error),

    /// Source file does not exist
    #[error("No such file or directory: {}", path.display())]
    NotFound { path: PathBuf },

    /// Destination exists and overwriting was disabled
    #[error("{} already exists and overwrite set to false", path.display())]
    AlreadyExists { path: PathBuf },

    /// An output array has no matching variable definition
    #[error("Variable '{var}' has data but no definition")]
    VariableNotDefined { var: String },

    /// A variable referenced by metadata is not present
    #[error("Variable '{var}' not found")]
    VariableNotFound { var: String },

    /// A variable definition names a dimension that was never declared
    #[error("Dimension '{dim}' used by variable '{var}' is not defined")]
    DimensionNotDefined { var: String, dim: String },

    /// Buffer shape disagrees with the declared dimensions
    #[error("Shape mismatch for '{var}': declared {expected:?}, got {got:?}")]
    ShapeMismatch {
        var: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Unknown storage type code in a variable definition
    #[error("Invalid variable type '{0}'")]
    InvalidVarType(String),

    /// Stored element type cannot be materialized as a numeric array
    #[error("Variable '{var}' has unsupported type {vartype}")]
    UnsupportedType { var: String, vartype: String },

    /// Text data declared with a numeric storage type or the reverse
    #[error("Variable '{var}' holds {got} data but is declared as {declared}")]
    IncompatibleType {
        var: String,
        declared: String,
        got: String,
    },

    /// A table column would replace the index or the derived time column
    #[error("Column '{column}' clashes with a variable derived from the table index")]
    ReservedColumn { column: String },

    /// Table conversion requires a datetime index
    #[error("Table index is not datetime-like")]
    NotDatetimeIndex,

    /// Inconsistent write configuration
    #[error("Invalid write options: {0}")]
    InvalidOptions(String),
}

/// Result type alias for nc_utils operations
pub type Result<T> = std::result::Result<T, NcUtilsError>;
