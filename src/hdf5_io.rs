//! Flatten-read of HDF5 files
//!
//! Mirrors [`ncread_vars`](crate::netcdf_io::ncread_vars) for plain HDF5
//! files: every top-level dataset is read into an [`ArrayValue`].
//! Only compiled with the `hdf5` feature.
//!
//! NASA CDF (`.cdf`) is a different container format and is not read here;
//! such files fail to open with [`NcUtilsError::Hdf5Error`].

use crate::array::ArrayValue;
use crate::errors::{NcUtilsError, Result};
use crate::utils::normalize_path;
use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use hdf5::{Dataset, File};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Reads every top-level dataset of an HDF5 file into memory.
///
/// Sub-groups are skipped.
///
/// # Errors
///
/// Returns [`NcUtilsError::NotFound`] if the path is not a file and
/// [`NcUtilsError::UnsupportedType`] for non-numeric datasets.
pub fn load_hdf5<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, ArrayValue>> {
    let path = normalize_path(path)?;
    if !path.is_file() {
        return Err(NcUtilsError::NotFound { path });
    }

    let file = File::open(&path)?;
    let mut data = BTreeMap::new();
    for name in file.member_names()? {
        match file.dataset(&name) {
            Ok(dataset) => {
                data.insert(name.clone(), read_dataset(&name, &dataset)?);
            }
            Err(_) if file.group(&name).is_ok() => {
                debug!("Skipping group {} in {}", name, path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }
    drop(file);

    info!("Loaded {} datasets from {}", data.len(), path.display());
    Ok(data)
}

fn read_dataset(name: &str, dataset: &Dataset) -> Result<ArrayValue> {
    let shape = dataset.shape();

    macro_rules! read_as {
        ($t:ty) => {
            ArrayValue::from_shape_vec(shape, dataset.read_raw::<$t>()?)?
        };
    }

    let value = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(IntSize::U1) => read_as!(i8),
        TypeDescriptor::Integer(IntSize::U2) => read_as!(i16),
        TypeDescriptor::Integer(IntSize::U4) => read_as!(i32),
        TypeDescriptor::Integer(IntSize::U8) => read_as!(i64),
        TypeDescriptor::Unsigned(IntSize::U1) => read_as!(u8),
        TypeDescriptor::Unsigned(IntSize::U2) => read_as!(u16),
        TypeDescriptor::Unsigned(IntSize::U4) => read_as!(u32),
        TypeDescriptor::Unsigned(IntSize::U8) => read_as!(u64),
        TypeDescriptor::Float(FloatSize::U4) => read_as!(f32),
        TypeDescriptor::Float(FloatSize::U8) => read_as!(f64),
        other => {
            return Err(NcUtilsError::UnsupportedType {
                var: name.to_string(),
                vartype: format!("{:?}", other).to_lowercase(),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_hdf5_reads_top_level_datasets() -> Result<()> {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("sample.h5");

        {
            let file = File::create(&path)?;
            let grid = file.new_dataset::<f64>().shape([2, 3]).create("grid")?;
            grid.write_raw(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0].as_slice())?;
            let counts = file.new_dataset::<i32>().shape([3]).create("counts")?;
            counts.write_raw(vec![7i32, 8, 9].as_slice())?;
            file.create_group("nested")?;
        }

        let data = load_hdf5(&path)?;
        assert_eq!(data.len(), 2);
        assert_eq!(data["grid"].shape(), &[2, 3]);
        assert_eq!(data["grid"].to_f64().expect("numeric")[[1, 2]], 6.0);
        assert!(matches!(data["counts"], ArrayValue::I32(_)));
        Ok(())
    }

    #[test]
    fn test_load_hdf5_rejects_nasa_cdf() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("swarm.cdf");
        // CDF v3 magic number followed by padding
        let mut bytes = vec![0xCD, 0xF3, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xFF];
        bytes.resize(512, 0);
        std::fs::write(&path, bytes).expect("Failed to write file");

        assert!(matches!(load_hdf5(&path), Err(NcUtilsError::Hdf5Error(_))));
    }

    #[test]
    fn test_load_hdf5_missing_file() {
        let result = load_hdf5("/nonexistent/missing.h5");
        assert!(matches!(result, Err(NcUtilsError::NotFound { .. })));
    }
}
