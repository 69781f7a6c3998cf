//! Persisting arbitrary structures to disk
//!
//! [`pickle`] writes any `serde` serializable value with `bincode` and
//! [`unpickle`] reads it back. Since the encoding is not self-describing, the
//! reader names the type it expects; [`Value`] covers structures whose shape
//! is only known at runtime.

use crate::errors::{NcUtilsError, Result};
use crate::utils::{ensure_parent_dir, normalize_path};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// A dynamically shaped structure of numbers, strings, sequences and mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Looks up `key` if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Serializes `value` to `path`, creating parent directories as needed.
///
/// Returns the normalized (`~`-expanded, absolute) path that was written.
pub fn pickle<T, P>(value: &T, path: P) -> Result<PathBuf>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = normalize_path(path)?;
    ensure_parent_dir(&path)?;

    let mut writer = BufWriter::new(File::create(&path)?);
    bincode::serialize_into(&mut writer, value)?;
    writer.flush()?;

    info!("Wrote to {}", path.display());
    Ok(path)
}

/// Deserializes a value previously written by [`pickle`].
///
/// # Errors
///
/// Returns [`NcUtilsError::NotFound`] if the `~`-expanded path is not a file.
pub fn unpickle<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    info!("trying to unpickle {}", path.as_ref().display());
    let path = normalize_path(path)?;
    if !path.is_file() {
        return Err(NcUtilsError::NotFound { path });
    }

    let reader = BufReader::new(File::open(&path)?);
    let value = bincode::deserialize_from(reader)?;

    info!("Loaded {}", path.display());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        samples: Vec<f64>,
        flags: BTreeMap<String, bool>,
    }

    #[test]
    fn test_typed_round_trip() -> Result<()> {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested/dir/record.pkl");

        let mut flags = BTreeMap::new();
        flags.insert("valid".to_string(), true);
        let record = Record {
            name: "swarm-a".to_string(),
            samples: vec![1.5, -2.25, 1e-9],
            flags,
        };

        let written = pickle(&record, &path)?;
        assert_eq!(written, path);
        let loaded: Record = unpickle(&path)?;
        assert_eq!(loaded, record);
        Ok(())
    }

    #[test]
    fn test_dynamic_value_round_trip() -> Result<()> {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("x.pkl");

        let mut inner = BTreeMap::new();
        inner.insert("units".to_string(), Value::from("m/s"));
        inner.insert("scale".to_string(), Value::from(0.5));
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::from(1));
        map.insert("b".to_string(), Value::from(vec![1, 2, 3]));
        map.insert("meta".to_string(), Value::Map(inner));
        map.insert("none".to_string(), Value::Null);
        let value = Value::Map(map);

        pickle(&value, &path)?;
        let loaded: Value = unpickle(&path)?;
        assert_eq!(loaded, value);
        assert_eq!(loaded.get("a"), Some(&Value::Int(1)));
        Ok(())
    }

    #[test]
    fn test_unpickle_missing_path() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("never_written.pkl");
        match unpickle::<Value, _>(&path) {
            Err(NcUtilsError::NotFound { path: missing }) => assert_eq!(missing, path),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unpickle_wrong_type_fails() -> Result<()> {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("short.pkl");
        pickle(&7u8, &path)?;
        let result: Result<Record> = unpickle(&path);
        assert!(matches!(result, Err(NcUtilsError::SerializationError(_))));
        Ok(())
    }
}
