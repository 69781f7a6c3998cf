//! Filename handling shared by the readers and writers
//!
//! - `expand_user` replaces a leading `~` with the home directory
//!   (`expand_user_in` takes that directory as an argument)
//! - `normalize_path` expands and makes the path absolute
//! - `ensure_parent_dir` creates the directories a destination needs

use crate::errors::Result;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Expands a leading `~` or `~/` to the current user's home directory.
///
/// Paths such as `~other/x` are returned unchanged, as is everything when
/// `HOME` is not set.
pub fn expand_user<P: AsRef<Path>>(path: P) -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from);
    expand_user_in(path, home.as_deref())
}

/// Like [`expand_user`] with the home directory given explicitly.
pub fn expand_user_in<P: AsRef<Path>>(path: P, home: Option<&Path>) -> PathBuf {
    let path = path.as_ref();
    let mut components = path.components();
    match (components.next(), home) {
        (Some(first), Some(home)) if first.as_os_str() == "~" => home.join(components.as_path()),
        _ => path.to_path_buf(),
    }
}

/// Expands `~` and resolves relative paths against the working directory.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let expanded = expand_user(path);
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(env::current_dir()?.join(expanded))
    }
}

/// Creates every missing parent directory of `path`.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
