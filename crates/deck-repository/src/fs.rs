//! JSON files replaced atomically.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RepositoryError, Result};

pub(crate) const TEMP_EXTENSION: &str = "json.tmp";

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RepositoryError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(RepositoryError::io(path, err)),
    };
    serde_json::from_slice(&bytes).map_err(|err| RepositoryError::corrupt(path, err))
}

/// Writes `value` to a sibling temp file, syncs it, then renames it over
/// `path`.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| RepositoryError::io(parent, err))?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|err| {
        RepositoryError::io(path, io::Error::new(io::ErrorKind::InvalidData, err))
    })?;
    let temp = path.with_extension(TEMP_EXTENSION);
    let mut file = File::create(&temp).map_err(|err| RepositoryError::io(&temp, err))?;
    file.write_all(&json)
        .map_err(|err| RepositoryError::io(&temp, err))?;
    // the rename must never expose a file whose contents are not on disk yet
    file.sync_all().map_err(|err| RepositoryError::io(&temp, err))?;
    drop(file);
    fs::rename(&temp, path).map_err(|err| RepositoryError::io(path, err))?;
    Ok(())
}

/// Takes a store's I/O lock. The lock guards no data, so a panic in another
/// holder leaves nothing to repair.
pub(crate) fn lock_io(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(RepositoryError::io(path, err)),
    }
}
