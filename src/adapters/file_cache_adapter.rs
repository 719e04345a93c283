//! Filesystem cache store: one file per key under a root directory.
//!
//! Key segments separated by `/` become nested directories. Writes go to a
//! sibling temp file first and are renamed into place, so a crash never
//! leaves a half-written entry under the real name.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::error::TraderError;
use crate::ports::cache_port::CacheStore;

const EXTENSION: &str = "bin";

pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, TraderError> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(TraderError::CacheStore {
                    reason: format!("invalid cache key '{key}'"),
                });
            }
            path.push(segment);
        }
        path.set_extension(EXTENSION);
        Ok(path)
    }
}

fn store_error(action: &str, path: &Path, err: std::io::Error) -> TraderError {
    TraderError::CacheStore {
        reason: format!("failed to {} {}: {}", action, path.display(), err),
    }
}

impl CacheStore for FileCacheStore {
    fn exists(&self, key: &str) -> Result<bool, TraderError> {
        Ok(self.entry_path(key)?.is_file())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, TraderError> {
        let path = self.entry_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_error("read", &path, e)),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), TraderError> {
        let path = self.entry_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| store_error("create", parent, e))?;
        }
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&tmp, value).map_err(|e| store_error("write", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| store_error("rename", &tmp, e))
    }

    fn remove(&self, key: &str) -> Result<(), TraderError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error("remove", &path, e)),
        }
    }
}
