//! Local durability layer.
//!
//! The cache holds exactly one record: the most recent one the agent tried to
//! sync. Every save overwrites the file, and a failed save never stops the
//! run from attempting delivery.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::Record;

/// Failure to read or write the cache file.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CacheError {
  pub message: String,
}

impl CacheError {
  fn io(action: &str, path: &Path, err: std::io::Error) -> Self {
    Self {
      message: format!("Failed to {} cache file {}: {}", action, path.display(), err),
    }
  }

  fn json(action: &str, path: &Path, err: serde_json::Error) -> Self {
    Self {
      message: format!("Failed to {} cache file {}: {}", action, path.display(), err),
    }
  }
}

/// Single-record JSON cache at a fixed path.
#[derive(Debug, Clone)]
pub struct LocalCache {
  path: PathBuf,
}

impl LocalCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Overwrite the cache file with `record`.
  ///
  /// The parent directory must already exist.
  pub fn save(&self, record: &Record) -> Result<(), CacheError> {
    let data = record
      .to_json()
      .map_err(|e| CacheError::json("encode", &self.path, e))?;

    std::fs::write(&self.path, data).map_err(|e| CacheError::io("write", &self.path, e))
  }

  /// Read back the most recently saved record.
  pub fn load(&self) -> Result<Record, CacheError> {
    let data = std::fs::read(&self.path).map_err(|e| CacheError::io("read", &self.path, e))?;

    Record::from_json(&data).map_err(|e| CacheError::json("parse", &self.path, e))
  }
}
