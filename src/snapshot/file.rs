//! Snapshot source backed by JSON dumps on disk.
//!
//! The host runtime periodically writes its cache status (and optionally its
//! configuration) as JSON. A missing status file means the cache-status
//! feature is not active.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{json_kind, Configuration, SnapshotError, SnapshotSource, StatusSnapshot};

/// Reads status and configuration dumps from the filesystem.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    status_path: PathBuf,
    config_path: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(status_path: impl Into<PathBuf>) -> Self {
        Self {
            status_path: status_path.into(),
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

fn read_json(path: &Path) -> Result<Value, SnapshotError> {
    let raw = std::fs::read(path).map_err(|e| SnapshotError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&raw).map_err(|e| SnapshotError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

impl SnapshotSource for JsonFileSource {
    fn is_available(&self) -> bool {
        self.status_path.is_file()
    }

    fn configuration(&self) -> Result<Configuration, SnapshotError> {
        let Some(path) = &self.config_path else {
            return Ok(Configuration::new());
        };
        match read_json(path)? {
            Value::Object(map) => Ok(map),
            other => Err(SnapshotError::InvalidShape(format!(
                "configuration in {} is a {}, expected an object",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn status(&self, include_scripts: bool) -> Result<StatusSnapshot, SnapshotError> {
        let mut status = StatusSnapshot::from_value(read_json(&self.status_path)?)?;
        if !include_scripts {
            status.take_scripts();
        }
        Ok(status)
    }
}
