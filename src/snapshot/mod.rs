//! Cache status snapshots and the sources that produce them.
//!
//! A snapshot is a single point-in-time read of the byte-code cache counters.
//! Its shape is irregular and owned by the host runtime, so it is kept as a
//! JSON object and only the handful of keys the reporter cares about get
//! typed accessors.

mod file;
mod memory;

pub use file::JsonFileSource;
pub use memory::StaticSource;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw runtime configuration, passed through to the report unchanged.
pub type Configuration = Map<String, Value>;

/// Key holding the per-entry table inside a raw snapshot.
pub const SCRIPTS_KEY: &str = "scripts";
/// Key holding memory counters inside a raw snapshot.
pub const MEMORY_USAGE_KEY: &str = "memory_usage";
/// Key holding hit/miss statistics inside a raw snapshot.
pub const STATISTICS_KEY: &str = "opcache_statistics";

/// Errors raised while reading a snapshot from its source.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid snapshot shape: {0}")]
    InvalidShape(String),
}

/// The cache-status provider.
///
/// Implementations must be cheap to query for availability; the report
/// builder consults [`SnapshotSource::is_available`] before anything else.
pub trait SnapshotSource: Send + Sync {
    /// Whether the cache-status feature is active.
    fn is_available(&self) -> bool;

    /// Fetch the runtime configuration.
    fn configuration(&self) -> Result<Configuration, SnapshotError>;

    /// Fetch the status snapshot. The `scripts` table is only expected
    /// when `include_scripts` is set.
    fn status(&self, include_scripts: bool) -> Result<StatusSnapshot, SnapshotError>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for std::sync::Arc<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn configuration(&self) -> Result<Configuration, SnapshotError> {
        (**self).configuration()
    }

    fn status(&self, include_scripts: bool) -> Result<StatusSnapshot, SnapshotError> {
        (**self).status(include_scripts)
    }
}

/// A raw status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusSnapshot(Map<String, Value>);

impl StatusSnapshot {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a parsed JSON value. Only objects are accepted.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(SnapshotError::InvalidShape(format!(
                "expected an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Strict boolean lookup: only a JSON `true` counts as set.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(Value::Bool(true)))
    }

    pub fn memory_usage(&self) -> Option<&Map<String, Value>> {
        self.0.get(MEMORY_USAGE_KEY).and_then(Value::as_object)
    }

    pub fn opcache_statistics(&self) -> Option<&Map<String, Value>> {
        self.0.get(STATISTICS_KEY).and_then(Value::as_object)
    }

    pub fn has_scripts(&self) -> bool {
        self.0.contains_key(SCRIPTS_KEY)
    }

    /// Remove the per-entry table, keeping the order of remaining keys.
    pub fn take_scripts(&mut self) -> Option<Value> {
        self.0.shift_remove(SCRIPTS_KEY)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for StatusSnapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
