//! In-memory snapshot source.

use serde_json::Value;

use super::{Configuration, SnapshotError, SnapshotSource, StatusSnapshot};

/// Serves a fixed snapshot. Used for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    available: bool,
    configuration: Configuration,
    status: StatusSnapshot,
}

impl StaticSource {
    pub fn new(status: StatusSnapshot) -> Self {
        Self {
            available: true,
            configuration: Configuration::new(),
            status,
        }
    }

    /// A source whose cache-status feature is not loaded.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Build from a JSON status document.
    pub fn from_json(status: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(status).map_err(|e| SnapshotError::Parse {
            path: "<inline>".into(),
            source: e,
        })?;
        Ok(Self::new(StatusSnapshot::from_value(value)?))
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }
}

impl SnapshotSource for StaticSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn configuration(&self) -> Result<Configuration, SnapshotError> {
        Ok(self.configuration.clone())
    }

    fn status(&self, include_scripts: bool) -> Result<StatusSnapshot, SnapshotError> {
        let mut status = self.status.clone();
        if !include_scripts {
            status.take_scripts();
        }
        Ok(status)
    }
}
