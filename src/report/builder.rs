//! Report construction from a snapshot source.

use std::cmp::Ordering;

use serde_json::Value;

use super::{Report, ScriptEntry};
use crate::snapshot::{Configuration, SnapshotError, SnapshotSource, StatusSnapshot};

/// Builds a fresh [`Report`] per call. Holds options only, never request
/// data, so one builder can serve any number of requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportBuilder {
    include_scripts: bool,
    include_config: bool,
}

impl ReportBuilder {
    pub fn new(include_scripts: bool) -> Self {
        Self {
            include_scripts,
            include_config: false,
        }
    }

    pub fn with_config(mut self, include_config: bool) -> Self {
        self.include_config = include_config;
        self
    }

    pub fn include_scripts(&self) -> bool {
        self.include_scripts
    }

    pub fn include_config(&self) -> bool {
        self.include_config
    }

    /// Pull a snapshot from `source` and normalize it.
    ///
    /// Returns an empty report without querying the source further when the
    /// cache-status feature is unavailable.
    pub fn build<S>(&self, source: &S) -> Result<Report, SnapshotError>
    where
        S: SnapshotSource + ?Sized,
    {
        if !source.is_available() {
            tracing::debug!("cache status unavailable, returning empty report");
            return Ok(Report::default());
        }

        let snapshot = source.status(self.include_scripts)?;
        let mut report = normalize(snapshot, self.include_scripts);
        if self.include_config {
            report.config = Some(source.configuration()?);
        }
        Ok(report)
    }

    /// Fetch the runtime configuration on its own. Empty when the feature is
    /// unavailable.
    pub fn build_configuration<S>(source: &S) -> Result<Configuration, SnapshotError>
    where
        S: SnapshotSource + ?Sized,
    {
        if !source.is_available() {
            return Ok(Configuration::new());
        }
        source.configuration()
    }
}

/// Turn a raw snapshot into a report.
///
/// With `include_scripts`, the `scripts` table is removed from the status,
/// its keys are dropped and its entries sorted by memory consumption. An
/// absent or malformed table yields an empty sequence.
pub fn normalize(mut snapshot: StatusSnapshot, include_scripts: bool) -> Report {
    let scripts = if include_scripts {
        let table = snapshot.take_scripts();
        Some(sort_scripts(script_entries(table)))
    } else {
        None
    };

    Report {
        config: None,
        status: Some(snapshot),
        scripts,
    }
}

fn script_entries(table: Option<Value>) -> Vec<ScriptEntry> {
    match table {
        Some(Value::Object(map)) => map.into_iter().map(|(_, v)| ScriptEntry::new(v)).collect(),
        Some(Value::Array(items)) => items.into_iter().map(ScriptEntry::new).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::debug!(
                kind = crate::snapshot::json_kind(&other),
                "ignoring malformed scripts table"
            );
            Vec::new()
        }
    }
}

/// Sort entries by memory consumption, largest first.
///
/// The sort is unstable: entries with equal consumption may come out in any
/// order.
pub fn sort_scripts(mut entries: Vec<ScriptEntry>) -> Vec<ScriptEntry> {
    entries.sort_unstable_by(|a, b| {
        b.memory_consumption()
            .partial_cmp(&a.memory_consumption())
            .unwrap_or(Ordering::Equal)
    });
    entries
}
