//! Normalized cache health reports.
//!
//! A [`Report`] is the stable, serializable shape produced from a raw
//! snapshot. Only populated fields are encoded; an empty report encodes to
//! `{}`.

mod builder;

pub use builder::{normalize, sort_scripts, ReportBuilder};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::snapshot::{Configuration, StatusSnapshot};

/// Field holding the per-entry memory footprint.
pub const MEMORY_CONSUMPTION_KEY: &str = "memory_consumption";

/// One cached compilation unit. Its original table key is not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptEntry(Value);

impl ScriptEntry {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Memory footprint in bytes. Missing or non-numeric values count as 0.
    pub fn memory_consumption(&self) -> f64 {
        self.0
            .get(MEMORY_CONSUMPTION_KEY)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Cache health report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Configuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusSnapshot>,
    /// Entries ordered by memory consumption, largest first. The order of
    /// entries with equal consumption is unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Vec<ScriptEntry>>,
}

impl Report {
    /// True when no field is populated (the feature-unavailable shape).
    pub fn is_empty(&self) -> bool {
        self.config.is_none() && self.status.is_none() && self.scripts.is_none()
    }

    /// Names of the populated top-level fields, in encoding order.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(3);
        if self.config.is_some() {
            fields.push("config");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.scripts.is_some() {
            fields.push("scripts");
        }
        fields
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_report_encodes_to_empty_object() {
        let report = Report::default();
        assert!(report.is_empty());
        assert_eq!(report.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let report = Report {
            status: Some(StatusSnapshot::default()),
            ..Default::default()
        };
        assert_eq!(report.to_json().unwrap(), r#"{"status":{}}"#);
        assert_eq!(report.populated_fields(), ["status"]);
    }

    #[test]
    fn test_memory_consumption_defaults_to_zero() {
        assert_eq!(ScriptEntry::new(json!({})).memory_consumption(), 0.0);
        assert_eq!(ScriptEntry::new(json!("x")).memory_consumption(), 0.0);
        assert_eq!(
            ScriptEntry::new(json!({ "memory_consumption": 2048 })).memory_consumption(),
            2048.0
        );
    }
}
