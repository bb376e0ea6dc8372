//! Report building and serialization tests.

use opcache_status::report::{normalize, sort_scripts, ReportBuilder, ScriptEntry};
use opcache_status::{Report, SnapshotError, SnapshotSource, StaticSource, StatusSnapshot};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

fn snapshot(value: Value) -> StatusSnapshot {
    StatusSnapshot::from_value(value).unwrap()
}

fn sample_status() -> Value {
    json!({
        "opcache_enabled": true,
        "cache_full": false,
        "restart_pending": false,
        "restart_in_progress": false,
        "memory_usage": {
            "used_memory": 100,
            "free_memory": 50,
            "wasted_memory": 0,
            "current_wasted_percentage": 0.0
        },
        "opcache_statistics": { "num_cached_scripts": 3, "hits": 10, "misses": 3 },
        "scripts": {
            "/srv/app/index.php": {
                "full_path": "/srv/app/index.php",
                "hits": 4,
                "memory_consumption": 2048
            },
            "/srv/app/lib.php": {
                "full_path": "/srv/app/lib.php",
                "hits": 9,
                "memory_consumption": 8192
            },
            "/srv/app/util.php": {
                "full_path": "/srv/app/util.php",
                "hits": 1,
                "memory_consumption": 512
            }
        }
    })
}

/// Counts calls so tests can observe the availability guard.
struct CountingSource {
    inner: StaticSource,
    status_calls: AtomicUsize,
    config_calls: AtomicUsize,
}

impl CountingSource {
    fn new(inner: StaticSource) -> Self {
        Self {
            inner,
            status_calls: AtomicUsize::new(0),
            config_calls: AtomicUsize::new(0),
        }
    }
}

impl SnapshotSource for CountingSource {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn configuration(&self) -> Result<opcache_status::Configuration, SnapshotError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.configuration()
    }

    fn status(&self, include_scripts: bool) -> Result<StatusSnapshot, SnapshotError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.status(include_scripts)
    }
}

// =============================================================================
// Availability guard
// =============================================================================

#[test]
fn unavailable_source_yields_empty_object_for_any_options() {
    for include_scripts in [false, true] {
        for include_config in [false, true] {
            let source = CountingSource::new(StaticSource::unavailable());
            let report = ReportBuilder::new(include_scripts)
                .with_config(include_config)
                .build(&source)
                .unwrap();
            assert_eq!(report.to_json().unwrap(), "{}");
            assert_eq!(source.status_calls.load(Ordering::SeqCst), 0);
            assert_eq!(source.config_calls.load(Ordering::SeqCst), 0);
        }
    }
}

// =============================================================================
// Scripts normalization
// =============================================================================

#[test]
fn scripts_keep_count_and_drop_keys() {
    let report = normalize(snapshot(sample_status()), true);
    let scripts = report.scripts.as_ref().unwrap();
    assert_eq!(scripts.len(), 3);

    let encoded = serde_json::to_value(scripts).unwrap();
    let array = encoded.as_array().expect("scripts encode as an array");
    for entry in array {
        let obj = entry.as_object().unwrap();
        assert!(obj.contains_key("full_path"));
        assert!(obj.contains_key("hits"));
        assert!(!obj.keys().any(|k| k.starts_with("/srv/")));
    }
}

#[test]
fn scripts_sorted_by_memory_descending() {
    let report = normalize(snapshot(sample_status()), true);
    let sizes: Vec<f64> = report
        .scripts
        .unwrap()
        .iter()
        .map(ScriptEntry::memory_consumption)
        .collect();
    assert_eq!(sizes, [8192.0, 2048.0, 512.0]);
}

#[test]
fn equal_consumption_entries_all_present() {
    let entries = vec![
        ScriptEntry::new(json!({ "full_path": "/a.php", "memory_consumption": 10 })),
        ScriptEntry::new(json!({ "full_path": "/b.php", "memory_consumption": 99 })),
        ScriptEntry::new(json!({ "full_path": "/c.php", "memory_consumption": 10 })),
    ];
    let sorted = sort_scripts(entries);
    assert_eq!(sorted[0].get("full_path"), Some(&json!("/b.php")));

    // Order among equal values is unspecified; only membership is checked.
    let mut tail: Vec<&str> = sorted[1..]
        .iter()
        .map(|e| e.get("full_path").and_then(Value::as_str).unwrap())
        .collect();
    tail.sort_unstable();
    assert_eq!(tail, ["/a.php", "/c.php"]);
}

#[test]
fn empty_scripts_table_yields_empty_array() {
    let report = normalize(snapshot(json!({ "memory_usage": {}, "scripts": {} })), true);
    assert_eq!(report.to_json().unwrap(), r#"{"status":{"memory_usage":{}},"scripts":[]}"#);
}

#[test]
fn absent_scripts_table_yields_empty_array() {
    let report = normalize(snapshot(json!({ "memory_usage": {} })), true);
    assert_eq!(report.scripts, Some(Vec::new()));
}

#[test]
fn status_no_longer_contains_scripts() {
    let report = normalize(snapshot(sample_status()), true);
    let status = report.status.unwrap();
    assert!(!status.has_scripts());
    assert!(status.memory_usage().is_some());
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn status_only_report_has_no_scripts_or_config() {
    let source = StaticSource::new(snapshot(sample_status()));
    let report = ReportBuilder::new(false).build(&source).unwrap();
    let encoded: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let keys: Vec<&str> = encoded.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["status"]);
    assert!(encoded["status"].get("scripts").is_none());
}

#[test]
fn round_trip_preserves_populated_fields() {
    let mut config = opcache_status::Configuration::new();
    config.insert("directives".into(), json!({ "opcache.memory_consumption": 128 }));
    let source = StaticSource::new(snapshot(sample_status())).with_configuration(config);

    for (scripts, with_config) in [(false, false), (true, false), (false, true), (true, true)] {
        let report = ReportBuilder::new(scripts).with_config(with_config).build(&source).unwrap();
        let parsed = Report::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed.populated_fields(), report.populated_fields());
        assert_eq!(parsed, report);
    }
}

#[test]
fn status_key_order_follows_source() {
    let report = normalize(snapshot(sample_status()), true);
    let json = report.to_json().unwrap();
    let enabled = json.find("opcache_enabled").unwrap();
    let memory = json.find("memory_usage").unwrap();
    let stats = json.find("opcache_statistics").unwrap();
    assert!(enabled < memory && memory < stats);
}
