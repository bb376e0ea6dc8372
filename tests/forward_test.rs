//! Gauge forwarding tests.

use opcache_status::report::normalize;
use opcache_status::stats::{forward, GaugeSample};
use opcache_status::{
    ExtraStat, ExtraStatsFlags, GaugeStore, Report, SinkError, StatsSink, StatusSnapshot,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

fn report(value: Value) -> Report {
    normalize(StatusSnapshot::from_value(value).unwrap(), false)
}

fn sample_report() -> Report {
    report(json!({
        "opcache_enabled": true,
        "cache_full": true,
        "restart_pending": false,
        "restart_in_progress": false,
        "bogus_flag": true,
        "memory_usage": { "used_memory": 100, "free_memory": 50 },
        "opcache_statistics": { "hits": 10 }
    }))
}

fn names(samples: &[GaugeSample]) -> Vec<&str> {
    samples.iter().map(|s| s.name.as_str()).collect()
}

/// Fails every call after `ok` successful ones.
struct FailingSink {
    ok: usize,
    calls: Mutex<usize>,
}

impl StatsSink for FailingSink {
    fn gauge(&self, _name: &str, _value: f64) -> Result<(), SinkError> {
        let mut calls = self.calls.lock();
        *calls += 1;
        if *calls > self.ok {
            return Err(SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "statsd down",
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Fixed metric groups
// =============================================================================

#[test]
fn groups_emit_exactly_three_gauges() {
    let sink = GaugeStore::new();
    let sent = forward(&sample_report(), &ExtraStatsFlags::default(), &sink).unwrap();
    assert_eq!(sent, 3);

    let samples = sink.samples();
    assert_eq!(names(&samples), ["used_memory", "free_memory", "hits"]);
    assert_eq!(sink.get("used_memory"), Some(100.0));
    assert_eq!(sink.get("free_memory"), Some(50.0));
    assert_eq!(sink.get("hits"), Some(10.0));
}

#[test]
fn missing_groups_are_skipped() {
    let sink = GaugeStore::new();
    let bare = report(json!({ "opcache_enabled": true }));
    let sent = forward(&bare, &ExtraStatsFlags::default(), &sink).unwrap();
    assert_eq!(sent, 0);
}

// =============================================================================
// Extra stats
// =============================================================================

#[test]
fn enabled_flags_precede_groups() {
    let sink = GaugeStore::new();
    let mut flags = ExtraStatsFlags::default();
    flags.set(ExtraStat::OpcacheEnabled, true);
    flags.set(ExtraStat::RestartPending, true);

    assert_eq!(forward(&sample_report(), &flags, &sink).unwrap(), 5);
    let samples = sink.samples();
    assert_eq!(
        names(&samples),
        ["opcache_enabled", "restart_pending", "used_memory", "free_memory", "hits"]
    );
    assert_eq!(sink.get("opcache_enabled"), Some(1.0));
    assert_eq!(sink.get("restart_pending"), Some(0.0));
}

#[test]
fn update_with_unsupported_name_only_touches_supported() {
    let sink = GaugeStore::new();
    let mut flags = ExtraStatsFlags::default();
    assert!(flags.update([("cache_full", true), ("bogus_flag", true)]));

    forward(&sample_report(), &flags, &sink).unwrap();
    assert_eq!(sink.get("cache_full"), Some(1.0));
    assert_eq!(sink.get("bogus_flag"), None);
    assert_eq!(sink.samples().len(), 4);
}

#[test]
fn missing_status_field_sends_zero() {
    let sink = GaugeStore::new();
    let flags = ExtraStatsFlags::parse_list("restart_in_progress").0;
    forward(&report(json!({})), &flags, &sink).unwrap();
    assert_eq!(sink.get("restart_in_progress"), Some(0.0));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn first_sink_failure_stops_forwarding() {
    let sink = FailingSink {
        ok: 1,
        calls: Mutex::new(0),
    };
    let err = forward(&sample_report(), &ExtraStatsFlags::default(), &sink).unwrap_err();
    assert!(err.to_string().contains("statsd down"));
    assert_eq!(*sink.calls.lock(), 2);
}

#[test]
fn empty_report_is_not_forwarded() {
    let sink = FailingSink {
        ok: 0,
        calls: Mutex::new(0),
    };
    let flags = ExtraStatsFlags::parse_list("opcache_enabled,cache_full").0;
    assert_eq!(forward(&Report::default(), &flags, &sink).unwrap(), 0);
    assert_eq!(*sink.calls.lock(), 0);
}
