//! Fuzz target for snapshot parsing and report normalization.
//!
//! Arbitrary bytes parsed as a status dump must never panic while being
//! normalized, encoded or forwarded.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opcache_status::report::normalize;
use opcache_status::stats::forward;
use opcache_status::{ExtraStatsFlags, GaugeStore, StatusSnapshot};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(snapshot) = StatusSnapshot::from_value(value) else {
        return;
    };

    let report = normalize(snapshot, true);
    let _ = report.to_json();

    let flags = ExtraStatsFlags::parse_list(
        "opcache_enabled,cache_full,restart_pending,restart_in_progress",
    )
    .0;
    let _ = forward(&report, &flags, &GaugeStore::new());
});
