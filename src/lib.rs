//! Byte-code cache health reporting.
//!
//! Pulls a raw cache-status snapshot, normalizes it into a stable JSON
//! report and, optionally, forwards selected metrics to statsd as gauges.
//!
//! ```
//! use opcache_status::{StatusService, StaticSource};
//!
//! let source = StaticSource::from_json(
//!     r#"{"memory_usage": {"used_memory": 100}, "opcache_statistics": {"hits": 10}}"#,
//! )
//! .unwrap();
//! let service = StatusService::new(source);
//! assert!(service.get_status(false).unwrap().starts_with(r#"{"status":"#));
//! ```

pub mod cli;
pub mod config;
pub mod report;
pub mod service;
pub mod snapshot;
pub mod stats;
pub mod telemetry;

pub use report::{Report, ReportBuilder, ScriptEntry};
pub use service::{StatusError, StatusService};
pub use snapshot::{
    Configuration, JsonFileSource, SnapshotError, SnapshotSource, StaticSource, StatusSnapshot,
};
pub use stats::{
    ExtraStat, ExtraStatsFlags, GaugeStore, MetricsSink, SinkConnectionParams, SinkError,
    StatsSink, UdpStatsSink,
};
