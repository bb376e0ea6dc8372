//! Status service: pulls a snapshot, builds the report, forwards gauges.
//!
//! The service is `Send + Sync`. Report building holds no shared state, the
//! extra-stats flags sit behind a lock, and the sink (if any) is built once
//! at construction and kept for the service's lifetime.

use parking_lot::RwLock;
use thiserror::Error;

use crate::report::{Report, ReportBuilder};
use crate::snapshot::{SnapshotError, SnapshotSource};
use crate::stats::{
    self, ExtraStat, ExtraStatsFlags, SinkConnectionParams, SinkError, StatsSink, UdpStatsSink,
};
use crate::telemetry::{SpanExt, StatusSpan};

/// Errors returned by status retrieval.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Snapshot read failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Report encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Cache status reporter with optional statsd forwarding.
pub struct StatusService {
    source: Box<dyn SnapshotSource>,
    sink: Option<Box<dyn StatsSink>>,
    flags: RwLock<ExtraStatsFlags>,
}

impl StatusService {
    /// Service without a sink. Gauges are never forwarded.
    pub fn new(source: impl SnapshotSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            sink: None,
            flags: RwLock::new(ExtraStatsFlags::default()),
        }
    }

    /// Service forwarding to an already-built sink.
    pub fn with_sink(
        source: impl SnapshotSource + 'static,
        sink: impl StatsSink + 'static,
    ) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            ..Self::new(source)
        }
    }

    /// Service whose sink is produced by `factory`, called exactly once.
    pub fn with_sink_factory<F, K>(source: impl SnapshotSource + 'static, factory: F) -> Self
    where
        F: FnOnce() -> K,
        K: StatsSink + 'static,
    {
        Self::with_sink(source, factory())
    }

    /// Service forwarding to a statsd daemon described by `params`.
    ///
    /// The address is resolved and a socket opened up front, so a bad
    /// host fails here rather than on the first gauge.
    pub fn with_connection(
        source: impl SnapshotSource + 'static,
        params: &SinkConnectionParams,
    ) -> Result<Self, SinkError> {
        let sink = UdpStatsSink::connect(params)?;
        Ok(Self::with_sink(source, sink))
    }

    /// Replace the initial extra-stats flags.
    pub fn with_extra_stats(self, flags: ExtraStatsFlags) -> Self {
        *self.flags.write() = flags;
        self
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Current extra-stats flags.
    pub fn flags(&self) -> ExtraStatsFlags {
        *self.flags.read()
    }

    /// Update extra-stats flags by name. Unsupported names are ignored.
    /// Always returns `true`.
    pub fn update_extra_stats_flags<I, K>(&self, flags: I) -> bool
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        self.flags.write().update(flags)
    }

    pub fn set_extra_stat(&self, stat: ExtraStat, send: bool) {
        self.flags.write().set(stat, send);
    }

    /// Build a report and forward its gauges when a sink is configured.
    ///
    /// Forwarding failures are logged and do not fail the request.
    pub fn report(
        &self,
        include_scripts: bool,
        include_config: bool,
    ) -> Result<Report, StatusError> {
        let span = StatusSpan::generate(include_scripts, include_config);
        let _guard = span.enter();

        let result = ReportBuilder::new(include_scripts)
            .with_config(include_config)
            .build(&*self.source)
            .map_err(StatusError::from);
        span.record_result(&result);

        let report = result?;
        if let Some(sent) = self.forward(&report) {
            span.record("gauges_sent", sent);
        }
        Ok(report)
    }

    /// Serialized report without configuration. `{}` when the cache-status
    /// feature is unavailable.
    pub fn get_status(&self, include_scripts: bool) -> Result<String, StatusError> {
        Ok(self.report(include_scripts, false)?.to_json()?)
    }

    /// Serialized report with the runtime configuration included.
    pub fn get_status_with_config(&self, include_scripts: bool) -> Result<String, StatusError> {
        Ok(self.report(include_scripts, true)?.to_json()?)
    }

    /// Serialized `{"config": {...}}`, fetched independently of any status
    /// report. `{}` when the cache-status feature is unavailable.
    pub fn get_configuration(&self) -> Result<String, StatusError> {
        if !self.source.is_available() {
            return Ok(Report::default().to_json()?);
        }
        let report = Report {
            config: Some(ReportBuilder::build_configuration(&*self.source)?),
            ..Default::default()
        };
        Ok(report.to_json()?)
    }

    /// Returns the number of gauges sent, or `None` when nothing was
    /// attempted.
    fn forward(&self, report: &Report) -> Option<usize> {
        let sink = self.sink.as_deref()?;
        report.status.as_ref()?;

        let flags = self.flags();
        match stats::forward(report, &flags, sink) {
            Ok(sent) => {
                tracing::debug!(gauges = sent, "forwarded gauges");
                Some(sent)
            }
            Err(e) => {
                tracing::warn!(error = %e, "gauge forwarding failed");
                None
            }
        }
    }
}
