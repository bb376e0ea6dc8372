//! Gauge forwarding to a stats-aggregation daemon.
//!
//! The forwarder always emits the `memory_usage` and `opcache_statistics`
//! groups. The boolean health indicators are opt-in through
//! [`ExtraStatsFlags`].

mod facade;
mod flags;
mod forward;
mod store;
mod udp;

pub use facade::MetricsSink;
pub use flags::{ExtraStat, ExtraStatsFlags, UnsupportedStat};
pub use forward::forward;
pub use store::{GaugeSample, GaugeStore};
pub use udp::{SinkConnectionParams, UdpStatsSink, DEFAULT_HOST, DEFAULT_NAMESPACE, DEFAULT_PORT};

use thiserror::Error;

/// Errors raised by a gauge sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No socket address found for {0}")]
    NoAddress(String),

    #[error("Gauge send failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gauge {name} has non-finite value {value}")]
    InvalidValue { name: String, value: f64 },
}

/// A gauge-emitting transport.
pub trait StatsSink: Send + Sync {
    /// Record `value` for `name`, replacing any previous value.
    fn gauge(&self, name: &str, value: f64) -> Result<(), SinkError>;
}

impl<S: StatsSink + ?Sized> StatsSink for Box<S> {
    fn gauge(&self, name: &str, value: f64) -> Result<(), SinkError> {
        (**self).gauge(name, value)
    }
}

impl<S: StatsSink + ?Sized> StatsSink for std::sync::Arc<S> {
    fn gauge(&self, name: &str, value: f64) -> Result<(), SinkError> {
        (**self).gauge(name, value)
    }
}
