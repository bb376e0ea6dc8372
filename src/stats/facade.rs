//! Gauge sink backed by the `metrics` crate facade.
//!
//! Lets embedders that already install a `metrics` recorder receive the same
//! gauges without running a statsd daemon.

use super::{SinkError, StatsSink};

/// Publishes gauges through `metrics::gauge!` as `<namespace>.<name>`.
#[derive(Debug, Clone)]
pub struct MetricsSink {
    namespace: String,
}

impl MetricsSink {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn key(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new(super::DEFAULT_NAMESPACE)
    }
}

impl StatsSink for MetricsSink {
    fn gauge(&self, name: &str, value: f64) -> Result<(), SinkError> {
        metrics::gauge!(self.key(name)).set(value);
        Ok(())
    }
}
