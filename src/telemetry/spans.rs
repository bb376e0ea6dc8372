//! Request spans for status retrieval.

use tracing::{info_span, Span};

/// Extension trait for recording outcomes on a span.
pub trait SpanExt {
    /// Record `status` and, on failure, `error.message`.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for `status_request` spans.
pub struct StatusSpan;

impl StatusSpan {
    /// Fields `status`, `error.message` and `gauges_sent` start empty and
    /// are filled in as the request progresses.
    pub fn new(request_id: &str, include_scripts: bool, include_config: bool) -> Span {
        info_span!(
            "status_request",
            request_id = %request_id,
            include_scripts,
            include_config,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            gauges_sent = tracing::field::Empty,
        )
    }

    /// New span with a random request id.
    pub fn generate(include_scripts: bool, include_config: bool) -> Span {
        let request_id = uuid::Uuid::new_v4().to_string();
        Self::new(&request_id, include_scripts, include_config)
    }
}
