//! Structured logging and request tracing.

mod logging;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use spans::{SpanExt, StatusSpan};
