//! Emits gauges for a built report.

use serde_json::{Map, Value};

use super::{ExtraStatsFlags, SinkError, StatsSink};
use crate::report::Report;

/// Send the report's gauges to `sink` and return how many were sent.
///
/// Enabled extra stats are sent first as 0/1, followed by every numeric
/// entry of `memory_usage` and `opcache_statistics`. A report without a
/// status sends nothing. The first sink failure stops forwarding.
pub fn forward<S>(report: &Report, flags: &ExtraStatsFlags, sink: &S) -> Result<usize, SinkError>
where
    S: StatsSink + ?Sized,
{
    let Some(status) = &report.status else {
        return Ok(0);
    };

    let mut sent = 0;
    for stat in flags.enabled() {
        let value = if status.flag(stat.as_str()) { 1.0 } else { 0.0 };
        sink.gauge(stat.as_str(), value)?;
        sent += 1;
    }

    for group in [status.memory_usage(), status.opcache_statistics()].into_iter().flatten() {
        sent += forward_group(group, sink)?;
    }

    Ok(sent)
}

fn forward_group<S>(group: &Map<String, Value>, sink: &S) -> Result<usize, SinkError>
where
    S: StatsSink + ?Sized,
{
    let mut sent = 0;
    for (name, value) in group {
        match value.as_f64() {
            Some(v) => {
                sink.gauge(name, v)?;
                sent += 1;
            }
            None => tracing::debug!(gauge = %name, "skipping non-numeric value"),
        }
    }
    Ok(sent)
}
