//! `watch` subcommand: forward gauges on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::flag_value;
use crate::service::StatusService;

/// Options for `watch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchArgs {
    pub interval: Duration,
    pub scripts: bool,
}

impl WatchArgs {
    /// Parse `--interval SECS` and `--scripts`, falling back to
    /// `default_interval`. Intervals below one second are raised to one.
    pub fn parse(args: &[String], default_interval: Duration) -> Self {
        let interval = flag_value(args, "--interval")
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(default_interval);
        Self {
            interval,
            scripts: super::has_flag(args, "--scripts"),
        }
    }
}

/// Build a report every `interval` until `cancel` fires. Returns the number
/// of successful reports.
///
/// Each report runs on the blocking pool since snapshot reads and gauge
/// sends are synchronous.
pub async fn run_watch(
    service: Arc<StatusService>,
    interval: Duration,
    include_scripts: bool,
    cancel: CancellationToken,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0;

    tracing::info!(interval_secs = interval.as_secs_f64(), "watch started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let svc = service.clone();
                let task = tokio::task::spawn_blocking(move || svc.report(include_scripts, false));
                match task.await {
                    Ok(Ok(_)) => completed += 1,
                    Ok(Err(e)) => tracing::warn!(error = %e, "status report failed"),
                    Err(e) => tracing::error!(error = %e, "status report task panicked"),
                }
            }
        }
    }
    tracing::info!(reports = completed, "watch stopped");
    completed
}
