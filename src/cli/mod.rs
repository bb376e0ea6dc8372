//! CLI subcommands for the `opcache-status` binary.
//!
//! ## Usage
//!
//! ```bash
//! opcache-status status --scripts   # Print the report, forward gauges
//! opcache-status status --gauges    # Print the gauges instead of sending them
//! opcache-status configuration      # Print the runtime configuration
//! opcache-status watch              # Forward gauges periodically
//! opcache-status config validate    # Check configuration
//! ```

pub mod config_cmd;
pub mod status_cmd;
pub mod watch;

pub use status_cmd::{run_configuration, run_status, StatusArgs};
pub use watch::{run_watch, WatchArgs};

use std::sync::Arc;

use crate::config::EnvConfig;
use crate::service::StatusService;
use crate::snapshot::JsonFileSource;
use crate::stats::{GaugeStore, SinkError};

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for a failed request.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for unusable configuration.
pub const EXIT_CONFIG: i32 = 2;

/// Snapshot source described by the configuration.
pub fn source_from_config(cfg: &EnvConfig) -> JsonFileSource {
    let source = JsonFileSource::new(&cfg.status_file);
    match &cfg.config_file {
        Some(path) => source.with_config_path(path),
        None => source,
    }
}

/// Build the service described by the configuration.
///
/// With `dry_run`, gauges go to the given store instead of statsd, whether
/// or not statsd is enabled.
pub fn build_service(
    cfg: &EnvConfig,
    dry_run: Option<Arc<GaugeStore>>,
) -> Result<StatusService, SinkError> {
    let source = source_from_config(cfg);
    let service = match (dry_run, &cfg.statsd) {
        (Some(store), _) => StatusService::with_sink(source, store),
        (None, Some(params)) => StatusService::with_connection(source, params)?,
        (None, None) => StatusService::new(source),
    };
    for name in &cfg.unknown_extra_stats {
        tracing::warn!(name = %name, "ignoring unsupported extra stat");
    }
    Ok(service.with_extra_stats(cfg.extra_stats))
}

/// Split `argv` into the subcommand and its arguments.
///
/// No subcommand, or a leading `--flag` other than `--help`/`--version`,
/// selects `status`.
pub fn split_command(argv: &[String]) -> (&str, &[String]) {
    match argv.get(1).map(String::as_str) {
        None => ("status", &[] as &[String]),
        Some(first) if first.starts_with("--") && !matches!(first, "--help" | "--version") => {
            ("status", &argv[1..])
        }
        Some(first) => (first, &argv[2..]),
    }
}

/// Whether `flag` appears in `args`.
pub(crate) fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Value following `flag` in `args`.
pub(crate) fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
