//! `status` and `configuration` subcommands.

use std::io::Write;
use std::sync::Arc;

use super::{build_service, has_flag, source_from_config, EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::config::EnvConfig;
use crate::report::Report;
use crate::service::StatusService;
use crate::stats::GaugeStore;

/// Options for `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusArgs {
    pub scripts: bool,
    pub with_config: bool,
    pub pretty: bool,
    /// Print the gauges that would be sent instead of sending them.
    pub gauges: bool,
}

impl StatusArgs {
    pub fn parse(args: &[String]) -> Self {
        Self {
            scripts: has_flag(args, "--scripts"),
            with_config: has_flag(args, "--with-config"),
            pretty: has_flag(args, "--pretty"),
            gauges: has_flag(args, "--gauges"),
        }
    }
}

fn encode(report: &Report, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        report.to_json_pretty()
    } else {
        report.to_json()
    }
}

/// Print a status report to `out`. Returns the exit code.
pub fn run_status<W: Write>(cfg: &EnvConfig, args: StatusArgs, out: &mut W) -> i32 {
    let store = args.gauges.then(|| Arc::new(GaugeStore::new()));
    let service = match build_service(cfg, store.clone()) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to set up statsd sink: {}", e);
            return EXIT_CONFIG;
        }
    };

    let report = match service.report(args.scripts, args.with_config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let written = match &store {
        Some(store) => store
            .samples()
            .iter()
            .try_for_each(|s| writeln!(out, "{}:{}|g", s.name, s.value)),
        None => match encode(&report, args.pretty) {
            Ok(json) => writeln!(out, "{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_FAILURE;
            }
        },
    };

    match written {
        Ok(()) => EXIT_OK,
        Err(e) => {
            eprintln!("Failed to write output: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Print `{"config": ...}` to `out`. Returns the exit code.
pub fn run_configuration<W: Write>(cfg: &EnvConfig, pretty: bool, out: &mut W) -> i32 {
    // Configuration retrieval never forwards gauges, so no sink is built.
    let service = StatusService::new(source_from_config(cfg));
    let json = match service.get_configuration() {
        Ok(json) if pretty => Report::from_json(&json).and_then(|r| r.to_json_pretty()),
        Ok(json) => Ok(json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    match json.map(|j| writeln!(out, "{}", j)) {
        Ok(Ok(())) => EXIT_OK,
        Ok(Err(e)) => {
            eprintln!("Failed to write output: {}", e);
            EXIT_FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}
