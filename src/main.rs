//! `opcache-status` entry point.
//!
//! ## CLI Subcommands
//!
//! - `opcache-status [status] [--scripts ...]` - Print the status report
//! - `opcache-status configuration` - Print the runtime configuration
//! - `opcache-status watch` - Forward gauges periodically
//! - `opcache-status config show|defaults|validate` - Inspect configuration

use std::process::ExitCode;
use std::sync::Arc;

use opcache_status::cli::{
    self, config_cmd, run_configuration, run_status, run_watch, StatusArgs, WatchArgs,
};
use opcache_status::config::{self as status_config, EnvConfig};
use opcache_status::telemetry::init_logging;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let (command, rest) = cli::split_command(&args);

    match command {
        "status" | "" => {
            let Some(cfg) = load_config() else {
                return ExitCode::from(cli::EXIT_CONFIG as u8);
            };
            let code = run_status(&cfg, StatusArgs::parse(rest), &mut std::io::stdout().lock());
            ExitCode::from(code as u8)
        }
        "configuration" => {
            let Some(cfg) = load_config() else {
                return ExitCode::from(cli::EXIT_CONFIG as u8);
            };
            let pretty = rest.iter().any(|a| a == "--pretty");
            let code = run_configuration(&cfg, pretty, &mut std::io::stdout().lock());
            ExitCode::from(code as u8)
        }
        "watch" => {
            let Some(cfg) = load_config() else {
                return ExitCode::from(cli::EXIT_CONFIG as u8);
            };
            ExitCode::from(watch(&cfg, rest).await as u8)
        }
        "config" => {
            let subcommand = rest.first().map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => ExitCode::from(config_cmd::run_show() as u8),
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => ExitCode::from(config_cmd::run_validate() as u8),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            match rest.first() {
                Some(subcommand) => print_command_help(subcommand),
                None => print_usage(),
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("opcache-status {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

/// Load configuration and start logging. Prints the problem and returns
/// `None` when the config file is unusable.
fn load_config() -> Option<EnvConfig> {
    let cfg = match status_config::load_from_env_file() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return None;
        }
    };
    if let Err(e) = init_logging(&cfg.log) {
        eprintln!("Logging disabled: {}", e);
    }
    Some(cfg)
}

async fn watch(cfg: &EnvConfig, rest: &[String]) -> i32 {
    let args = WatchArgs::parse(rest, cfg.watch_interval);
    let service = match cli::build_service(cfg, None) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            eprintln!("Failed to set up statsd sink: {}", e);
            return cli::EXIT_CONFIG;
        }
    };
    if !service.has_sink() {
        eprintln!("statsd forwarding is disabled; set OPCACHE_STATSD_ENABLED=true");
        return cli::EXIT_CONFIG;
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Shutdown signal received, stopping...");
        }
        signal_cancel.cancel();
    });

    run_watch(service, args.interval, args.scripts, cancel).await;
    cli::EXIT_OK
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "opcache-status v{}

USAGE:
    opcache-status [COMMAND] [OPTIONS]

COMMANDS:
    status         Print the cache status report (default)
    configuration  Print the runtime configuration
    watch          Forward gauges to statsd periodically
    config         Inspect configuration (show, defaults, validate)
    version        Show version information
    help           Show this help message

ENVIRONMENT:
    OPCACHE_STATUS_FILE     Status dump written by the runtime
    OPCACHE_CONFIG_FILE     Configuration dump written by the runtime
    OPCACHE_STATSD_ENABLED  Forward gauges to statsd (default: false)
    OPCACHE_EXTRA_STATS     Extra stats to forward, comma-separated
    OPCACHE_STATUS_CONFIG   TOML configuration file
    OPCACHE_LOG_LEVEL       Log filter (default: info)

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "status" => eprintln!(
            "opcache-status status - Print the cache status report

USAGE:
    opcache-status status [OPTIONS]

OPTIONS:
    --scripts      Include cached scripts, largest first
    --with-config  Include the runtime configuration
    --pretty       Pretty-print the JSON
    --gauges       Print the gauges that would be sent instead of sending them

DESCRIPTION:
    Prints {{}} when the cache-status feature is not active (no status file).
    Gauges are forwarded when OPCACHE_STATSD_ENABLED is set."
        ),
        "configuration" => eprintln!(
            "opcache-status configuration - Print the runtime configuration

USAGE:
    opcache-status configuration [--pretty]"
        ),
        "watch" => eprintln!(
            "opcache-status watch - Forward gauges periodically

USAGE:
    opcache-status watch [--interval SECS] [--scripts]

DESCRIPTION:
    Builds a report every interval (default OPCACHE_WATCH_INTERVAL) and
    forwards its gauges to statsd until interrupted with Ctrl+C."
        ),
        "config" => eprintln!(
            "opcache-status config - Inspect configuration

USAGE:
    opcache-status config show      Print effective values
    opcache-status config defaults  Print default values
    opcache-status config validate  Check for misconfiguration (exit 1 on warnings)"
        ),
        _ => {
            eprintln!("No help available for: {}", command);
            print_usage();
        }
    }
}
