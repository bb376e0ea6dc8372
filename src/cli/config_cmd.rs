//! Config subcommands: show, defaults, validate.
//!
//! These read configuration directly and never touch the status file or
//! the statsd daemon.

use crate::config::{self, ConfigError, EffectiveConfig, EnvConfig};
use crate::stats::UdpStatsSink;

/// Print effective config as key-value pairs to stdout.
pub fn run_show() -> i32 {
    match config::load_from_env_file() {
        Ok(env) => {
            print_config(&env.effective_config());
            0
        }
        Err(e) => config_error(&e),
    }
}

/// Print the documented defaults.
pub fn run_defaults() {
    println!("OPCACHE_STATUS_FILE=opcache-status.json");
    println!("OPCACHE_CONFIG_FILE=");
    println!("OPCACHE_STATSD_ENABLED=false");
    println!("OPCACHE_STATSD_HOST=127.0.0.1");
    println!("OPCACHE_STATSD_PORT=8125");
    println!("OPCACHE_STATSD_TIMEOUT_MS=");
    println!("OPCACHE_STATSD_PERSISTENT=false");
    println!("OPCACHE_STATSD_NAMESPACE=opcache");
    println!("OPCACHE_EXTRA_STATS=");
    println!("OPCACHE_WATCH_INTERVAL=10");
    println!("OPCACHE_LOG_LEVEL=info");
    println!("OPCACHE_LOG_FORMAT=json");
    println!("OPCACHE_LOG_FILE=");
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found, 2 if the config file
/// cannot be loaded.
pub fn run_validate() -> i32 {
    let env = match config::load_from_env_file() {
        Ok(env) => env,
        Err(e) => return config_error(&e),
    };
    let warnings = validate(&env);
    for warning in &warnings {
        eprintln!("WARNING: {}", warning);
    }

    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

/// Collect configuration warnings.
pub fn validate(env: &EnvConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !env.unknown_extra_stats.is_empty() {
        warnings.push(format!(
            "OPCACHE_EXTRA_STATS contains unsupported names: {}",
            env.unknown_extra_stats.join(", ")
        ));
    }

    if !env.status_file.is_file() {
        warnings.push(format!(
            "OPCACHE_STATUS_FILE {} does not exist; reports will be empty",
            env.status_file.display()
        ));
    }

    if let Some(path) = &env.config_file {
        if !path.is_file() {
            warnings.push(format!("OPCACHE_CONFIG_FILE {} does not exist", path.display()));
        }
    }

    match &env.statsd {
        Some(params) => {
            if let Err(e) = UdpStatsSink::connect(params) {
                warnings.push(format!("statsd sink unusable: {}", e));
            }
        }
        None if env.extra_stats.enabled().next().is_some() => {
            warnings.push(
                "OPCACHE_EXTRA_STATS is set but statsd forwarding is disabled".to_string(),
            );
        }
        None => {}
    }

    if tracing_subscriber::EnvFilter::try_new(&env.log.level).is_err() {
        warnings.push(format!("OPCACHE_LOG_LEVEL {:?} is not a valid filter", env.log.level));
    }

    warnings
}

fn config_error(e: &ConfigError) -> i32 {
    eprintln!("Configuration error: {}", e);
    2
}

fn print_config(cfg: &EffectiveConfig) {
    println!("OPCACHE_STATUS_FILE={}", cfg.status_file);
    println!("OPCACHE_CONFIG_FILE={}", cfg.config_file);
    println!("OPCACHE_STATSD_ENABLED={}", cfg.statsd_enabled);
    println!("OPCACHE_STATSD_HOST={}", cfg.statsd_host);
    println!("OPCACHE_STATSD_PORT={}", cfg.statsd_port);
    println!(
        "OPCACHE_STATSD_TIMEOUT_MS={}",
        cfg.statsd_timeout_ms.map(|t| t.to_string()).unwrap_or_default()
    );
    println!("OPCACHE_STATSD_PERSISTENT={}", cfg.statsd_persistent);
    println!("OPCACHE_STATSD_NAMESPACE={}", cfg.statsd_namespace);
    println!("OPCACHE_EXTRA_STATS={}", cfg.extra_stats.join(","));
    println!("OPCACHE_WATCH_INTERVAL={}", cfg.watch_interval_secs);
    println!("OPCACHE_LOG_LEVEL={}", cfg.log_level);
    println!("OPCACHE_LOG_FORMAT={}", cfg.log_format);
    println!("OPCACHE_LOG_FILE={}", cfg.log_file);
}
