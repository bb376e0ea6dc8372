//! Configuration loading from environment variables and an optional TOML
//! file.
//!
//! Values come from `OPCACHE_*` environment variables, falling back to the
//! TOML file named by `OPCACHE_STATUS_CONFIG`, then to defaults. Invalid
//! values fall back without failing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `OPCACHE_STATUS_FILE` | opcache-status.json | Status dump written by the runtime |
//! | `OPCACHE_CONFIG_FILE` | unset | Configuration dump written by the runtime |
//! | `OPCACHE_STATSD_ENABLED` | false | Forward gauges to statsd |
//! | `OPCACHE_STATSD_HOST` | 127.0.0.1 | statsd host |
//! | `OPCACHE_STATSD_PORT` | 8125 | statsd port |
//! | `OPCACHE_STATSD_TIMEOUT_MS` | unset | Socket write timeout |
//! | `OPCACHE_STATSD_PERSISTENT` | false | Reuse one socket |
//! | `OPCACHE_STATSD_NAMESPACE` | opcache | Gauge name prefix |
//! | `OPCACHE_EXTRA_STATS` | empty | Comma-separated extra stats to forward |
//! | `OPCACHE_WATCH_INTERVAL` | 10 | Seconds between `watch` reports |
//! | `OPCACHE_LOG_LEVEL` | info | Log filter |
//! | `OPCACHE_LOG_FORMAT` | json | `json` or `pretty` |
//! | `OPCACHE_LOG_FILE` | unset | Append logs to this file instead of stderr |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::stats::{
    ExtraStatsFlags, SinkConnectionParams, DEFAULT_HOST, DEFAULT_NAMESPACE, DEFAULT_PORT,
};
use crate::telemetry::{LogConfig, LogFormat};

/// Names the TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "OPCACHE_STATUS_CONFIG";

const DEFAULT_STATUS_FILE: &str = "opcache-status.json";
const DEFAULT_WATCH_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// TOML file layout. Every key is optional.
///
/// ```toml
/// status_file = "/var/run/php/opcache-status.json"
/// extra_stats = ["cache_full", "restart_pending"]
///
/// [statsd]
/// enabled = true
/// host = "10.0.0.5"
/// timeout_ms = 250
///
/// [log]
/// level = "debug"
/// format = "pretty"
/// output_path = "/var/log/opcache-status.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub status_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub extra_stats: Vec<String>,
    pub watch_interval_secs: Option<u64>,
    pub statsd: StatsdSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatsdSection {
    pub enabled: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub persistent: Option<bool>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub output_path: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&raw, path)
    }
}

/// Effective configuration summary.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub status_file: String,
    pub config_file: String,
    pub statsd_enabled: bool,
    pub statsd_host: String,
    pub statsd_port: u16,
    pub statsd_timeout_ms: Option<u128>,
    pub statsd_persistent: bool,
    pub statsd_namespace: String,
    pub extra_stats: Vec<&'static str>,
    pub watch_interval_secs: u64,
    pub log_level: String,
    pub log_format: &'static str,
    pub log_file: String,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub status_file: PathBuf,
    pub config_file: Option<PathBuf>,
    /// `None` when forwarding is disabled.
    pub statsd: Option<SinkConnectionParams>,
    pub extra_stats: ExtraStatsFlags,
    /// Names in `OPCACHE_EXTRA_STATS` or the file that were not recognized.
    pub unknown_extra_stats: Vec<String>,
    pub watch_interval: Duration,
    pub log: LogConfig,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_var(key).and_then(|v| parse_bool(&v))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.trim().parse::<T>().ok())
}

fn load_statsd(file: &StatsdSection) -> Option<SinkConnectionParams> {
    let enabled = env_bool("OPCACHE_STATSD_ENABLED")
        .or(file.enabled)
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    let host = env_var("OPCACHE_STATSD_HOST")
        .or_else(|| file.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = env_parse::<u16>("OPCACHE_STATSD_PORT")
        .or(file.port)
        .unwrap_or(DEFAULT_PORT);
    let timeout = env_parse::<u64>("OPCACHE_STATSD_TIMEOUT_MS")
        .or(file.timeout_ms)
        .map(Duration::from_millis);
    let persistent = env_bool("OPCACHE_STATSD_PERSISTENT")
        .or(file.persistent)
        .unwrap_or(false);
    // An explicitly empty namespace is allowed, so no empty-string filter.
    let namespace = std::env::var("OPCACHE_STATSD_NAMESPACE")
        .ok()
        .or_else(|| file.namespace.clone())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    Some(
        SinkConnectionParams::new()
            .host(host)
            .port(port)
            .timeout(timeout)
            .persistent(persistent)
            .namespace(namespace),
    )
}

fn load_extra_stats(file: &[String]) -> (ExtraStatsFlags, Vec<String>) {
    match env_var("OPCACHE_EXTRA_STATS") {
        Some(list) => ExtraStatsFlags::parse_list(&list),
        None => ExtraStatsFlags::parse_list(&file.join(",")),
    }
}

fn load_log(file: &LogSection) -> LogConfig {
    let level = env_var("OPCACHE_LOG_LEVEL")
        .or_else(|| file.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let format = env_var("OPCACHE_LOG_FORMAT")
        .or_else(|| file.format.clone())
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or_default();
    let output_path = env_var("OPCACHE_LOG_FILE")
        .map(PathBuf::from)
        .or_else(|| file.output_path.clone());
    LogConfig {
        format,
        level,
        output_path,
    }
}

/// Resolve configuration from the environment on top of `file`.
pub fn load_with(file: &FileConfig) -> EnvConfig {
    let status_file = env_var("OPCACHE_STATUS_FILE")
        .map(PathBuf::from)
        .or_else(|| file.status_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATUS_FILE));
    let config_file = env_var("OPCACHE_CONFIG_FILE")
        .map(PathBuf::from)
        .or_else(|| file.config_file.clone());
    let watch_secs = env_parse::<u64>("OPCACHE_WATCH_INTERVAL")
        .or(file.watch_interval_secs)
        .unwrap_or(DEFAULT_WATCH_SECS)
        .max(1);
    let (extra_stats, unknown_extra_stats) = load_extra_stats(&file.extra_stats);

    EnvConfig {
        status_file,
        config_file,
        statsd: load_statsd(&file.statsd),
        extra_stats,
        unknown_extra_stats,
        watch_interval: Duration::from_secs(watch_secs),
        log: load_log(&file.log),
    }
}

/// Load configuration from the environment only.
pub fn load() -> EnvConfig {
    load_with(&FileConfig::default())
}

/// Load configuration, reading the TOML file named by
/// `OPCACHE_STATUS_CONFIG` first when it is set.
pub fn load_from_env_file() -> Result<EnvConfig, ConfigError> {
    let file = match env_var(CONFIG_PATH_VAR) {
        Some(path) => FileConfig::read(Path::new(&path))?,
        None => FileConfig::default(),
    };
    Ok(load_with(&file))
}

impl EnvConfig {
    /// Printable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        let statsd = self.statsd.clone().unwrap_or_default();
        EffectiveConfig {
            status_file: self.status_file.display().to_string(),
            config_file: self
                .config_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            statsd_enabled: self.statsd.is_some(),
            statsd_host: statsd.host,
            statsd_port: statsd.port,
            statsd_timeout_ms: statsd.timeout.map(|t| t.as_millis()),
            statsd_persistent: statsd.persistent,
            statsd_namespace: statsd.namespace,
            extra_stats: self.extra_stats.enabled().map(|s| s.as_str()).collect(),
            watch_interval_secs: self.watch_interval.as_secs(),
            log_level: self.log.level.clone(),
            log_format: match self.log.format {
                LogFormat::Json => "json",
                LogFormat::Pretty => "pretty",
            },
            log_file: self
                .log
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) const ENV_KEYS: &[&str] = &[
        "OPCACHE_STATUS_FILE",
        "OPCACHE_CONFIG_FILE",
        "OPCACHE_STATSD_ENABLED",
        "OPCACHE_STATSD_HOST",
        "OPCACHE_STATSD_PORT",
        "OPCACHE_STATSD_TIMEOUT_MS",
        "OPCACHE_STATSD_PERSISTENT",
        "OPCACHE_STATSD_NAMESPACE",
        "OPCACHE_EXTRA_STATS",
        "OPCACHE_WATCH_INTERVAL",
        "OPCACHE_LOG_LEVEL",
        "OPCACHE_LOG_FORMAT",
        "OPCACHE_LOG_FILE",
        "OPCACHE_STATUS_CONFIG",
    ];

    pub(crate) fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.status_file, PathBuf::from("opcache-status.json"));
        assert!(cfg.config_file.is_none());
        assert!(cfg.statsd.is_none());
        assert_eq!(cfg.extra_stats, ExtraStatsFlags::default());
        assert_eq!(cfg.watch_interval.as_secs(), 10);
        assert_eq!(cfg.log, LogConfig::default());
    }

    #[test]
    fn test_statsd_defaults_when_enabled() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("OPCACHE_STATSD_ENABLED", "true");
        let cfg = load();
        assert_eq!(cfg.statsd, Some(SinkConnectionParams::default()));
        clear_env_vars();
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("OPCACHE_STATSD_ENABLED", "1");
        std::env::set_var("OPCACHE_STATSD_HOST", "stats.local");
        std::env::set_var("OPCACHE_STATSD_PORT", "9125");
        std::env::set_var("OPCACHE_STATSD_TIMEOUT_MS", "500");
        std::env::set_var("OPCACHE_STATSD_PERSISTENT", "yes");
        std::env::set_var("OPCACHE_STATSD_NAMESPACE", "php.web");
        std::env::set_var("OPCACHE_EXTRA_STATS", "cache_full,bogus");
        std::env::set_var("OPCACHE_WATCH_INTERVAL", "30");
        let cfg = load();
        let statsd = cfg.statsd.unwrap();
        assert_eq!(statsd.host, "stats.local");
        assert_eq!(statsd.port, 9125);
        assert_eq!(statsd.timeout, Some(Duration::from_millis(500)));
        assert!(statsd.persistent);
        assert_eq!(statsd.namespace, "php.web");
        assert!(cfg.extra_stats.cache_full);
        assert_eq!(cfg.unknown_extra_stats, ["bogus"]);
        assert_eq!(cfg.watch_interval.as_secs(), 30);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("OPCACHE_STATSD_ENABLED", "true");
        std::env::set_var("OPCACHE_STATSD_PORT", "not-a-port");
        std::env::set_var("OPCACHE_WATCH_INTERVAL", "0");
        std::env::set_var("OPCACHE_LOG_FORMAT", "xml");
        let cfg = load();
        assert_eq!(cfg.statsd.unwrap().port, 8125);
        assert_eq!(cfg.watch_interval.as_secs(), 1, "interval must have floor");
        assert_eq!(cfg.log.format, LogFormat::Json);
        clear_env_vars();
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let file = FileConfig::from_toml(
            r#"
            status_file = "/from/file.json"
            extra_stats = ["restart_pending"]

            [statsd]
            enabled = true
            port = 7000
            "#,
            Path::new("test.toml"),
        )
        .unwrap();
        std::env::set_var("OPCACHE_STATSD_PORT", "7001");
        let cfg = load_with(&file);
        assert_eq!(cfg.status_file, PathBuf::from("/from/file.json"));
        assert!(cfg.extra_stats.restart_pending);
        assert_eq!(cfg.statsd.unwrap().port, 7001);
        clear_env_vars();
    }

    #[test]
    fn test_effective_config_lists_extra_stats() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("OPCACHE_EXTRA_STATS", "restart_in_progress,opcache_enabled");
        let eff = load().effective_config();
        assert_eq!(eff.extra_stats, ["opcache_enabled", "restart_in_progress"]);
        assert!(!eff.statsd_enabled);
        clear_env_vars();
    }

    #[test]
    fn test_log_file_from_env_or_file() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let file = FileConfig::from_toml(
            r#"
            [log]
            output_path = "/var/log/opcache-from-file.log"
            "#,
            Path::new("test.toml"),
        )
        .unwrap();
        let cfg = load_with(&file);
        assert_eq!(
            cfg.log.output_path,
            Some(PathBuf::from("/var/log/opcache-from-file.log"))
        );

        std::env::set_var("OPCACHE_LOG_FILE", "/var/log/opcache.log");
        let eff = load_with(&file).effective_config();
        assert_eq!(eff.log_file, "/var/log/opcache.log");
        assert_eq!(load().effective_config().log_file, "/var/log/opcache.log");

        std::env::remove_var("OPCACHE_LOG_FILE");
        assert_eq!(load().effective_config().log_file, "");
        clear_env_vars();
    }
}
