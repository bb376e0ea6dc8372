//! Allow-list of boolean health indicators forwarded as gauges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A boolean health indicator that can be forwarded as a 0/1 gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraStat {
    OpcacheEnabled,
    CacheFull,
    RestartPending,
    RestartInProgress,
}

impl ExtraStat {
    pub const ALL: [ExtraStat; 4] = [
        ExtraStat::OpcacheEnabled,
        ExtraStat::CacheFull,
        ExtraStat::RestartPending,
        ExtraStat::RestartInProgress,
    ];

    /// Snapshot key and gauge name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtraStat::OpcacheEnabled => "opcache_enabled",
            ExtraStat::CacheFull => "cache_full",
            ExtraStat::RestartPending => "restart_pending",
            ExtraStat::RestartInProgress => "restart_in_progress",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stat| stat.as_str() == name)
    }
}

impl fmt::Display for ExtraStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported extra stat: {0}")]
pub struct UnsupportedStat(pub String);

impl FromStr for ExtraStat {
    type Err = UnsupportedStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnsupportedStat(s.to_string()))
    }
}

/// Which extra stats are forwarded. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraStatsFlags {
    pub opcache_enabled: bool,
    pub cache_full: bool,
    pub restart_pending: bool,
    pub restart_in_progress: bool,
}

impl ExtraStatsFlags {
    pub fn get(&self, stat: ExtraStat) -> bool {
        match stat {
            ExtraStat::OpcacheEnabled => self.opcache_enabled,
            ExtraStat::CacheFull => self.cache_full,
            ExtraStat::RestartPending => self.restart_pending,
            ExtraStat::RestartInProgress => self.restart_in_progress,
        }
    }

    pub fn set(&mut self, stat: ExtraStat, send: bool) {
        let slot = match stat {
            ExtraStat::OpcacheEnabled => &mut self.opcache_enabled,
            ExtraStat::CacheFull => &mut self.cache_full,
            ExtraStat::RestartPending => &mut self.restart_pending,
            ExtraStat::RestartInProgress => &mut self.restart_in_progress,
        };
        *slot = send;
    }

    /// Overwrite flags by name. Unsupported names are ignored. Always
    /// returns `true`.
    pub fn update<I, K>(&mut self, flags: I) -> bool
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        for (name, send) in flags {
            match ExtraStat::from_name(name.as_ref()) {
                Some(stat) => self.set(stat, send),
                None => tracing::trace!(name = name.as_ref(), "ignoring unsupported extra stat"),
            }
        }
        true
    }

    /// Enabled stats, in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = ExtraStat> + '_ {
        ExtraStat::ALL.into_iter().filter(|stat| self.get(*stat))
    }

    /// Parse a comma-separated list of names to enable. Returns the flags
    /// and the names that were not recognized.
    pub fn parse_list(list: &str) -> (Self, Vec<String>) {
        let mut flags = Self::default();
        let mut unknown = Vec::new();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match ExtraStat::from_name(name) {
                Some(stat) => flags.set(stat, true),
                None => unknown.push(name.to_string()),
            }
        }
        (flags, unknown)
    }
}
