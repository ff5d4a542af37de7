use std::time::Duration;

use chrono::{FixedOffset, Local, Offset};

use crate::limits::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Process settings, read from `BOXOFFICE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub capacity: u32,
    pub utc_offset: FixedOffset,
    pub acquire_timeout: Duration,
    /// Random pre-request delay per client; off means every client fires at once.
    pub jitter: bool,
    pub monitor_interval: Duration,
    pub report: ReportFormat,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { var: &'static str, value: String },
    OutOfRange { var: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { var, value } => write!(f, "{var}: cannot parse {value:?}"),
            ConfigError::OutOfRange { var, value } => write!(f, "{var}: {value} is out of range"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            utc_offset: Local::now().offset().fix(),
            acquire_timeout: ACQUIRE_TIMEOUT,
            jitter: true,
            monitor_interval: MONITOR_INTERVAL,
            report: ReportFormat::Text,
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(v) = lookup("BOXOFFICE_CAPACITY") {
            let capacity: u32 = parse("BOXOFFICE_CAPACITY", &v)?;
            if capacity == 0 || capacity > MAX_CAPACITY {
                return Err(ConfigError::OutOfRange { var: "BOXOFFICE_CAPACITY", value: v });
            }
            config.capacity = capacity;
        }
        if let Some(v) = lookup("BOXOFFICE_UTC_OFFSET_MINUTES") {
            let minutes: i32 = parse("BOXOFFICE_UTC_OFFSET_MINUTES", &v)?;
            config.utc_offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or(ConfigError::OutOfRange { var: "BOXOFFICE_UTC_OFFSET_MINUTES", value: v })?;
        }
        if let Some(v) = lookup("BOXOFFICE_ACQUIRE_TIMEOUT_MS") {
            config.acquire_timeout = Duration::from_millis(parse("BOXOFFICE_ACQUIRE_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("BOXOFFICE_JITTER") {
            config.jitter = match v.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => true,
                "off" | "false" | "0" => false,
                _ => return Err(ConfigError::Invalid { var: "BOXOFFICE_JITTER", value: v }),
            };
        }
        if let Some(v) = lookup("BOXOFFICE_MONITOR_INTERVAL_MS") {
            let ms: u64 = parse("BOXOFFICE_MONITOR_INTERVAL_MS", &v)?;
            if ms == 0 {
                return Err(ConfigError::OutOfRange { var: "BOXOFFICE_MONITOR_INTERVAL_MS", value: v });
            }
            config.monitor_interval = Duration::from_millis(ms);
        }
        if let Some(v) = lookup("BOXOFFICE_REPORT") {
            config.report = match v.to_ascii_lowercase().as_str() {
                "text" => ReportFormat::Text,
                "json" => ReportFormat::Json,
                _ => return Err(ConfigError::Invalid { var: "BOXOFFICE_REPORT", value: v }),
            };
        }
        if let Some(v) = lookup("BOXOFFICE_METRICS_PORT") {
            config.metrics_port = Some(parse("BOXOFFICE_METRICS_PORT", &v)?);
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}
