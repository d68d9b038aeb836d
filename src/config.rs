//! Start-up configuration read from the environment.
//!
//! | Variable | Default | Constraint |
//! |---|---|---|
//! | `DEFAULT_DELAY` | `3` | seconds, ≥ 1 and ≤ `MAX_DELAY` |
//! | `MAX_DELAY` | `30` | seconds, ≥ 1 and ≤ 3600 |
//! | `FAILURE_RATE` | `0.0` | in `[0, 1]` |
//! | `PORT` | `8001` | 1–65535 |
//! | `HOST` | `0.0.0.0` | an IP address |
//!
//! The environment is read once. The resulting [`Config`] is shared
//! read-only with every handler for the lifetime of the process.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use serde::Serialize;

pub const DEFAULT_DELAY_SECONDS: f64 = 3.0;
pub const MAX_DELAY_SECONDS: f64 = 30.0;
pub const DEFAULT_FAILURE_RATE: f64 = 0.0;
pub const DEFAULT_PORT: u16 = 8001;

/// Shortest delay `/slow` accepts, in seconds. `DEFAULT_DELAY` may not go
/// below it either, so a bare `/slow` is always valid.
pub const MIN_SLOW_DELAY_SECONDS: f64 = 1.0;

/// Largest `MAX_DELAY` accepted: one hour.
pub const MAX_DELAY_CEILING_SECONDS: f64 = 3600.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}={value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: &'static str },

    #[error("DEFAULT_DELAY ({default}) must not exceed MAX_DELAY ({max})")]
    DefaultAboveMax { default: f64, max: f64 },
}

/// Service configuration, immutable after start-up.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Config {
    #[serde(rename = "default_delay")]
    pub default_delay_seconds: f64,
    #[serde(rename = "max_delay")]
    pub max_delay_seconds: f64,
    #[serde(rename = "failure_rate")]
    pub default_failure_rate: f64,
    #[serde(skip)]
    pub port: u16,
    #[serde(skip)]
    pub host: IpAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_delay_seconds: DEFAULT_DELAY_SECONDS,
            max_delay_seconds: MAX_DELAY_SECONDS,
            default_failure_rate: DEFAULT_FAILURE_RATE,
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset variables
    /// fall back to their defaults; set-but-empty ones do too.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            default_delay_seconds: parse(&lookup, "DEFAULT_DELAY", defaults.default_delay_seconds)?,
            max_delay_seconds: parse(&lookup, "MAX_DELAY", defaults.max_delay_seconds)?,
            default_failure_rate: parse(&lookup, "FAILURE_RATE", defaults.default_failure_rate)?,
            port: parse(&lookup, "PORT", defaults.port)?,
            host: parse(&lookup, "HOST", defaults.host)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |var: &'static str, value: f64, reason: &'static str| ConfigError::Invalid { var, value: value.to_string(), reason };

        if !(self.default_delay_seconds.is_finite() && self.default_delay_seconds >= MIN_SLOW_DELAY_SECONDS) {
            return Err(invalid("DEFAULT_DELAY", self.default_delay_seconds, "must be at least 1 second"));
        }
        if !(MIN_SLOW_DELAY_SECONDS..=MAX_DELAY_CEILING_SECONDS).contains(&self.max_delay_seconds) {
            return Err(invalid("MAX_DELAY", self.max_delay_seconds, "must be between 1 and 3600 seconds"));
        }
        if self.default_delay_seconds > self.max_delay_seconds {
            return Err(ConfigError::DefaultAboveMax {
                default: self.default_delay_seconds,
                max: self.max_delay_seconds,
            });
        }
        if !(0.0..=1.0).contains(&self.default_failure_rate) {
            return Err(invalid("FAILURE_RATE", self.default_failure_rate, "must be between 0.0 and 1.0"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid { var: "PORT", value: "0".into(), reason: "must be a positive port number" });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value: raw,
            reason: "could not be parsed",
        }),
        _ => Ok(default),
    }
}
