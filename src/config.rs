use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::session::CleanupConfig;

pub const BIND_ADDR_VAR: &str = "TICTACTOE_BIND_ADDR";
pub const ALLOWED_ORIGINS_VAR: &str = "TICTACTOE_ALLOWED_ORIGINS";
pub const SESSION_TIMEOUT_VAR: &str = "TICTACTOE_SESSION_TIMEOUT_SECS";
pub const GC_INTERVAL_VAR: &str = "TICTACTOE_GC_INTERVAL_SECS";
pub const SEND_TIMEOUT_VAR: &str = "TICTACTOE_SEND_TIMEOUT_SECS";
pub const RECEIVE_TIMEOUT_VAR: &str = "TICTACTOE_RECEIVE_TIMEOUT_SECS";
pub const THROTTLE_VAR: &str = "TICTACTOE_THROTTLE_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Limits applied to every player connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Upper bound for delivering one outbound message
    pub send_timeout: Duration,
    /// Upper bound for waiting on the next inbound message
    pub receive_timeout: Duration,
    /// Minimum spacing between two inbound messages
    pub throttle: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(60),
            receive_timeout: Duration::from_secs(10 * 60),
            throttle: Duration::from_millis(100),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub cleanup: CleanupConfig,
    pub connection: ConnectionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            cleanup: CleanupConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from `lookup`, falling back to defaults for
    /// every variable it does not provide
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: BIND_ADDR_VAR,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(value) = lookup(ALLOWED_ORIGINS_VAR) {
            config.allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = lookup(SESSION_TIMEOUT_VAR) {
            config.cleanup.session_timeout = parse_secs(SESSION_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(GC_INTERVAL_VAR) {
            config.cleanup.cleanup_interval = parse_secs(GC_INTERVAL_VAR, &value)?;
        }
        if let Some(value) = lookup(SEND_TIMEOUT_VAR) {
            config.connection.send_timeout = parse_secs(SEND_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(RECEIVE_TIMEOUT_VAR) {
            config.connection.receive_timeout = parse_secs(RECEIVE_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(THROTTLE_VAR) {
            config.connection.throttle =
                Duration::from_millis(parse_number(THROTTLE_VAR, &value)?);
        }

        if config.cleanup.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                var: GC_INTERVAL_VAR,
                value: "0".to_string(),
                reason: "interval must be positive".to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_number(var, value).map(Duration::from_secs)
}
