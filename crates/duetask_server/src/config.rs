//! Server configuration read from the process environment.
//!
//! # Responsibility
//! - Resolve store connection string, bind address and logging options.
//! - Fail startup on malformed values instead of guessing.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Blank variables are treated as unset.

use duetask_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_DATABASE_URL: &str = "duetask.sqlite3";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_LOG_LEVEL: &str = "DUETASK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DUETASK_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidHost(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPort(value) => write!(f, "invalid {ENV_PORT} value `{value}`"),
            Self::InvalidHost(value) => write!(f, "invalid {ENV_HOST} value `{value}`"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read(ENV_PORT) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };
        let host_raw = read(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host_raw
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_raw.clone()))?;

        Ok(Self {
            database_url: read(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            listen_addr: SocketAddr::new(host, port),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(ENV_LOG_DIR),
        })
    }
}
