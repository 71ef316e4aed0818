//! Process configuration.
//!
//! All settings are driven by environment variables. Unset variables fall
//! back to the defaults below.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

const DEFAULT_LISTEN: &str = "0.0.0.0:3000";
const DEFAULT_SERVICES_PATH: &str = "config.json";
const DEFAULT_POLL_SECS: u64 = 2;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address (`MDS_LISTEN`).
    pub listen: SocketAddr,
    /// Path of the services file (`MDS_CONFIG`).
    pub services_path: PathBuf,
    /// How often to check the services file for changes
    /// (`MDS_CONFIG_POLL_SECS`, `0` disables polling).
    pub poll_interval: Option<Duration>,
    /// Log filter used when `RUST_LOG` is unset (`LOG_LEVEL`).
    pub log_level: String,
    /// Largest request body read before verification (`MDS_MAX_BODY_BYTES`).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            services_path: PathBuf::from(DEFAULT_SERVICES_PATH),
            poll_interval: Some(Duration::from_secs(DEFAULT_POLL_SECS)),
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let listen_value = lookup("MDS_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_owned());
        let listen = listen_value
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddress {
                value: listen_value.clone(),
                source,
            })?;

        let poll_secs = match lookup("MDS_CONFIG_POLL_SECS") {
            Some(v) => parse_number("MDS_CONFIG_POLL_SECS", v)?,
            None => DEFAULT_POLL_SECS,
        };

        let max_body_bytes = match lookup("MDS_MAX_BODY_BYTES") {
            Some(v) => match parse_number::<usize>("MDS_MAX_BODY_BYTES", v.clone())? {
                0 => {
                    return Err(ConfigError::InvalidNumber {
                        var: "MDS_MAX_BODY_BYTES",
                        value: v,
                    });
                }
                n => n,
            },
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            listen,
            services_path: lookup("MDS_CONFIG")
                .map_or_else(|| PathBuf::from(DEFAULT_SERVICES_PATH), PathBuf::from),
            poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
            max_body_bytes,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: String) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { var, value })
}
