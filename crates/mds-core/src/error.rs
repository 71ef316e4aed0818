//! Error types for configuration and services file handling.

use std::path::PathBuf;

/// Errors raised while loading process or services configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The services file could not be read or written.
    #[error("failed to access services file {path}: {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The services file is not valid JSON of the expected shape.
    #[error("failed to parse services file {path}: {source}")]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The listen address is not a valid socket address.
    #[error("invalid listen address {value:?}: {source}")]
    InvalidListenAddress {
        /// The rejected value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric environment variable could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidNumber {
        /// The environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
