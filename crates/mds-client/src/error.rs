//! Client error types.

use mds_auth::SignerError;

/// Errors returned by [`Client`](crate::Client).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The private key or client id could not be used for signing.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// The server URL is not usable.
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request could not be sent or the response not read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the request.
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Stable error code.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// The service answered with an unexpected status and no error body.
    #[error("API error: HTTP {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },
}
