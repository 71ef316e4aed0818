//! Error types for key parsing, signing and request verification.
//!
//! [`AuthError`] represents every way the verification pipeline can reject a
//! request. The pipeline stops at the first failure, so exactly one variant is
//! reported per request.

/// Errors produced while parsing private or public key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The input is not a recognized encoding of an Ed25519 key.
    #[error("unsupported key format: {0}")]
    UnsupportedKeyFormat(String),
}

impl KeyError {
    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedKeyFormat(reason.into())
    }
}

/// Errors that can occur while verifying a signed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// One of `X-Client-Id`, `X-Timestamp` or `Authorization` is absent or empty.
    #[error("Missing authentication headers")]
    MissingHeaders,

    /// `X-Timestamp` is not a valid RFC 3339 timestamp.
    #[error("Invalid timestamp format: {0}")]
    MalformedTimestamp(String),

    /// The timestamp lies outside the accepted window around the current time.
    #[error("Request timestamp expired or in the future (skew {skew_secs}s)")]
    ExpiredOrFutureTimestamp {
        /// Signed distance `now - timestamp`, in seconds.
        skew_secs: i64,
    },

    /// The client id is not present in the service registry.
    #[error("Unknown Client ID: {0}")]
    UnknownClient(String),

    /// The registered public key for a known client cannot be parsed.
    #[error("Service public key is misconfigured for {client_id}: {source}")]
    MisconfiguredServiceKey {
        /// The client whose registry entry is broken.
        client_id: String,
        /// Why the stored key was rejected.
        #[source]
        source: KeyError,
    },

    /// The `Authorization` header does not start with `Signature `.
    #[error("Invalid Authorization header format")]
    MalformedAuthHeader,

    /// The signature is not valid standard base64.
    #[error("Invalid signature encoding")]
    InvalidSignatureEncoding,

    /// The signature does not match the canonical request.
    #[error("Signature verification failed")]
    SignatureMismatch,
}

/// Errors produced on the signing side.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The private key could not be parsed.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The client id cannot be carried in an HTTP header.
    #[error("client id is not a valid header value: {0:?}")]
    InvalidClientId(String),

    /// A computed header value was rejected by the HTTP layer.
    #[error("invalid {header} header value")]
    InvalidHeaderValue {
        /// The header being set.
        header: &'static str,
    },

    /// A streaming body could not be buffered for signing.
    #[error("failed to read request body: {0}")]
    Body(String),
}

impl AuthError {
    /// Whether this failure is caused by server configuration rather than by the caller.
    #[must_use]
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::MisconfiguredServiceKey { .. })
    }
}
