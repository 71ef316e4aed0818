//! Caller-visible error type.
//!
//! Every rejected request is answered with
//!
//! ```json
//! { "success": false, "error": { "code": "SIGNATURE_MISMATCH", "message": "Signature verification failed" } }
//! ```
//!
//! where `code` is a stable machine-readable identifier and `message` is
//! meant for humans.

use std::fmt;

use mds_auth::AuthError;

/// Stable error codes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MdsErrorCode {
    /// Authentication headers absent or empty.
    MissingHeaders,
    /// `X-Timestamp` is not RFC 3339.
    MalformedTimestamp,
    /// `X-Timestamp` is outside the replay window.
    TimestampOutOfWindow,
    /// `X-Client-Id` is not registered.
    UnknownClient,
    /// The registered key for the caller is unusable.
    MisconfiguredServiceKey,
    /// `Authorization` lacks the `Signature ` prefix.
    MalformedAuthHeader,
    /// The signature is not base64.
    InvalidSignatureEncoding,
    /// The signature does not verify.
    SignatureMismatch,
    /// No route for the path.
    NotFound,
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// The request body could not be read.
    BodyReadFailed,
    /// The request body exceeds the configured limit.
    PayloadTooLarge,
    /// The request body is not a valid message.
    InvalidBody,
    /// The message has no recipients.
    NoRecipients,
    /// The message could not be handed to the delivery backend.
    DeliveryFailed,
    /// Unexpected server failure.
    InternalError,
}

impl MdsErrorCode {
    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeaders => "MISSING_HEADERS",
            Self::MalformedTimestamp => "MALFORMED_TIMESTAMP",
            Self::TimestampOutOfWindow => "TIMESTAMP_OUT_OF_WINDOW",
            Self::UnknownClient => "UNKNOWN_CLIENT",
            Self::MisconfiguredServiceKey => "MISCONFIGURED_SERVICE_KEY",
            Self::MalformedAuthHeader => "MALFORMED_AUTH_HEADER",
            Self::InvalidSignatureEncoding => "INVALID_SIGNATURE_ENCODING",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::BodyReadFailed => "BODY_READ_FAILED",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::InvalidBody => "INVALID_BODY",
            Self::NoRecipients => "NO_RECIPIENTS",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// The HTTP status for this code.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::MissingHeaders
            | Self::TimestampOutOfWindow
            | Self::UnknownClient
            | Self::MalformedAuthHeader
            | Self::InvalidSignatureEncoding
            | Self::SignatureMismatch => http::StatusCode::UNAUTHORIZED,
            Self::MalformedTimestamp
            | Self::BodyReadFailed
            | Self::InvalidBody
            | Self::NoRecipients => http::StatusCode::BAD_REQUEST,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::MisconfiguredServiceKey | Self::DeliveryFailed | Self::InternalError => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The default human-readable message.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::MissingHeaders => "Missing authentication headers",
            Self::MalformedTimestamp => "Invalid timestamp format",
            Self::TimestampOutOfWindow => "Request timestamp expired or in the future",
            Self::UnknownClient => "Unknown Client ID",
            Self::MisconfiguredServiceKey => "Service public key is misconfigured",
            Self::MalformedAuthHeader => "Invalid Authorization header format",
            Self::InvalidSignatureEncoding => "Invalid signature encoding",
            Self::SignatureMismatch => "Signature verification failed",
            Self::NotFound => "Not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::BodyReadFailed => "Failed to read request body",
            Self::PayloadTooLarge => "Request body too large",
            Self::InvalidBody => "Invalid request body",
            Self::NoRecipients => "No recipients specified",
            Self::DeliveryFailed => "Message delivery failed",
            Self::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for MdsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error response.
#[derive(Debug)]
pub struct MdsError {
    /// The error code.
    pub code: MdsErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for MdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MdsError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for MdsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl MdsError {
    /// Create an error with the code's default status and message.
    #[must_use]
    pub fn new(code: MdsErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: MdsErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether this error is the server's fault.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code.is_server_error()
    }

    /// No route for the path.
    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::with_message(MdsErrorCode::NotFound, format!("No route for {path}"))
    }

    /// The path exists but not for this method.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            MdsErrorCode::MethodNotAllowed,
            format!("Method {method} is not allowed on {path}"),
        )
    }

    /// The request body is longer than `limit` bytes.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self::with_message(
            MdsErrorCode::PayloadTooLarge,
            format!("Request body exceeds {limit} bytes"),
        )
    }

    /// The request body is not a valid message.
    #[must_use]
    pub fn invalid_body() -> Self {
        Self::new(MdsErrorCode::InvalidBody)
    }

    /// The message has no recipients.
    #[must_use]
    pub fn no_recipients() -> Self {
        Self::new(MdsErrorCode::NoRecipients)
    }

    /// The delivery backend refused the message.
    #[must_use]
    pub fn delivery_failed(message: impl Into<String>) -> Self {
        Self::with_message(MdsErrorCode::DeliveryFailed, message)
    }

    /// Unexpected server failure.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(MdsErrorCode::InternalError, message)
    }
}

impl From<AuthError> for MdsError {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::MissingHeaders => MdsErrorCode::MissingHeaders,
            AuthError::MalformedTimestamp(_) => MdsErrorCode::MalformedTimestamp,
            AuthError::ExpiredOrFutureTimestamp { .. } => MdsErrorCode::TimestampOutOfWindow,
            AuthError::UnknownClient(_) => MdsErrorCode::UnknownClient,
            AuthError::MisconfiguredServiceKey { .. } => MdsErrorCode::MisconfiguredServiceKey,
            AuthError::MalformedAuthHeader => MdsErrorCode::MalformedAuthHeader,
            AuthError::InvalidSignatureEncoding => MdsErrorCode::InvalidSignatureEncoding,
            AuthError::SignatureMismatch => MdsErrorCode::SignatureMismatch,
        };
        // Callers only see the fixed message; details stay in the source.
        Self::new(code).with_source(err)
    }
}
