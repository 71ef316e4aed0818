//! Request router.
//!
//! The service exposes a small fixed route table:
//!
//! ```text
//! GET  /health     public
//! POST /v3/email   signed
//! POST /v3/sms     signed
//! ```
//!
//! Routing runs before authentication so that unknown paths are answered
//! with 404 regardless of the caller's credentials.

use std::fmt;

use crate::error::MdsError;

/// An operation exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MdsOperation {
    /// Liveness check.
    Health,
    /// Accept an email for delivery.
    SendEmail,
    /// Accept an SMS for delivery.
    SendSms,
}

impl MdsOperation {
    /// The operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::SendEmail => "SendEmail",
            Self::SendSms => "SendSms",
        }
    }

    /// Whether callers must sign requests for this operation.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Health)
    }
}

impl fmt::Display for MdsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ROUTES: &[(&str, http::Method, MdsOperation)] = &[
    ("/health", http::Method::GET, MdsOperation::Health),
    ("/v3/email", http::Method::POST, MdsOperation::SendEmail),
    ("/v3/sms", http::Method::POST, MdsOperation::SendSms),
];

/// Resolve the operation addressed by `method` and `path`.
pub fn resolve_operation(method: &http::Method, path: &str) -> Result<MdsOperation, MdsError> {
    let mut path_known = false;
    for (route, route_method, op) in ROUTES {
        if *route != path {
            continue;
        }
        if route_method == method {
            return Ok(*op);
        }
        path_known = true;
    }

    if path_known {
        Err(MdsError::method_not_allowed(method, path))
    } else {
        Err(MdsError::not_found(path))
    }
}
