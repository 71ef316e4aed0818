//! Authentication middleware.
//!
//! [`verify_and_forward`] sits between routing and the handler. Head checks
//! run before the body is touched, the body is then read exactly once (up to
//! a size limit), and the handler receives a request carrying the same
//! method, URI, headers and body bytes the signature was checked against.

use std::error::Error as StdError;
use std::future::Future;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use mds_auth::{AuthError, RequestVerifier, VerifiedClient};
use tracing::{error, warn};

use crate::body::MdsResponseBody;
use crate::error::{MdsError, MdsErrorCode};

/// Default cap on the request body read during verification.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Verify a signed request and return it with a re-readable body.
///
/// At most `max_body_bytes` of body are read; a larger body, whether
/// announced by `content-length` or discovered while reading, is rejected
/// with `PAYLOAD_TOO_LARGE`.
pub async fn authenticate<B>(
    verifier: &RequestVerifier,
    request: http::Request<B>,
    max_body_bytes: usize,
) -> Result<(http::Request<Bytes>, VerifiedClient), MdsError>
where
    B: http_body::Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = request.into_parts();

    let pending = verifier
        .authenticate_head(&parts)
        .map_err(|e| reject(&parts, e))?;

    if declared_length(&parts).is_some_and(|len| len > u64::try_from(max_body_bytes).unwrap_or(u64::MAX)) {
        warn!(
            client_id = %pending.client_id(),
            limit = max_body_bytes,
            "declared request body exceeds limit"
        );
        return Err(MdsError::payload_too_large(max_body_bytes));
    }

    let body = Limited::new(body, max_body_bytes)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                warn!(
                    client_id = %pending.client_id(),
                    limit = max_body_bytes,
                    "request body exceeds limit"
                );
                MdsError::payload_too_large(max_body_bytes)
            } else {
                warn!(client_id = %pending.client_id(), error = %e, "failed to read request body");
                MdsError::new(MdsErrorCode::BodyReadFailed)
            }
        })?
        .to_bytes();

    let client = pending
        .finish(&parts, &body)
        .map_err(|e| reject(&parts, e))?;

    Ok((http::Request::from_parts(parts, body), client))
}

/// Verify a signed request and, on success, pass it on to `next`.
///
/// On failure `next` is never called and the error describes the response
/// to send.
pub async fn verify_and_forward<B, F, Fut>(
    verifier: &RequestVerifier,
    request: http::Request<B>,
    max_body_bytes: usize,
    next: F,
) -> Result<http::Response<MdsResponseBody>, MdsError>
where
    B: http_body::Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
    F: FnOnce(http::Request<Bytes>, VerifiedClient) -> Fut,
    Fut: Future<Output = Result<http::Response<MdsResponseBody>, MdsError>>,
{
    let (request, client) = authenticate(verifier, request, max_body_bytes).await?;
    next(request, client).await
}

fn declared_length(parts: &http::request::Parts) -> Option<u64> {
    parts
        .headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn reject(parts: &http::request::Parts, err: AuthError) -> MdsError {
    if err.is_server_fault() {
        error!(
            method = %parts.method,
            path = %parts.uri.path(),
            error = %err,
            "rejecting request because of server misconfiguration"
        );
    } else {
        warn!(
            method = %parts.method,
            path = %parts.uri.path(),
            error = %err,
            "rejecting unauthenticated request"
        );
    }
    MdsError::from(err)
}
