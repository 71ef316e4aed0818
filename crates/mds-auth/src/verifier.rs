//! Server-side request verification.
//!
//! Verification is a strictly linear pipeline that stops at the first
//! failure:
//!
//! 1. extract `X-Client-Id`, `X-Timestamp` and `Authorization`
//! 2. parse the timestamp and enforce the replay window
//! 3. resolve the client in the [`ServiceRegistry`]
//! 4. parse the registered public key
//! 5. rebuild the canonical request from the buffered body
//! 6. parse the `Signature <base64>` header value
//! 7. verify the signature
//!
//! Steps 1 to 4 only need the request head and run in
//! [`RequestVerifier::authenticate_head`], which lets the HTTP layer reject a
//! request before reading its body. The returned [`PendingVerification`] owns
//! everything steps 5 to 7 need, so a registry reload happening while the
//! body is read has no effect on the outcome.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use http::request::Parts;
use tracing::debug;

use crate::canonical::build_canonical_request;
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::keys::PublicKeyMaterial;
use crate::registry::{ServiceIdentity, ServiceRegistry};
use crate::{CLIENT_ID_HEADER, SIGNATURE_PREFIX, TIMESTAMP_HEADER};

/// Maximum accepted distance between a request timestamp and the current time.
pub const DEFAULT_MAX_SKEW_SECS: i64 = 300;

/// The authenticated caller of a verified request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClient {
    /// Client id from `X-Client-Id`.
    pub client_id: String,
    /// Display name from the registry, if any.
    pub name: Option<String>,
    /// The validated request timestamp.
    pub signed_at: DateTime<Utc>,
}

/// Verifies signed requests against a service registry.
#[derive(Clone)]
pub struct RequestVerifier {
    registry: Arc<dyn ServiceRegistry>,
    clock: Arc<dyn Clock>,
    max_skew: TimeDelta,
}

impl fmt::Debug for RequestVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestVerifier")
            .field("max_skew", &self.max_skew)
            .finish_non_exhaustive()
    }
}

impl RequestVerifier {
    /// Create a verifier backed by `registry`, using the system clock.
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            registry,
            clock: Arc::new(SystemClock),
            max_skew: TimeDelta::seconds(DEFAULT_MAX_SKEW_SECS),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the head-only steps: headers, replay window, identity and key.
    pub fn authenticate_head(&self, parts: &Parts) -> Result<PendingVerification, AuthError> {
        let client_id = header_str(parts, CLIENT_ID_HEADER);
        let timestamp = header_str(parts, TIMESTAMP_HEADER);
        let authorization = header_str(parts, http::header::AUTHORIZATION.as_str());

        let (Some(client_id), Some(timestamp), Some(authorization)) =
            (client_id, timestamp, authorization)
        else {
            debug!("Rejecting request without authentication headers");
            return Err(AuthError::MissingHeaders);
        };

        let signed_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| AuthError::MalformedTimestamp(e.to_string()))?
            .with_timezone(&Utc);

        let delta = self.clock.now() - signed_at;
        if delta > self.max_skew || delta < -self.max_skew {
            debug!(
                client_id,
                timestamp,
                skew_secs = delta.num_seconds(),
                "Timestamp outside window"
            );
            return Err(AuthError::ExpiredOrFutureTimestamp {
                skew_secs: delta.num_seconds(),
            });
        }

        let identity = self
            .registry
            .lookup(client_id)
            .ok_or_else(|| AuthError::UnknownClient(client_id.to_owned()))?;

        let public_key =
            identity
                .parse_public_key()
                .map_err(|source| AuthError::MisconfiguredServiceKey {
                    client_id: client_id.to_owned(),
                    source,
                })?;

        debug!(
            client_id,
            key_fingerprint = %public_key.fingerprint(),
            "Resolved service identity"
        );

        Ok(PendingVerification {
            identity,
            public_key,
            timestamp: timestamp.to_owned(),
            signed_at,
            authorization: authorization.to_owned(),
        })
    }

    /// Run the whole pipeline over a request head and its buffered body.
    pub fn verify(&self, parts: &Parts, body: &[u8]) -> Result<VerifiedClient, AuthError> {
        self.authenticate_head(parts)?.finish(parts, body)
    }
}

/// A request whose head passed verification and whose signature is still
/// to be checked.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    identity: Arc<ServiceIdentity>,
    public_key: PublicKeyMaterial,
    timestamp: String,
    signed_at: DateTime<Utc>,
    authorization: String,
}

impl PendingVerification {
    /// The claimed client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.identity.client_id
    }

    /// Rebuild the canonical request over `body` and check the signature.
    pub fn finish(self, parts: &Parts, body: &[u8]) -> Result<VerifiedClient, AuthError> {
        let canonical = build_canonical_request(
            parts.method.as_str(),
            parts.uri.path(),
            &self.timestamp,
            body,
        );
        debug!(
            client_id = %self.identity.client_id,
            canonical_request = %canonical,
            "Rebuilt canonical request"
        );

        let encoded = self
            .authorization
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(AuthError::MalformedAuthHeader)?;
        let signature = STANDARD
            .decode(encoded)
            .map_err(|_| AuthError::InvalidSignatureEncoding)?;

        if !self.public_key.verify(canonical.as_bytes(), &signature) {
            return Err(AuthError::SignatureMismatch);
        }

        Ok(VerifiedClient {
            client_id: self.identity.client_id.clone(),
            name: self.identity.name.clone(),
            signed_at: self.signed_at,
        })
    }
}

/// A header's value, or `None` when it is absent, empty or not visible ASCII.
fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
