//! Client-side request signing.
//!
//! [`RequestSigner`] stamps a request with the current time, builds the
//! canonical request over the exact body bytes that will be transmitted,
//! signs it with the client's Ed25519 key and emits three headers:
//!
//! ```text
//! X-Client-Id: <client id>
//! X-Timestamp: <RFC 3339, second precision, UTC>
//! Authorization: Signature <base64(signature)>
//! ```
//!
//! Signing must happen after the body is final. [`RequestSigner::sign_streaming`]
//! buffers a streaming body first and hands back a request whose body can be
//! read again by the transport.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::SecondsFormat;
use http::HeaderValue;
use http_body_util::BodyExt;
use tracing::debug;

use crate::canonical::build_canonical_request;
use crate::clock::{Clock, SystemClock};
use crate::error::SignerError;
use crate::keys::{PrivateKeyMaterial, parse_private_key};
use crate::{CLIENT_ID_HEADER, SIGNATURE_PREFIX, TIMESTAMP_HEADER};

/// The three header values that authenticate one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// Value of `X-Client-Id`.
    pub client_id: String,
    /// Value of `X-Timestamp`.
    pub timestamp: String,
    /// Standard base64 (padded) of the raw signature bytes.
    pub signature: String,
}

impl SignedEnvelope {
    /// The full `Authorization` header value.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{SIGNATURE_PREFIX}{}", self.signature)
    }

    /// Write the three headers, replacing any previous values.
    pub fn apply_to(&self, headers: &mut http::HeaderMap) -> Result<(), SignerError> {
        headers.insert(CLIENT_ID_HEADER, header_value(CLIENT_ID_HEADER, &self.client_id)?);
        headers.insert(TIMESTAMP_HEADER, header_value(TIMESTAMP_HEADER, &self.timestamp)?);
        headers.insert(
            http::header::AUTHORIZATION,
            header_value("authorization", &self.authorization())?,
        );
        Ok(())
    }
}

/// Signs outbound requests on behalf of one client.
///
/// # Examples
///
/// ```
/// use mds_auth::keys::PrivateKeyMaterial;
/// use mds_auth::signer::RequestSigner;
///
/// let signer = RequestSigner::new("svc-1", PrivateKeyMaterial::from_seed(&[1u8; 32])).unwrap();
/// let envelope = signer.sign("POST", "/v3/email", br#"{"a":1}"#);
/// assert_eq!(envelope.client_id, "svc-1");
/// assert!(envelope.authorization().starts_with("Signature "));
/// ```
#[derive(Clone)]
pub struct RequestSigner {
    client_id: String,
    key: PrivateKeyMaterial,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("client_id", &self.client_id)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Create a signer for `client_id` using the system clock.
    pub fn new(client_id: impl Into<String>, key: PrivateKeyMaterial) -> Result<Self, SignerError> {
        let client_id = client_id.into();
        if client_id.is_empty() || HeaderValue::from_str(&client_id).is_err() {
            return Err(SignerError::InvalidClientId(client_id));
        }

        Ok(Self {
            client_id,
            key,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a signer from an encoded private key (see [`parse_private_key`]).
    pub fn from_encoded_key(
        client_id: impl Into<String>,
        private_key: impl AsRef<[u8]>,
    ) -> Result<Self, SignerError> {
        let key = parse_private_key(private_key)?;
        Self::new(client_id, key)
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The client id this signer speaks for.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The private key used for signing.
    #[must_use]
    pub fn key(&self) -> &PrivateKeyMaterial {
        &self.key
    }

    /// Sign a request given its method, path (no query string) and final body.
    #[must_use]
    pub fn sign(&self, method: &str, path: &str, body: &[u8]) -> SignedEnvelope {
        let timestamp = self
            .clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let canonical = build_canonical_request(method, path, &timestamp, body);

        debug!(
            client_id = %self.client_id,
            canonical_request = %canonical,
            "Signing canonical request"
        );

        let signature = self.key.sign(canonical.as_bytes());

        SignedEnvelope {
            client_id: self.client_id.clone(),
            timestamp,
            signature: STANDARD.encode(signature),
        }
    }

    /// Sign a request with a buffered body and set its authentication headers.
    pub fn sign_request<B: AsRef<[u8]>>(
        &self,
        request: &mut http::Request<B>,
    ) -> Result<SignedEnvelope, SignerError> {
        let envelope = self.sign(
            request.method().as_str(),
            request.uri().path(),
            request.body().as_ref(),
        );
        envelope.apply_to(request.headers_mut())?;
        Ok(envelope)
    }

    /// Buffer a streaming body, sign the request, and return it with a
    /// re-readable body holding the same bytes.
    pub async fn sign_streaming<B>(
        &self,
        request: http::Request<B>,
    ) -> Result<http::Request<Bytes>, SignerError>
    where
        B: http_body::Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = request.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| SignerError::Body(e.to_string()))?
            .to_bytes();

        let mut request = http::Request::from_parts(parts, body);
        self.sign_request(&mut request)?;
        Ok(request)
    }
}

fn header_value(header: &'static str, value: &str) -> Result<HeaderValue, SignerError> {
    HeaderValue::from_str(value).map_err(|_| SignerError::InvalidHeaderValue { header })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use http_body_util::Full;

    use super::*;
    use crate::canonical::hash_payload;
    use crate::clock::FixedClock;

    const SEED: [u8; 32] = [3u8; 32];

    fn fixed_signer() -> RequestSigner {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        RequestSigner::new("svc-1", PrivateKeyMaterial::from_seed(&SEED))
            .unwrap()
            .with_clock(Arc::new(clock))
    }

    #[test]
    fn test_should_stamp_rfc3339_seconds_in_utc() {
        let envelope = fixed_signer().sign("POST", "/v3/email", b"{}");
        assert_eq!(envelope.timestamp, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_should_sign_canonical_request_over_body_digest() {
        let signer = fixed_signer();
        let body = br#"{"a":1}"#;
        let envelope = signer.sign("POST", "/v3/email", body);

        let canonical = format!(
            "POST\n/v3/email\n2024-01-01T00:00:00Z\n{}",
            hash_payload(body)
        );
        let signature = STANDARD.decode(&envelope.signature).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(
            signer
                .key()
                .public_key()
                .verify(canonical.as_bytes(), &signature)
        );
    }

    #[test]
    fn test_should_be_deterministic_for_same_inputs() {
        let signer = fixed_signer();
        let a = signer.sign("POST", "/v3/sms", b"body");
        let b = signer.sign("POST", "/v3/sms", b"body");
        assert_eq!(a, b);
    }

    #[test]
    fn test_should_reject_invalid_client_id() {
        let key = PrivateKeyMaterial::from_seed(&SEED);
        assert!(matches!(
            RequestSigner::new("", key.clone()),
            Err(SignerError::InvalidClientId(_))
        ));
        assert!(matches!(
            RequestSigner::new("svc\n1", key),
            Err(SignerError::InvalidClientId(_))
        ));
    }

    #[test]
    fn test_should_build_signer_from_encoded_key() {
        let encoded = STANDARD.encode(SEED);
        let signer = RequestSigner::from_encoded_key("svc-1", encoded).unwrap();
        assert_eq!(
            signer.key().public_key(),
            PrivateKeyMaterial::from_seed(&SEED).public_key()
        );
    }

    #[test]
    fn test_should_set_headers_on_request() {
        let signer = fixed_signer();
        let mut request = http::Request::builder()
            .method("POST")
            .uri("http://localhost:3000/v3/email?debug=1")
            .body(Bytes::from_static(br#"{"a":1}"#))
            .unwrap();

        let envelope = signer.sign_request(&mut request).unwrap();

        let headers = request.headers();
        assert_eq!(headers.get(CLIENT_ID_HEADER).unwrap(), "svc-1");
        assert_eq!(headers.get(TIMESTAMP_HEADER).unwrap(), "2024-01-01T00:00:00Z");
        assert_eq!(
            headers.get(http::header::AUTHORIZATION).unwrap(),
            envelope.authorization().as_str()
        );
        // The query string is not part of the signed path.
        assert_eq!(envelope, signer.sign("POST", "/v3/email", br#"{"a":1}"#));
    }

    #[tokio::test]
    async fn test_should_restore_streaming_body_after_signing() {
        let signer = fixed_signer();
        let request = http::Request::builder()
            .method("POST")
            .uri("/v3/sms")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let signed = signer.sign_streaming(request).await.unwrap();

        assert_eq!(signed.body().as_ref(), b"payload");
        assert_eq!(
            signed.headers().get(http::header::AUTHORIZATION).unwrap(),
            signer.sign("POST", "/v3/sms", b"payload").authorization().as_str()
        );
    }

    #[test]
    fn test_should_not_leak_key_in_debug_output() {
        let debug = format!("{:?}", fixed_signer());
        assert!(debug.contains("svc-1"));
        assert!(!debug.contains(&hex::encode(SEED)));
    }
}
