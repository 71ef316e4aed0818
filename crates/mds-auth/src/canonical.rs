//! Canonical request construction.
//!
//! The signed material is a newline-separated string of four components:
//!
//! ```text
//! HTTPRequestMethod\n
//! Path\n
//! X-Timestamp value\n
//! hex(SHA256(body))
//! ```
//!
//! Signer and verifier call [`build_canonical_request`] with identical inputs,
//! so the serialization is a plain concatenation with no normalization. The
//! path is the request-target path only: no query string, no scheme or host.

use std::fmt;

use sha2::{Digest, Sha256};

/// The fields that are authenticated by a request signature.
///
/// A `CanonicalRequest` is derived on demand and never stored. Its
/// [`Display`](fmt::Display) output and [`as_bytes`](Self::as_bytes) are the
/// exact byte string that gets signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    path: String,
    timestamp: String,
    body_digest: [u8; 32],
    serialized: String,
}

impl CanonicalRequest {
    /// The upper-case HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path, without query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The timestamp exactly as transmitted in `X-Timestamp`.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The raw SHA-256 digest of the body.
    #[must_use]
    pub fn body_digest(&self) -> &[u8; 32] {
        &self.body_digest
    }

    /// The serialized canonical string as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.serialized.as_bytes()
    }

    /// The serialized canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.serialized
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

/// Build the canonical request for a method, path, timestamp and body.
///
/// # Examples
///
/// ```
/// use mds_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request("GET", "/health", "2024-01-01T00:00:00Z", b"");
/// assert_eq!(
///     canonical.as_str(),
///     "GET\n/health\n2024-01-01T00:00:00Z\n\
///      e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    path: &str,
    timestamp: &str,
    body: &[u8],
) -> CanonicalRequest {
    let digest = Sha256::digest(body);
    let mut body_digest = [0u8; 32];
    body_digest.copy_from_slice(digest.as_ref());
    let body_hash = hex::encode(body_digest);

    CanonicalRequest {
        method: method.to_owned(),
        path: path.to_owned(),
        timestamp: timestamp.to_owned(),
        body_digest,
        serialized: format!("{method}\n{path}\n{timestamp}\n{body_hash}"),
    }
}

/// Compute the lowercase hex SHA-256 of a payload.
///
/// # Examples
///
/// ```
/// use mds_auth::canonical::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
