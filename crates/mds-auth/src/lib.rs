//! Ed25519 request signing and verification for the message delivery service.
//!
//! Every call from an API caller to the delivery service is signed with the
//! caller's Ed25519 private key and verified by the service against the public
//! key registered for that caller. Both sides build the same canonical request
//! from the HTTP method, path, timestamp and a SHA-256 digest of the body.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mds_auth::keys::PrivateKeyMaterial;
//! use mds_auth::registry::{RegistrySnapshot, ServiceIdentity, SharedServiceRegistry};
//! use mds_auth::signer::RequestSigner;
//! use mds_auth::verifier::RequestVerifier;
//!
//! let key = PrivateKeyMaterial::from_seed(&[7u8; 32]);
//! let registry = Arc::new(SharedServiceRegistry::new(RegistrySnapshot::new(vec![
//!     ServiceIdentity::new("svc-1", key.public_key().to_base64()),
//! ])));
//!
//! // Client side: sign the final body bytes.
//! let signer = RequestSigner::new("svc-1", key).unwrap();
//! let mut request = http::Request::post("/v3/email").body(b"{}".to_vec()).unwrap();
//! signer.sign_request(&mut request).unwrap();
//!
//! // Server side: verify the head and the same bytes.
//! let (parts, body) = request.into_parts();
//! let client = RequestVerifier::new(registry).verify(&parts, &body).unwrap();
//! assert_eq!(client.client_id, "svc-1");
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction
//! - [`clock`] - Injectable time source
//! - [`error`] - Key, signing and verification error types
//! - [`keys`] - Key material parsing from raw, base64, PEM and OpenSSH encodings
//! - [`registry`] - Service registry with copy-on-write reload
//! - [`signer`] - Client-side request signing
//! - [`verifier`] - Server-side verification pipeline

pub mod canonical;
pub mod clock;
pub mod error;
pub mod keys;
pub mod registry;
pub mod signer;
pub mod verifier;

pub use canonical::{CanonicalRequest, build_canonical_request, hash_payload};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AuthError, KeyError, SignerError};
pub use keys::{PrivateKeyMaterial, PublicKeyMaterial, parse_private_key, parse_public_key};
pub use registry::{RegistrySnapshot, ServiceIdentity, ServiceRegistry, SharedServiceRegistry};
pub use signer::{RequestSigner, SignedEnvelope};
pub use verifier::{PendingVerification, RequestVerifier, VerifiedClient};

/// Header carrying the caller's client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Header carrying the RFC 3339 signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Prefix of the `Authorization` header value.
pub const SIGNATURE_PREFIX: &str = "Signature ";
