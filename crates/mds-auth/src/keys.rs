//! Ed25519 key material parsing.
//!
//! Operators provision keys in whatever encoding their tooling produces, so
//! both parsers accept several representations of the same logical key:
//!
//! | Direction | Accepted encodings |
//! |-----------|--------------------|
//! | Private   | raw 64-byte keypair, raw 32-byte seed, PKCS#8 PEM, OpenSSH private key |
//! | Public    | raw 32-byte key, OpenSSH `authorized_keys` line, PKIX (SPKI) PEM |
//!
//! Any of these may additionally be wrapped in standard base64.
//!
//! Detection is an ordered list of pure strategies. The whole input is first
//! base64-decoded (falling back to the raw bytes when that fails). If the
//! result looks like text key material (a PEM `BEGIN` marker or an
//! `ssh-ed25519` tag) the text strategies are tried in order and the first
//! success wins. Otherwise the bytes are interpreted by length. Parsing never
//! touches global state and performs no I/O.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{
    KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, Signature, Signer, SigningKey, Verifier,
    VerifyingKey,
};
use ssh_key::private::KeypairData;
use ssh_key::public::KeyData;
use tracing::debug;

use crate::error::KeyError;

/// Marker that identifies PEM-armored key text.
const PEM_MARKER: &[u8] = b"BEGIN";

/// Marker that identifies an OpenSSH Ed25519 public key line.
const OPENSSH_ED25519_TAG: &[u8] = b"ssh-ed25519";

/// A named text parsing strategy.
type TextStrategy<K> = (&'static str, fn(&str) -> Result<K, KeyError>);

/// Private key text strategies, in priority order.
const PRIVATE_TEXT_STRATEGIES: &[TextStrategy<SigningKey>] = &[
    ("openssh", parse_openssh_private_key),
    ("pkcs8-pem", parse_pkcs8_private_key),
];

/// Public key text strategies, in priority order.
const PUBLIC_TEXT_STRATEGIES: &[TextStrategy<VerifyingKey>] = &[
    ("openssh", parse_openssh_public_key),
    ("pkix-pem", parse_pkix_public_key),
];

/// An Ed25519 signing keypair.
///
/// Immutable after construction. The `Debug` output never includes key bytes.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    signing_key: SigningKey,
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("public_key", &self.public_key().fingerprint())
            .field("signing_key", &"***")
            .finish()
    }
}

impl PrivateKeyMaterial {
    /// Expand a 32-byte seed into a keypair.
    #[must_use]
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The verification half of this keypair.
    #[must_use]
    pub fn public_key(&self) -> PublicKeyMaterial {
        PublicKeyMaterial {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Sign a message, returning the raw 64-byte signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// An Ed25519 verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    verifying_key: VerifyingKey,
}

impl PublicKeyMaterial {
    /// Create a verification key from its 32-byte compressed form.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self, KeyError> {
        let verifying_key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| KeyError::unsupported(format!("invalid Ed25519 public key: {e}")))?;
        Ok(Self { verifying_key })
    }

    /// The 32-byte compressed form of this key.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.verifying_key.to_bytes()
    }

    /// Standard base64 of the raw key, the simplest registrable encoding.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// A short fingerprint (first 8 bytes, hex) for log lines.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.to_bytes()[..8])
    }

    /// Check a raw signature over `message`.
    ///
    /// Signatures of the wrong length are treated as not matching.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.verifying_key.verify(message, &signature).is_ok()
    }
}

/// Parse a private key from any supported encoding.
///
/// # Examples
///
/// ```
/// use mds_auth::keys::parse_private_key;
///
/// // Base64 of a 32-byte seed.
/// let key = parse_private_key("AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=").unwrap();
/// assert_eq!(key.public_key().to_bytes().len(), 32);
/// ```
pub fn parse_private_key(input: impl AsRef<[u8]>) -> Result<PrivateKeyMaterial, KeyError> {
    let bytes = decode_outer_layer(input.as_ref());

    let signing_key = if looks_like_key_text(&bytes) {
        run_text_strategies(&bytes, PRIVATE_TEXT_STRATEGIES)?
    } else {
        match bytes.len() {
            KEYPAIR_LENGTH => {
                let mut keypair = [0u8; KEYPAIR_LENGTH];
                keypair.copy_from_slice(&bytes);
                SigningKey::from_keypair_bytes(&keypair).map_err(|e| {
                    KeyError::unsupported(format!("invalid 64-byte Ed25519 keypair: {e}"))
                })?
            }
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(&bytes);
                SigningKey::from_bytes(&seed)
            }
            n => {
                return Err(KeyError::unsupported(format!(
                    "invalid private key size: expected {SECRET_KEY_LENGTH} (seed), \
                     {KEYPAIR_LENGTH} (keypair), or PEM/OpenSSH text, got {n} bytes"
                )));
            }
        }
    };

    Ok(PrivateKeyMaterial { signing_key })
}

/// Parse a public key from any supported encoding.
///
/// # Examples
///
/// ```
/// use mds_auth::keys::{parse_private_key, parse_public_key};
///
/// let private = parse_private_key("AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=").unwrap();
/// let public = parse_public_key(private.public_key().to_base64()).unwrap();
/// assert_eq!(public, private.public_key());
/// ```
pub fn parse_public_key(input: impl AsRef<[u8]>) -> Result<PublicKeyMaterial, KeyError> {
    let bytes = decode_outer_layer(input.as_ref());

    if looks_like_key_text(&bytes) {
        let verifying_key = run_text_strategies(&bytes, PUBLIC_TEXT_STRATEGIES)?;
        return Ok(PublicKeyMaterial { verifying_key });
    }

    let raw: &[u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        KeyError::unsupported(format!(
            "invalid public key size: expected {PUBLIC_KEY_LENGTH} bytes or PEM/OpenSSH text, \
             got {} bytes",
            bytes.len()
        ))
    })?;
    PublicKeyMaterial::from_bytes(raw)
}

/// Strip an optional base64 wrapper.
///
/// Surrounding whitespace is ignored for the base64 attempt only; when the
/// input is not base64 the original bytes are returned untouched so that raw
/// binary keys are never altered.
fn decode_outer_layer(input: &[u8]) -> Vec<u8> {
    match STANDARD.decode(input.trim_ascii()) {
        Ok(decoded) => decoded,
        Err(_) => input.to_vec(),
    }
}

fn looks_like_key_text(bytes: &[u8]) -> bool {
    contains(bytes, PEM_MARKER) || contains(bytes, OPENSSH_ED25519_TAG)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Try each strategy in order, returning the first success.
fn run_text_strategies<K>(bytes: &[u8], strategies: &[TextStrategy<K>]) -> Result<K, KeyError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| KeyError::unsupported("key text is not valid UTF-8"))?
        .trim();

    let mut failures = Vec::with_capacity(strategies.len());
    for (name, parse) in strategies {
        match parse(text) {
            Ok(key) => {
                debug!(format = name, "parsed key text");
                return Ok(key);
            }
            Err(KeyError::UnsupportedKeyFormat(reason)) => {
                failures.push(format!("{name}: {reason}"));
            }
        }
    }

    Err(KeyError::unsupported(failures.join("; ")))
}

fn parse_openssh_private_key(text: &str) -> Result<SigningKey, KeyError> {
    let key = ssh_key::PrivateKey::from_openssh(text)
        .map_err(|e| KeyError::unsupported(e.to_string()))?;
    if key.is_encrypted() {
        return Err(KeyError::unsupported("encrypted OpenSSH keys are not supported"));
    }

    let KeypairData::Ed25519(keypair) = key.key_data() else {
        return Err(KeyError::unsupported("OpenSSH key is not an Ed25519 key"));
    };

    let signing_key = SigningKey::from_bytes(&keypair.private.to_bytes());
    if signing_key.verifying_key().to_bytes() != keypair.public.0 {
        return Err(KeyError::unsupported(
            "OpenSSH public half does not match the private seed",
        ));
    }
    Ok(signing_key)
}

fn parse_pkcs8_private_key(text: &str) -> Result<SigningKey, KeyError> {
    SigningKey::from_pkcs8_pem(text).map_err(|e| KeyError::unsupported(e.to_string()))
}

fn parse_openssh_public_key(text: &str) -> Result<VerifyingKey, KeyError> {
    // Only the first key line counts; authorized_keys files may carry comments.
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .ok_or_else(|| KeyError::unsupported("no OpenSSH key line found"))?;

    let key = ssh_key::PublicKey::from_openssh(line)
        .map_err(|e| KeyError::unsupported(e.to_string()))?;
    let KeyData::Ed25519(public) = key.key_data() else {
        return Err(KeyError::unsupported("OpenSSH key is not an Ed25519 key"));
    };

    VerifyingKey::from_bytes(&public.0)
        .map_err(|e| KeyError::unsupported(format!("invalid Ed25519 public key: {e}")))
}

fn parse_pkix_public_key(text: &str) -> Result<VerifyingKey, KeyError> {
    VerifyingKey::from_public_key_pem(text).map_err(|e| KeyError::unsupported(e.to_string()))
}
