//! Signing HTTP client for the message delivery service.
//!
//! [`Client`] serializes each message once, signs exactly those bytes with the
//! caller's Ed25519 key and sends them. The private key may be given in any
//! encoding accepted by [`mds_auth::parse_private_key`].
//!
//! ```no_run
//! # async fn run() -> Result<(), mds_client::ClientError> {
//! let client = mds_client::Client::new(
//!     "http://localhost:3000",
//!     "svc-1",
//!     std::env::var("MDS_PRIVATE_KEY").unwrap_or_default(),
//! )?;
//! let accepted = client
//!     .send_email(&serde_json::json!({
//!         "from": {"address": "support@example.com"},
//!         "to": "user@example.com",
//!         "subject": "Hello",
//!         "content": {"body": "Hi there"},
//!     }))
//!     .await?;
//! println!("{}", accepted.message);
//! # Ok(())
//! # }
//! ```

mod error;

use mds_auth::{CLIENT_ID_HEADER, RequestSigner, TIMESTAMP_HEADER};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::error::ClientError;

/// Path of the email endpoint.
pub const EMAIL_PATH: &str = "/v3/email";
/// Path of the SMS endpoint.
pub const SMS_PATH: &str = "/v3/sms";

/// Body of a `202 Accepted` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
    /// Human readable confirmation.
    pub message: String,
    /// Id assigned to the accepted message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Body of an error answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Code and message of an error answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` when the service is up.
    pub status: String,
    /// Server time.
    pub timestamp: String,
}

/// A client that signs every request it sends.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    signer: RequestSigner,
}

impl Client {
    /// Create a client for `client_id`, parsing `private_key` from any
    /// supported encoding.
    pub fn new(
        server_url: &str,
        client_id: impl Into<String>,
        private_key: impl AsRef<[u8]>,
    ) -> Result<Self, ClientError> {
        let signer = RequestSigner::from_encoded_key(client_id, private_key)?;
        Self::with_signer(server_url, signer)
    }

    /// Create a client around an existing signer.
    pub fn with_signer(server_url: &str, signer: RequestSigner) -> Result<Self, ClientError> {
        let base_url = Url::parse(server_url.trim_end_matches('/')).map_err(|e| {
            ClientError::InvalidUrl {
                url: server_url.to_owned(),
                reason: e.to_string(),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: server_url.to_owned(),
                reason: "not an http(s) base URL".to_owned(),
            });
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            signer,
        })
    }

    /// The client id requests are signed for.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.signer.client_id()
    }

    /// Submit an email for delivery.
    pub async fn send_email<T: Serialize + ?Sized>(
        &self,
        email: &T,
    ) -> Result<SuccessResponse, ClientError> {
        self.post_signed(EMAIL_PATH, email).await
    }

    /// Submit an SMS for delivery.
    pub async fn send_sms<T: Serialize + ?Sized>(
        &self,
        sms: &T,
    ) -> Result<SuccessResponse, ClientError> {
        self.post_signed(SMS_PATH, sms).await
    }

    /// Query the unauthenticated health endpoint.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.endpoint("/health");
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        if status != 200 {
            return Err(error_from_body(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_signed<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<SuccessResponse, ClientError> {
        let body = serde_json::to_vec(payload)?;
        let url = self.endpoint(path);
        let envelope = self.signer.sign("POST", url.path(), &body);

        debug!(client_id = %envelope.client_id, url = %url, "sending signed request");

        let response = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .header(CLIENT_ID_HEADER, &envelope.client_id)
            .header(TIMESTAMP_HEADER, &envelope.timestamp)
            .header("authorization", envelope.authorization())
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        interpret_response(status, &bytes)
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{path}", self.base_url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url
    }
}

/// Turn a raw answer into the typed outcome.
fn interpret_response(status: u16, body: &[u8]) -> Result<SuccessResponse, ClientError> {
    if status == 202 {
        return Ok(
            serde_json::from_slice(body).unwrap_or_else(|_| SuccessResponse {
                success: true,
                message: "Accepted".to_owned(),
                id: None,
            }),
        );
    }
    Err(error_from_body(status, body))
}

fn error_from_body(status: u16, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(err) if !err.success && !err.error.code.is_empty() => ClientError::Api {
            status,
            code: err.error.code,
            message: err.error.message,
        },
        _ => ClientError::UnexpectedStatus { status },
    }
}
