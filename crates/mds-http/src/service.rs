//! HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use hyper::body::Incoming;
use mds_auth::RequestVerifier;
use tracing::{debug, error};

use crate::auth::{DEFAULT_MAX_BODY_BYTES, verify_and_forward};
use crate::body::MdsResponseBody;
use crate::dispatch::{MdsHandler, dispatch_operation};
use crate::error::MdsError;
use crate::response::{CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response, json_response};
use crate::router::resolve_operation;

/// Value of the `server` response header.
pub const SERVER_NAME: &str = "mds";

/// Hyper `Service` implementation for the delivery API.
///
/// Routes incoming requests, answers `GET /health` itself, and passes signed
/// operations through [`verify_and_forward`] to the wrapped [`MdsHandler`].
pub struct MdsHttpService<H: MdsHandler> {
    handler: Arc<H>,
    verifier: Arc<RequestVerifier>,
    max_body_bytes: usize,
}

impl<H: MdsHandler> fmt::Debug for MdsHttpService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MdsHttpService")
            .field("verifier", &self.verifier)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl<H: MdsHandler> MdsHttpService<H> {
    /// Create a new `MdsHttpService`.
    pub fn new(handler: Arc<H>, verifier: RequestVerifier) -> Self {
        Self {
            handler,
            verifier: Arc::new(verifier),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Set the largest request body accepted on signed routes.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Handle one request without going through hyper's connection machinery.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<MdsResponseBody>
    where
        B: http_body::Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let response = process_request(req, self, &request_id).await;
        add_common_headers(response, &request_id)
    }
}

impl<H: MdsHandler> Clone for MdsHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            verifier: Arc::clone(&self.verifier),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl<H: MdsHandler> hyper::service::Service<http::Request<Incoming>> for MdsHttpService<H> {
    type Response = http::Response<MdsResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Process a single request through the full pipeline.
async fn process_request<B, H>(
    req: http::Request<B>,
    service: &MdsHttpService<H>,
    request_id: &str,
) -> http::Response<MdsResponseBody>
where
    B: http_body::Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
    H: MdsHandler,
{
    // 1. Route before authenticating.
    let op = match resolve_operation(req.method(), req.uri().path()) {
        Ok(op) => op,
        Err(err) => return error_to_response(&err, request_id),
    };
    debug!(operation = %op, request_id, "routed request");

    // 2. Public operations.
    if !op.requires_auth() {
        return match health_response() {
            Ok(response) => response,
            Err(err) => error_to_response(&err, request_id),
        };
    }

    // 3. Authenticate, then dispatch.
    let handler = service.handler.as_ref();
    let result = verify_and_forward(
        &service.verifier,
        req,
        service.max_body_bytes,
        |request, client| dispatch_operation(handler, op, request, client),
    )
    .await;

    match result {
        Ok(response) => response,
        Err(err) => {
            if err.is_server_error() {
                error!(operation = %op, request_id, error = %err, "request failed");
            }
            error_to_response(&err, request_id)
        }
    }
}

fn health_response() -> Result<http::Response<MdsResponseBody>, MdsError> {
    json_response(
        http::StatusCode::OK,
        &serde_json::json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }),
    )
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<MdsResponseBody>,
    request_id: &str,
) -> http::Response<MdsResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert("server", http::HeaderValue::from_static(SERVER_NAME));

    response
}
