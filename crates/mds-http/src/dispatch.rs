//! Handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use mds_auth::VerifiedClient;

use crate::body::MdsResponseBody;
use crate::error::MdsError;
use crate::router::MdsOperation;

/// Future returned by [`MdsHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<MdsResponseBody>, MdsError>> + Send>>;

/// Trait that the message acceptance logic must implement.
///
/// The handler receives an authenticated request whose body has already been
/// buffered and verified, together with the caller's identity. It is the
/// boundary between the HTTP transport layer and the business logic layer.
pub trait MdsHandler: Send + Sync + 'static {
    /// Handle a signed operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: MdsOperation,
        request: http::Request<Bytes>,
        client: VerifiedClient,
    ) -> HandlerFuture;
}

/// Dispatch an operation to the handler.
pub async fn dispatch_operation<H: MdsHandler>(
    handler: &H,
    op: MdsOperation,
    request: http::Request<Bytes>,
    client: VerifiedClient,
) -> Result<http::Response<MdsResponseBody>, MdsError> {
    tracing::debug!(operation = %op, client_id = %client.client_id, "dispatching operation");
    handler.handle_operation(op, request, client).await
}
