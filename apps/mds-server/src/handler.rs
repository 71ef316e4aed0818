//! Message acceptance behind the authentication middleware.

use std::sync::Arc;

use bytes::Bytes;
use mds_auth::VerifiedClient;
use mds_http::response::json_response;
use mds_http::{HandlerFuture, MdsError, MdsHandler, MdsOperation, MdsResponseBody};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::message::{EmailRequest, SmsRequest, email_recipients, sms_recipients};
use crate::outbox::{OutboundMessage, Outbox};

/// Body of a `202 Accepted` answer.
#[derive(Debug, Clone, Serialize)]
pub struct Accepted {
    /// Always `true`.
    pub success: bool,
    /// Human readable confirmation.
    pub message: &'static str,
    /// Id assigned to the message.
    pub id: String,
}

/// Handler that validates messages and hands them to an [`Outbox`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::Bytes;
/// use chrono::Utc;
/// use mds_auth::VerifiedClient;
/// use mds_http::{MdsHandler, MdsOperation};
/// use mds_server::{DeliveryHandler, MemoryOutbox};
///
/// # tokio_test::block_on(async {
/// let outbox = Arc::new(MemoryOutbox::default());
/// let handler = DeliveryHandler::new(Arc::clone(&outbox));
/// let client = VerifiedClient {
///     client_id: "svc-1".to_owned(),
///     name: None,
///     signed_at: Utc::now(),
/// };
/// let body = Bytes::from_static(br#"{"to": "+46700000000", "content": {"body": "hi"}}"#);
///
/// let response = handler
///     .handle_operation(MdsOperation::SendSms, http::Request::new(body), client)
///     .await
///     .unwrap();
/// assert_eq!(response.status(), http::StatusCode::ACCEPTED);
/// assert_eq!(outbox.messages().len(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct DeliveryHandler<O: Outbox> {
    outbox: Arc<O>,
}

impl<O: Outbox> DeliveryHandler<O> {
    /// Create a handler submitting to `outbox`.
    pub fn new(outbox: Arc<O>) -> Self {
        Self { outbox }
    }
}

impl<O: Outbox> MdsHandler for DeliveryHandler<O> {
    fn handle_operation(
        &self,
        op: MdsOperation,
        request: http::Request<Bytes>,
        client: VerifiedClient,
    ) -> HandlerFuture {
        let outbox = Arc::clone(&self.outbox);
        Box::pin(async move {
            let body = request.into_body();
            match op {
                MdsOperation::SendEmail => accept_email(outbox.as_ref(), &client, &body),
                MdsOperation::SendSms => accept_sms(outbox.as_ref(), &client, &body),
                MdsOperation::Health => Err(MdsError::internal_error(
                    "health checks are answered by the service",
                )),
            }
        })
    }
}

fn accept_email<O: Outbox>(
    outbox: &O,
    client: &VerifiedClient,
    body: &[u8],
) -> Result<http::Response<MdsResponseBody>, MdsError> {
    let req: EmailRequest = parse_body(body)?;

    let to = email_recipients(&req.to);
    if to.is_empty() {
        debug!(client_id = %client.client_id, "email without recipients");
        return Err(MdsError::no_recipients());
    }

    let (text, is_html) = req.content.map(|c| c.render()).unwrap_or_default();
    let message = OutboundMessage::Email {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: client.client_id.clone(),
        from: req.from.address,
        to,
        subject: req.subject,
        body: text,
        is_html,
    };

    submit(outbox, message, "Email accepted for delivery")
}

fn accept_sms<O: Outbox>(
    outbox: &O,
    client: &VerifiedClient,
    body: &[u8],
) -> Result<http::Response<MdsResponseBody>, MdsError> {
    let req: SmsRequest = parse_body(body)?;

    let to = sms_recipients(&req.to);
    if to.is_empty() {
        debug!(client_id = %client.client_id, "sms without recipients");
        return Err(MdsError::no_recipients());
    }

    let (text, _) = req.content.map(|c| c.render()).unwrap_or_default();
    let message = OutboundMessage::Sms {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: client.client_id.clone(),
        sender_name: req.sender_name,
        to,
        body: text,
    };

    submit(outbox, message, "SMS accepted for delivery")
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, MdsError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "invalid request body");
        MdsError::invalid_body().with_source(e)
    })
}

fn submit<O: Outbox>(
    outbox: &O,
    message: OutboundMessage,
    confirmation: &'static str,
) -> Result<http::Response<MdsResponseBody>, MdsError> {
    let id = message.id().to_owned();
    outbox.submit(message).map_err(|e| {
        error!(id = %id, error = %e, "outbox rejected message");
        MdsError::delivery_failed(e.to_string())
    })?;

    json_response(
        http::StatusCode::ACCEPTED,
        &Accepted {
            success: true,
            message: confirmation,
            id,
        },
    )
}
