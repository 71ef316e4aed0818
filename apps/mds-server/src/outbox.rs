//! Hand-off point between the API and the delivery backends.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

/// A message accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// An email.
    Email {
        /// Id returned to the caller.
        id: String,
        /// Client that submitted the message.
        client_id: String,
        /// Sender address.
        from: String,
        /// Recipient addresses.
        to: Vec<String>,
        /// Subject line.
        subject: String,
        /// Body text.
        body: String,
        /// Whether `body` is HTML.
        is_html: bool,
    },
    /// An SMS.
    Sms {
        /// Id returned to the caller.
        id: String,
        /// Client that submitted the message.
        client_id: String,
        /// Sender name, if any.
        sender_name: Option<String>,
        /// Recipient phone numbers.
        to: Vec<String>,
        /// Body text.
        body: String,
    },
}

impl OutboundMessage {
    /// The id assigned to this message.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Email { id, .. } | Self::Sms { id, .. } => id,
        }
    }
}

/// Error returned when a backend refuses a message.
#[derive(Debug, thiserror::Error)]
#[error("delivery failed: {0}")]
pub struct OutboxError(pub String);

/// Accepts messages for asynchronous delivery.
///
/// SMTP and SMS transports implement this outside the API process.
pub trait Outbox: Send + Sync + 'static {
    /// Queue `message` for delivery.
    fn submit(&self, message: OutboundMessage) -> Result<(), OutboxError>;
}

/// Records accepted messages in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOutbox;

impl Outbox for LogOutbox {
    fn submit(&self, message: OutboundMessage) -> Result<(), OutboxError> {
        match &message {
            OutboundMessage::Email {
                id,
                client_id,
                from,
                to,
                subject,
                ..
            } => info!(
                id = %id,
                client_id = %client_id,
                from = %from,
                recipients = to.len(),
                subject = %subject,
                "email accepted for delivery"
            ),
            OutboundMessage::Sms {
                id,
                client_id,
                sender_name,
                to,
                ..
            } => info!(
                id = %id,
                client_id = %client_id,
                sender_name = sender_name.as_deref().unwrap_or(""),
                recipients = to.len(),
                "sms accepted for delivery"
            ),
        }
        Ok(())
    }
}

/// Keeps accepted messages in memory.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl MemoryOutbox {
    /// Messages accepted so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }
}

impl Outbox for MemoryOutbox {
    fn submit(&self, message: OutboundMessage) -> Result<(), OutboxError> {
        self.messages.lock().push(message);
        Ok(())
    }
}
