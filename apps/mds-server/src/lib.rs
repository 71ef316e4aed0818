//! Message delivery server.
//!
//! Wires the signing middleware from `mds-http` to message acceptance:
//! request bodies are validated ([`message`]), turned into
//! [`OutboundMessage`](outbox::OutboundMessage)s and handed to an
//! [`Outbox`](outbox::Outbox). The trusted caller registry is kept fresh
//! by [`reload`], and [`shutdown`] turns termination signals into a
//! graceful drain.

pub mod handler;
pub mod message;
pub mod outbox;
pub mod reload;
pub mod shutdown;

pub use handler::DeliveryHandler;
pub use outbox::{LogOutbox, MemoryOutbox, OutboundMessage, Outbox, OutboxError};
