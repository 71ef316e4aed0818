//! HTTP service layer for the message delivery service.
//!
//! This crate puts the signing protocol from `mds-auth` in front of the
//! delivery API, providing:
//!
//! - **Router**: maps method and path to an [`MdsOperation`](router::MdsOperation)
//! - **Auth middleware**: [`verify_and_forward`] checks signatures before the handler runs
//! - **Handler trait**: the boundary between HTTP and message acceptance
//! - **Service**: hyper `Service` implementation and the accept loop
//! - **Response helpers**: JSON success/error response formatting

pub mod auth;
pub mod body;
pub mod dispatch;
pub mod error;
pub mod response;
pub mod router;
pub mod server;
pub mod service;

pub use auth::{DEFAULT_MAX_BODY_BYTES, authenticate, verify_and_forward};
pub use body::MdsResponseBody;
pub use dispatch::{HandlerFuture, MdsHandler};
pub use error::{MdsError, MdsErrorCode};
pub use router::MdsOperation;
pub use server::serve;
pub use service::MdsHttpService;
