//! End-to-end tests for the message delivery service.
//!
//! Each test starts its own server in-process on an ephemeral port, backed by
//! a [`MemoryOutbox`], and talks to it over real HTTP.
//!
//! ```text
//! cargo test -p mds-integration
//! ```

use std::sync::{Arc, Once};

use mds_auth::{
    PrivateKeyMaterial, RegistrySnapshot, RequestSigner, RequestVerifier, ServiceIdentity,
    ServiceRegistry, SharedServiceRegistry,
};
use mds_client::Client;
use mds_http::MdsHttpService;
use mds_server::{DeliveryHandler, MemoryOutbox};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A deterministic private key for tests.
#[must_use]
pub fn test_key(seed: u8) -> PrivateKeyMaterial {
    PrivateKeyMaterial::from_seed(&[seed; 32])
}

/// A registry entry trusting `key` for `client_id`.
#[must_use]
pub fn identity(client_id: &str, key: &PrivateKeyMaterial) -> ServiceIdentity {
    ServiceIdentity::new(client_id, key.public_key().to_base64())
}

/// A running in-process server.
#[derive(Debug)]
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub url: String,
    /// The registry the server verifies against.
    pub registry: Arc<SharedServiceRegistry>,
    /// Messages the server accepted.
    pub outbox: Arc<MemoryOutbox>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server trusting `services`.
    pub async fn start(services: Vec<ServiceIdentity>) -> anyhow::Result<Self> {
        init_tracing();

        let registry = Arc::new(SharedServiceRegistry::new(RegistrySnapshot::new(services)));
        let outbox = Arc::new(MemoryOutbox::default());

        let verifier = RequestVerifier::new(Arc::clone(&registry) as Arc<dyn ServiceRegistry>);
        let handler = DeliveryHandler::new(Arc::clone(&outbox));
        let service = MdsHttpService::new(Arc::new(handler), verifier);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);

        let (tx, rx) = oneshot::channel();
        tokio::spawn(mds_http::serve(listener, service, async {
            rx.await.ok();
        }));

        Ok(Self {
            url,
            registry,
            outbox,
            shutdown: Some(tx),
        })
    }

    /// A signing client for this server.
    pub fn client(&self, client_id: &str, key: &PrivateKeyMaterial) -> anyhow::Result<Client> {
        let signer = RequestSigner::new(client_id, key.clone())?;
        Ok(Client::with_signer(&self.url, signer)?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

mod test_auth;
mod test_delivery;
mod test_keys;
mod test_reload;
