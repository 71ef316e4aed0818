//! Message delivery server binary.
//!
//! Accepts email and SMS requests from registered services. Every request
//! to `/v3/*` must be signed with the caller's Ed25519 key; `/health` is
//! open.
//!
//! # Usage
//!
//! ```text
//! MDS_LISTEN=0.0.0.0:3000 MDS_CONFIG=config.json mds-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MDS_LISTEN` | `0.0.0.0:3000` | Bind address |
//! | `MDS_CONFIG` | `config.json` | Services file with trusted public keys |
//! | `MDS_CONFIG_POLL_SECS` | `2` | Services file poll interval, `0` disables |
//! | `MDS_MAX_BODY_BYTES` | `1048576` | Largest request body accepted on signed routes |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! Sending `SIGHUP` reloads the services file immediately. `SIGINT` and
//! `SIGTERM` stop accepting connections and drain in-flight requests.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use mds_auth::{RequestVerifier, SharedServiceRegistry};
use mds_core::{ServerConfig, ensure_services_file, load_registry};
use mds_http::MdsHttpService;
use mds_server::reload::{poll_services_file, reload_on_sighup};
use mds_server::shutdown::shutdown_signal;
use mds_server::{DeliveryHandler, LogOutbox};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Address the health check connects to.
fn health_check_addr(listen: SocketAddr) -> SocketAddr {
    if listen.ip().is_unspecified() {
        SocketAddr::from(([127, 0, 0, 1], listen.port()))
    } else {
        listen
    }
}

/// Request `/health` from a running server.
async fn run_health_check(addr: SocketAddr) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"ok\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(health_check_addr(config.listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen,
        services_path = %config.services_path.display(),
        poll_interval = ?config.poll_interval,
        max_body_bytes = config.max_body_bytes,
        version = VERSION,
        "starting message delivery server",
    );

    ensure_services_file(&config.services_path)?;
    let snapshot = load_registry(&config.services_path)
        .with_context(|| format!("failed to load {}", config.services_path.display()))?;
    info!(services = ?snapshot.client_ids(), "service registry loaded");

    let registry = Arc::new(SharedServiceRegistry::new(snapshot));
    tokio::spawn(reload_on_sighup(
        config.services_path.clone(),
        Arc::clone(&registry),
    ));
    if let Some(interval) = config.poll_interval {
        tokio::spawn(poll_services_file(
            config.services_path.clone(),
            Arc::clone(&registry),
            interval,
        ));
    }

    let verifier = RequestVerifier::new(registry);
    let handler = DeliveryHandler::new(Arc::new(LogOutbox));
    let service = MdsHttpService::new(Arc::new(handler), verifier)
        .with_max_body_bytes(config.max_body_bytes);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind to {}", config.listen))?;

    info!(addr = %config.listen, "listening for connections");

    let signal = shutdown_signal().context("failed to install signal handlers")?;
    let shutdown = async {
        let name = signal.await;
        info!(signal = name, "received shutdown signal, draining connections");
    };
    mds_http::serve(listener, service, shutdown).await;

    Ok(())
}
