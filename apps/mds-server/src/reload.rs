//! Service registry hot reload.
//!
//! The registry is rebuilt from the services file on `SIGHUP` and whenever
//! the file's modification time changes. A reload that fails leaves the
//! previous snapshot in place.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mds_auth::SharedServiceRegistry;
use mds_core::{ServicesFileWatcher, reload_registry};
use tracing::{error, info};

/// Reload `registry` from `path`, logging the outcome.
pub fn reload_now(path: &std::path::Path, registry: &SharedServiceRegistry) -> bool {
    match reload_registry(path, registry) {
        Ok(_) => true,
        Err(e) => {
            error!(error = %e, "failed to reload services file, keeping previous registry");
            false
        }
    }
}

/// Poll the services file every `interval` and reload on change.
pub async fn poll_services_file(
    path: PathBuf,
    registry: Arc<SharedServiceRegistry>,
    interval: Duration,
) {
    let mut watcher = ServicesFileWatcher::new(path);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if watcher.poll_changed() {
            info!(path = %watcher.path().display(), "services file modified, reloading");
            reload_now(watcher.path(), &registry);
        }
    }
}

/// Reload the registry every time the process receives `SIGHUP`.
#[cfg(unix)]
pub async fn reload_on_sighup(path: PathBuf, registry: Arc<SharedServiceRegistry>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "cannot listen for SIGHUP, signal reload disabled");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        info!(path = %path.display(), "received SIGHUP, reloading services file");
        reload_now(&path, &registry);
    }
}

/// Signal-driven reload is only available on unix.
#[cfg(not(unix))]
pub async fn reload_on_sighup(_path: PathBuf, _registry: Arc<SharedServiceRegistry>) {}
