//! Process termination signals.

use std::future::Future;
use std::io;

/// Install handlers for the termination signals and return a future that
/// resolves with the name of the first one received.
///
/// On unix both `SIGINT` and `SIGTERM` (sent by `docker stop` and most
/// supervisors) trigger shutdown. Handlers are registered before this
/// function returns, so a signal arriving before the future is polled is
/// not lost.
pub fn shutdown_signal() -> io::Result<impl Future<Output = &'static str>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        Ok(async move {
            tokio::select! {
                _ = interrupt.recv() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
            }
        })
    }

    #[cfg(not(unix))]
    {
        Ok(async {
            tokio::signal::ctrl_c().await.ok();
            "ctrl-c"
        })
    }
}
