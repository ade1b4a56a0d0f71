//! Signal handling for the foreground `start` command.
//!
//! A block that is interrupted with SIGINT or SIGTERM is lifted before the
//! process exits, rather than left for the next `resume`.

use tracing::{info, warn};

/// Resolve once SIGINT or SIGTERM arrives.
///
/// If no handler can be registered (e.g. in restricted environments) this
/// never resolves and the block simply runs to expiry.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Failed to register SIGINT handler: {}", e);
            None
        }
    };

    let sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            None
        }
    };

    match (sigint, sigterm) {
        (Some(mut int), Some(mut term)) => {
            tokio::select! {
                _ = int.recv() => info!("Received SIGINT, lifting block..."),
                _ = term.recv() => info!("Received SIGTERM, lifting block..."),
            }
        }
        (Some(mut int), None) => {
            int.recv().await;
            info!("Received SIGINT, lifting block...");
        }
        (None, Some(mut term)) => {
            term.recv().await;
            info!("Received SIGTERM, lifting block...");
        }
        (None, None) => {
            warn!("No signal handlers registered - interrupting will leave the block in place");
            std::future::pending::<()>().await;
        }
    }
}

/// Resolve once Ctrl-C arrives.
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, lifting block..."),
        Err(e) => {
            warn!("Failed to register Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
