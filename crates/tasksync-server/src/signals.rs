//! Unix signal forwarding for a running poller.
//!
//! - SIGTERM/SIGINT: stop the poller
//! - SIGHUP: trigger an immediate cycle

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::poller::PollerHandle;

/// Spawns a task that forwards process signals to `handle`.
///
/// The task ends after forwarding a shutdown signal or when the poller is
/// gone.
#[cfg(unix)]
pub fn forward_signals(handle: PollerHandle) -> JoinHandle<()> {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint, mut sighup) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(term), Ok(int), Ok(hup)) => (term, int, hup),
            _ => {
                warn!("Failed to install signal handlers, falling back to Ctrl+C");
                wait_for_ctrl_c(handle).await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, stopping");
                    let _ = handle.stop().await;
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, stopping");
                    let _ = handle.stop().await;
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, syncing now");
                    if handle.sync_now().await.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("Signal forwarder stopped");
    })
}

/// Spawns a task that stops the poller on Ctrl+C.
#[cfg(not(unix))]
pub fn forward_signals(handle: PollerHandle) -> JoinHandle<()> {
    tokio::spawn(wait_for_ctrl_c(handle))
}

async fn wait_for_ctrl_c(handle: PollerHandle) {
    if let Ok(()) = tokio::signal::ctrl_c().await {
        info!("Received Ctrl+C, stopping");
        let _ = handle.stop().await;
    }
}
