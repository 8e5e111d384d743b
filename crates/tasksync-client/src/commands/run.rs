//! Foreground sync loop.

use std::time::Duration;

use tasksync_providers::Credential;
use tasksync_server::{Poller, forward_signals};
use tracing::{debug, info, warn};

use super::build_session;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// How often the loop checks whether the poller suspended itself.
const SUSPEND_CHECK: Duration = Duration::from_secs(1);

/// Polls until SIGINT/SIGTERM, or until polling suspends.
///
/// A suspended poller cannot be revived from the command line, so a refresh
/// denial or too many failed cycles end the command with an error.
pub async fn run(config: &ClientConfig, interval: Option<u64>) -> ClientResult<()> {
    let (mut session, credential) = build_session(config)?;

    session.on_create_completed(|result| match result {
        Ok(item) => println!("created  {}  {}", item.task_id, item.title),
        Err(e) => warn!(error = %e, "Task not mirrored, will retry"),
    });
    session.on_snapshot_updated(|reconciler| {
        debug!(
            source_version = reconciler.source().version(),
            tasks = reconciler.source().len(),
            mirror_version = reconciler.mirror().version(),
            mirrored = reconciler.mirror().len(),
            "Snapshots updated"
        );
    });

    let poller_config = config
        .sync
        .poller_config(interval)
        .map_err(ClientError::Config)?;
    info!(
        interval_secs = poller_config.poll_interval.as_secs(),
        "Starting sync loop"
    );
    supervise(Poller::new(poller_config, session), credential).await
}

async fn supervise(poller: Poller, credential: Credential) -> ClientResult<()> {
    let handle = poller.handle();
    let signals = forward_signals(handle.clone());
    let mut task = tokio::spawn(poller.run(credential));
    let mut check = tokio::time::interval(SUSPEND_CHECK);

    let result = loop {
        tokio::select! {
            joined = &mut task => {
                break joined.map_err(|e| ClientError::Suspended(format!("sync loop aborted: {}", e)));
            }
            _ = check.tick() => {
                if !handle.is_suspended().await {
                    continue;
                }
                let status = handle.status().await;
                // The poller may already be gone; either way it is done.
                let _ = handle.stop().await;
                if let Err(e) = (&mut task).await {
                    warn!(error = %e, "Sync loop task failed");
                }
                break Err(ClientError::Suspended(
                    status
                        .last_error
                        .unwrap_or_else(|| "no error recorded".to_string()),
                ));
            }
        }
    };

    signals.abort();
    let status = handle.status().await;
    info!(cycles = status.cycles, "Sync loop stopped");
    result
}
