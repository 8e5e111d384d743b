//! Timer-driven polling loop.
//!
//! The [`Poller`] owns a [`SyncSession`] and drives it:
//! - one cycle per interval tick, plus one per "sync now" command
//! - at most one operation (cycle or credential refresh) in flight; ticks
//!   that fire meanwhile are skipped
//! - on credential expiry, one refresh through the supervisor, then an
//!   immediate cycle with the new credential
//! - a denied refresh suspends polling until a credential is supplied

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::OptionFuture;
use tasksync_providers::{BoxFuture, Credential};
use tokio::sync::{RwLock, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::session::{CycleOutcome, CycleReport, SyncSession};

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between cycles.
    pub poll_interval: Duration,
    /// Consecutive transient failures after which polling is suspended.
    /// Zero never suspends.
    pub max_consecutive_failures: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_consecutive_failures: 0,
        }
    }
}

impl PollerConfig {
    /// Creates a new poller config with the given interval.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Default::default()
        }
    }

    /// Builder: set the failure limit.
    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max;
        self
    }
}

/// Lifecycle state of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A reconciliation cycle is in flight.
    Polling,
    /// A credential refresh is in flight.
    Refreshing,
    /// The credential expired; a refresh is retried on the next tick.
    CredentialExpired,
    /// Polling is suspended until a credential is supplied (or, after too
    /// many failures, until "sync now").
    Suspended,
    /// The poller has stopped.
    Stopped,
}

impl PollerState {
    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Refreshing => "refreshing",
            Self::CredentialExpired => "credential_expired",
            Self::Suspended => "suspended",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for PollerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poller status shared with handles.
#[derive(Debug, Clone, Default)]
pub struct PollerStatus {
    /// Current state.
    pub state: PollerState,
    /// Number of completed cycles.
    pub cycles: u64,
    /// Number of consecutive failed cycles.
    pub consecutive_failures: u32,
    /// Last successful cycle time.
    pub last_success: Option<DateTime<Utc>>,
    /// Last cycle attempt time.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
}

impl PollerStatus {
    /// Records a successful cycle.
    pub fn record_success(&mut self) {
        self.cycles += 1;
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
        self.last_attempt = self.last_success;
        self.last_error = None;
    }

    /// Records a failed cycle.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.cycles += 1;
        self.consecutive_failures += 1;
        self.last_attempt = Some(Utc::now());
        self.last_error = Some(error.into());
    }
}

/// Shared poller status.
pub type SharedPollerStatus = Arc<RwLock<PollerStatus>>;

/// Commands that can be sent to the poller.
#[derive(Debug, Clone)]
pub enum PollerCommand {
    /// Run a cycle now unless one is in flight.
    SyncNow,
    /// Replace the source credential; resumes a suspended poller.
    SupplyCredential(Credential),
    /// Stop the poller, discarding any operation in flight.
    Stop,
}

/// Why polling is on hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Expired,
    Denied,
    TooManyFailures,
}

enum Completed {
    Cycle(CycleReport),
    Refresh(SyncResult<()>),
}

type InFlight = BoxFuture<'static, (SyncSession, Completed)>;

/// The poller drives a [`SyncSession`] on a fixed interval.
pub struct Poller {
    config: PollerConfig,
    session: SyncSession,
    status: SharedPollerStatus,
    command_tx: mpsc::Sender<PollerCommand>,
    command_rx: mpsc::Receiver<PollerCommand>,
}

impl Poller {
    /// Creates a new poller for `session`.
    pub fn new(config: PollerConfig, session: SyncSession) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            session,
            status: Arc::new(RwLock::new(PollerStatus::default())),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the poller.
    pub fn handle(&self) -> PollerHandle {
        PollerHandle {
            command_tx: self.command_tx.clone(),
            status: self.status.clone(),
        }
    }

    /// Returns the shared status.
    pub fn status(&self) -> SharedPollerStatus {
        self.status.clone()
    }

    /// Runs the polling loop with `credential` until stopped.
    ///
    /// The first cycle starts immediately. Listeners registered on the
    /// session fire from this loop after each completed cycle.
    pub async fn run(self, credential: Credential) {
        let Self {
            config,
            mut session,
            status,
            command_tx: _command_tx,
            mut command_rx,
        } = self;

        session.set_credential(credential);

        let period = if config.poll_interval.is_zero() {
            let fallback = PollerConfig::default().poll_interval;
            warn!(
                fallback_secs = fallback.as_secs(),
                "Zero poll interval, using the default"
            );
            fallback
        } else {
            config.poll_interval
        };

        info!(
            interval_secs = period.as_secs(),
            "Poller started"
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut idle = Some(session);
        let mut in_flight: Option<InFlight> = None;
        let mut phase = Phase::Ready;
        // Credential supplied while an operation was in flight.
        let mut supplied: Option<Credential> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        debug!("Operation in flight, skipping tick");
                        continue;
                    }
                    in_flight = begin(phase, &mut idle, &status).await;
                }
                Some((session, completed)) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    let start_now = match completed {
                        Completed::Cycle(report) => {
                            session.publish(&report);
                            phase = complete_cycle(&config, report, &status).await;
                            phase == Phase::Expired
                        }
                        Completed::Refresh(result) => {
                            phase = complete_refresh(result, &status).await;
                            phase == Phase::Ready
                        }
                    };
                    idle = Some(session);

                    let start_now = match (supplied.take(), idle.as_mut()) {
                        (Some(credential), Some(session)) => {
                            session.set_credential(credential);
                            phase = Phase::Ready;
                            status.write().await.consecutive_failures = 0;
                            true
                        }
                        _ => start_now,
                    };
                    if start_now {
                        if phase == Phase::Ready {
                            ticker.reset();
                        }
                        in_flight = begin(phase, &mut idle, &status).await;
                    }
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(PollerCommand::SyncNow) => {
                            debug!("Received SyncNow command");
                            if in_flight.is_some() {
                                debug!("Operation in flight, ignoring SyncNow");
                                continue;
                            }
                            match phase {
                                Phase::Denied => {
                                    warn!("Polling suspended, supply a credential to resume");
                                    continue;
                                }
                                Phase::TooManyFailures => {
                                    info!("Resuming polling after failures");
                                    status.write().await.consecutive_failures = 0;
                                    phase = Phase::Ready;
                                }
                                Phase::Ready | Phase::Expired => {}
                            }
                            in_flight = begin(phase, &mut idle, &status).await;
                        }
                        Some(PollerCommand::SupplyCredential(credential)) => {
                            info!("Received new credential");
                            match idle.as_mut() {
                                Some(session) => {
                                    session.set_credential(credential);
                                    phase = Phase::Ready;
                                    status.write().await.consecutive_failures = 0;
                                    ticker.reset();
                                    in_flight = begin(phase, &mut idle, &status).await;
                                }
                                None => {
                                    debug!("Operation in flight, applying credential on completion");
                                    supplied = Some(credential);
                                }
                            }
                        }
                        Some(PollerCommand::Stop) | None => {
                            info!("Poller stopping");
                            break;
                        }
                    }
                }
            }
        }

        // Results of an operation still in flight are discarded.
        drop(in_flight);
        status.write().await.state = PollerState::Stopped;
    }
}

/// Starts the operation `phase` calls for, taking the session out of `idle`.
async fn begin(
    phase: Phase,
    idle: &mut Option<SyncSession>,
    status: &SharedPollerStatus,
) -> Option<InFlight> {
    let state = match phase {
        Phase::Ready => PollerState::Polling,
        Phase::Expired => PollerState::Refreshing,
        Phase::Denied | Phase::TooManyFailures => {
            debug!("Polling suspended, skipping tick");
            return None;
        }
    };
    let mut session = idle.take()?;
    status.write().await.state = state;

    let future: InFlight = match phase {
        Phase::Expired => Box::pin(async move {
            let result = session.refresh_credential().await;
            (session, Completed::Refresh(result))
        }),
        _ => Box::pin(async move {
            debug!("Starting cycle");
            let report = session.run_cycle().await;
            (session, Completed::Cycle(report))
        }),
    };
    Some(future)
}

async fn complete_cycle(
    config: &PollerConfig,
    report: CycleReport,
    status: &SharedPollerStatus,
) -> Phase {
    let mut status = status.write().await;
    match report.outcome {
        CycleOutcome::Success => {
            info!(
                created = report.created().count(),
                failed = report.failed(),
                "Cycle completed"
            );
            status.record_success();
            status.state = PollerState::Idle;
            Phase::Ready
        }
        CycleOutcome::CredentialExpired => {
            warn!("Credential expired, refreshing");
            status.record_failure(SyncError::CredentialExpired.to_string());
            status.state = PollerState::CredentialExpired;
            Phase::Expired
        }
        CycleOutcome::TransientError(e) => {
            warn!(error = %e, "Cycle failed");
            status.record_failure(e.to_string());
            let max = config.max_consecutive_failures;
            if max > 0 && status.consecutive_failures >= max {
                error!(
                    failures = status.consecutive_failures,
                    max, "Max consecutive failures reached, suspending polling"
                );
                status.state = PollerState::Suspended;
                Phase::TooManyFailures
            } else {
                status.state = PollerState::Idle;
                Phase::Ready
            }
        }
    }
}

async fn complete_refresh(result: SyncResult<()>, status: &SharedPollerStatus) -> Phase {
    let mut status = status.write().await;
    match result {
        Ok(()) => {
            info!("Credential refreshed, resuming polling");
            status.state = PollerState::Idle;
            Phase::Ready
        }
        Err(e) if e.is_fatal() => {
            error!(error = %e, "Credential refresh denied, polling suspended");
            status.last_error = Some(e.to_string());
            status.state = PollerState::Suspended;
            Phase::Denied
        }
        Err(e) => {
            warn!(error = %e, "Credential refresh failed, retrying on next tick");
            status.last_error = Some(e.to_string());
            status.state = PollerState::CredentialExpired;
            Phase::Expired
        }
    }
}

/// Handle for sending commands to a running poller.
#[derive(Clone, Debug)]
pub struct PollerHandle {
    command_tx: mpsc::Sender<PollerCommand>,
    status: SharedPollerStatus,
}

impl PollerHandle {
    /// Triggers an immediate cycle.
    pub async fn sync_now(&self) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx.send(PollerCommand::SyncNow).await
    }

    /// Supplies a new source credential.
    pub async fn supply_credential(
        &self,
        credential: Credential,
    ) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx
            .send(PollerCommand::SupplyCredential(credential))
            .await
    }

    /// Stops the poller.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<PollerCommand>> {
        self.command_tx.send(PollerCommand::Stop).await
    }

    /// Returns the current poller status.
    pub async fn status(&self) -> PollerStatus {
        self.status.read().await.clone()
    }

    /// Returns true if polling is suspended.
    pub async fn is_suspended(&self) -> bool {
        self.status.read().await.state == PollerState::Suspended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::CredentialSupervisor;
    use std::sync::Mutex;
    use tasksync_core::{MirrorItem, ReconcilerConfig, TaskItem};
    use tasksync_providers::memory::{
        InMemoryMirror, InMemoryRefresher, InMemoryTaskSource, RefreshResponse, SourceResponse,
    };
    use tokio::task::JoinHandle;

    struct Harness {
        source: Arc<InMemoryTaskSource>,
        mirror: Arc<InMemoryMirror>,
        refresher: Arc<InMemoryRefresher>,
        snapshots: Arc<Mutex<Vec<u64>>>,
        creates: Arc<Mutex<Vec<Result<String, String>>>>,
    }

    impl Harness {
        fn new(tasks: Vec<TaskItem>, mirrored: Vec<MirrorItem>) -> Self {
            Self {
                source: Arc::new(InMemoryTaskSource::new(tasks)),
                mirror: Arc::new(InMemoryMirror::with_items(mirrored)),
                refresher: Arc::new(InMemoryRefresher::new()),
                snapshots: Arc::new(Mutex::new(Vec::new())),
                creates: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn spawn(&self, config: PollerConfig, credential: Credential) -> (PollerHandle, JoinHandle<()>) {
            let mut session = SyncSession::new(
                self.source.clone(),
                self.mirror.clone(),
                CredentialSupervisor::new(self.refresher.clone()),
                ReconcilerConfig::default(),
            );

            let snapshots = self.snapshots.clone();
            session.on_snapshot_updated(move |reconciler| {
                snapshots.lock().unwrap().push(reconciler.source().version());
            });
            let creates = self.creates.clone();
            session.on_create_completed(move |result| {
                let entry = match result {
                    Ok(item) => Ok(item.task_id.clone()),
                    Err(SyncError::RemoteWrite { task_id, .. }) => Err(task_id.clone()),
                    Err(e) => Err(e.to_string()),
                };
                creates.lock().unwrap().push(entry);
            });

            let poller = Poller::new(config, session);
            let handle = poller.handle();
            let task = tokio::spawn(poller.run(credential));
            (handle, task)
        }

        fn snapshots(&self) -> Vec<u64> {
            self.snapshots.lock().unwrap().clone()
        }

        fn creates(&self) -> Vec<Result<String, String>> {
            self.creates.lock().unwrap().clone()
        }
    }

    fn task(id: &str) -> TaskItem {
        TaskItem::new(id, format!("Task {}", id), Utc::now())
    }

    fn credential(access_token: &str) -> Credential {
        Credential::new(access_token).with_refresh_token("refresh")
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    async fn shutdown(handle: PollerHandle, task: JoinHandle<()>) {
        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[test]
    fn config_default() {
        let config = PollerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.max_consecutive_failures, 0);
    }

    #[test]
    fn status_record_success_and_failure() {
        let mut status = PollerStatus::default();

        status.record_failure("boom");
        status.record_failure("boom");
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.last_error.as_deref(), Some("boom"));

        status.record_success();
        assert_eq!(status.cycles, 3);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_success.is_some());
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately() {
        let harness = Harness::new(vec![task("a"), task("b")], vec![MirrorItem::for_task(&task("a"))]);
        let (handle, join) = harness.spawn(PollerConfig::default(), credential("valid"));

        settle().await;

        assert_eq!(harness.mirror.create_calls(), vec!["b"]);
        assert_eq!(harness.snapshots(), vec![1]);
        let status = handle.status().await;
        assert_eq!(status.state, PollerState::Idle);
        assert_eq!(status.cycles, 1);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_falls_back_to_default() {
        let harness = Harness::new(vec![task("a")], vec![]);
        let (handle, join) = harness.spawn(PollerConfig::new(Duration::ZERO), credential("valid"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(harness.source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(harness.source.calls(), 2);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_a_cycle_are_skipped() {
        let harness = Harness::new(vec![task("a")], vec![]);
        harness.source.set_delay(Duration::from_secs(25));
        let (handle, join) = harness.spawn(PollerConfig::new(Duration::from_secs(10)), credential("valid"));

        // Cycles run over [0, 25] and [30, 55]; the ticks at 10 and 20 are dropped.
        tokio::time::sleep(Duration::from_secs(58)).await;

        assert_eq!(harness.source.calls(), 2);
        assert_eq!(handle.status().await.cycles, 2);
        assert_eq!(harness.mirror.create_calls(), vec!["a"]);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_refreshes_once_then_polls_immediately() {
        let harness = Harness::new(vec![task("a")], vec![]);
        harness.source.reject_token("stale");
        let (handle, join) = harness.spawn(PollerConfig::default(), credential("stale"));

        settle().await;

        assert_eq!(harness.refresher.calls(), 1);
        assert_eq!(harness.source.seen_tokens(), vec!["stale", "refreshed-1"]);
        // Only the successful cycle published a snapshot.
        assert_eq!(harness.snapshots(), vec![1]);
        assert_eq!(harness.mirror.create_calls(), vec!["a"]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(harness.refresher.calls(), 1);
        assert_eq!(harness.source.seen_tokens().last().map(String::as_str), Some("refreshed-1"));

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn expired_hint_refreshes_before_calling_source() {
        let harness = Harness::new(vec![task("a")], vec![]);
        let stale = credential("stale").with_expires_at(Utc::now() - chrono::Duration::minutes(5));
        let (handle, join) = harness.spawn(PollerConfig::default(), stale);

        settle().await;

        assert_eq!(harness.source.seen_tokens(), vec!["refreshed-1"]);
        assert_eq!(harness.refresher.calls(), 1);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn denied_refresh_suspends_until_credential_supplied() {
        let harness = Harness::new(vec![task("a")], vec![]);
        harness.source.reject_token("stale");
        harness.refresher.push_response(RefreshResponse::Deny);
        let (handle, join) = harness.spawn(PollerConfig::default(), credential("stale"));

        settle().await;
        assert!(handle.is_suspended().await);

        tokio::time::sleep(Duration::from_secs(60)).await;
        handle.sync_now().await.unwrap();
        settle().await;
        assert_eq!(harness.source.calls(), 1);
        assert_eq!(harness.refresher.calls(), 1);
        assert!(handle.is_suspended().await);

        handle.supply_credential(Credential::new("fresh")).await.unwrap();
        settle().await;

        assert_eq!(harness.source.seen_tokens(), vec!["stale", "fresh"]);
        assert_eq!(handle.status().await.state, PollerState::Idle);
        assert_eq!(harness.mirror.create_calls(), vec!["a"]);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn transient_refresh_failure_retries_on_next_tick() {
        let harness = Harness::new(vec![task("a")], vec![]);
        harness.source.reject_token("stale");
        harness.refresher.push_response(RefreshResponse::Unavailable);
        let (handle, join) = harness.spawn(PollerConfig::default(), credential("stale"));

        settle().await;
        assert_eq!(harness.refresher.calls(), 1);
        assert_eq!(handle.status().await.state, PollerState::CredentialExpired);
        assert_eq!(harness.source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(harness.refresher.calls(), 2);
        assert_eq!(harness.source.seen_tokens(), vec!["stale", "refreshed-2"]);
        assert_eq!(handle.status().await.state, PollerState::Idle);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_create_is_retried_next_cycle() {
        let harness = Harness::new(vec![task("a"), task("b")], vec![]);
        harness.mirror.fail_creates_for("b");
        let (handle, join) = harness.spawn(PollerConfig::default(), credential("valid"));

        settle().await;
        assert_eq!(
            harness.creates(),
            vec![Ok("a".to_string()), Err("b".to_string())]
        );

        harness.mirror.heal();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            harness.creates(),
            vec![Ok("a".to_string()), Err("b".to_string()), Ok("b".to_string())]
        );

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_cycle() {
        let harness = Harness::new(vec![task("a")], vec![]);
        harness.source.set_delay(Duration::from_secs(5));
        let (handle, join) = harness.spawn(PollerConfig::default(), credential("valid"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.status().await.state, PollerState::Polling);

        shutdown(handle.clone(), join).await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(handle.status().await.state, PollerState::Stopped);
        assert!(harness.snapshots().is_empty());
        assert_eq!(harness.mirror.list_calls(), 0);
        assert!(harness.mirror.create_calls().is_empty());
        assert!(handle.sync_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn sync_now_runs_cycle_immediately() {
        let harness = Harness::new(vec![task("a")], vec![]);
        let (handle, join) = harness.spawn(PollerConfig::new(Duration::from_secs(60)), credential("valid"));

        settle().await;
        harness.source.set_tasks(vec![task("a"), task("c")]);
        handle.sync_now().await.unwrap();
        settle().await;

        assert_eq!(harness.source.calls(), 2);
        assert_eq!(harness.mirror.create_calls(), vec!["a", "c"]);

        shutdown(handle, join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn too_many_failures_suspend_until_sync_now() {
        let harness = Harness::new(vec![task("a")], vec![]);
        for _ in 0..3 {
            harness.source.push_response(SourceResponse::Unavailable);
        }
        let config = PollerConfig::default().with_max_consecutive_failures(2);
        let (handle, join) = harness.spawn(config, credential("valid"));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(handle.is_suspended().await);
        assert_eq!(harness.source.calls(), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(harness.source.calls(), 2);

        handle.sync_now().await.unwrap();
        settle().await;
        let status = handle.status().await;
        assert_eq!(harness.source.calls(), 3);
        assert_eq!(status.state, PollerState::Idle);
        assert_eq!(status.consecutive_failures, 1);

        shutdown(handle, join).await;
    }
}
