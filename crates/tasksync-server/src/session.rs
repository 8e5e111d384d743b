//! The sync session: adapters, credential and reconciler state.
//!
//! A [`SyncSession`] runs one reconciliation cycle at a time:
//!
//! 1. fetch the source and publish it as a new source snapshot
//! 2. re-query the mirror if its snapshot is stale for that source version
//! 3. take the pending creates for the epoch and dispatch them one by one
//! 4. re-query the mirror so the next diff sees the new items
//!
//! The session is plain owned data. The poller moves it into the operation
//! in flight and gets it back on completion, which is what keeps cycles from
//! overlapping.

use std::sync::Arc;

use tasksync_core::{MirrorItem, PendingCreate, Reconciler, ReconcilerConfig, TaskItem};
use tasksync_providers::{Credential, MirrorStore, TaskSource};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::supervisor::CredentialSupervisor;

/// Called with the reconciler after a cycle changed its snapshots.
pub type SnapshotListener = Box<dyn Fn(&Reconciler) + Send + Sync>;

/// Called once per dispatched create with its result.
pub type CreateListener = Box<dyn Fn(&SyncResult<MirrorItem>) + Send + Sync>;

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The source was read; creates (if any) were dispatched.
    Success,
    /// The credential was rejected or had expired. Nothing was published.
    CredentialExpired,
    /// The source or the mirror could not be read.
    TransientError(SyncError),
}

/// What a single cycle did.
#[derive(Debug)]
pub struct CycleReport {
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// Whether a source or mirror snapshot was published.
    pub snapshots_updated: bool,
    /// One entry per dispatched create, in dispatch order.
    pub creates: Vec<SyncResult<MirrorItem>>,
}

impl CycleReport {
    fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            snapshots_updated: false,
            creates: Vec::new(),
        }
    }

    /// Returns true if the cycle succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Success)
    }

    /// Returns the mirror items created during the cycle.
    pub fn created(&self) -> impl Iterator<Item = &MirrorItem> {
        self.creates.iter().filter_map(|result| result.as_ref().ok())
    }

    /// Returns the number of creates that failed.
    pub fn failed(&self) -> usize {
        self.creates.iter().filter(|result| result.is_err()).count()
    }
}

/// Session context for one source/mirror pair.
pub struct SyncSession {
    source: Arc<dyn TaskSource>,
    mirror: Arc<dyn MirrorStore>,
    supervisor: CredentialSupervisor,
    credential: Option<Credential>,
    reconciler: Reconciler,
    snapshot_listeners: Vec<SnapshotListener>,
    create_listeners: Vec<CreateListener>,
}

impl SyncSession {
    /// Creates a session without a credential.
    pub fn new(
        source: Arc<dyn TaskSource>,
        mirror: Arc<dyn MirrorStore>,
        supervisor: CredentialSupervisor,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            source,
            mirror,
            supervisor,
            credential: None,
            reconciler: Reconciler::new(config),
            snapshot_listeners: Vec::new(),
            create_listeners: Vec::new(),
        }
    }

    /// Builder: set the source credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Registers a listener for snapshot updates.
    pub fn on_snapshot_updated<F>(&mut self, listener: F)
    where
        F: Fn(&Reconciler) + Send + Sync + 'static,
    {
        self.snapshot_listeners.push(Box::new(listener));
    }

    /// Registers a listener for completed creates, successful or not.
    pub fn on_create_completed<F>(&mut self, listener: F)
    where
        F: Fn(&SyncResult<MirrorItem>) + Send + Sync + 'static,
    {
        self.create_listeners.push(Box::new(listener));
    }

    /// Replaces the source credential.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    /// Returns the current source credential.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Returns the reconciler.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Runs one reconciliation cycle.
    ///
    /// Listeners are not called; see [`Self::publish`].
    pub async fn run_cycle(&mut self) -> CycleReport {
        let tasks = match self.fetch_source().await {
            Ok(tasks) => tasks,
            Err(SyncError::CredentialExpired) => {
                return CycleReport::new(CycleOutcome::CredentialExpired);
            }
            Err(e) => return CycleReport::new(CycleOutcome::TransientError(e)),
        };

        self.reconciler.publish_source(tasks);
        let mut report = CycleReport::new(CycleOutcome::Success);
        report.snapshots_updated = true;

        if self.reconciler.mirror_is_stale()
            && let Err(e) = self.refresh_mirror().await
        {
            report.outcome = CycleOutcome::TransientError(e);
            return report;
        }

        let pending = self.reconciler.take_pending();
        if pending.is_empty() {
            return report;
        }

        for create in pending {
            let result = match self.mirror.create_mirrored(&create.task).await {
                Ok(item) => {
                    self.reconciler.record_created(&item);
                    Ok(item)
                }
                Err(e) => {
                    warn!(task_id = %create.task.id, error = %e, "Failed to mirror task");
                    Err(SyncError::remote_write(&create.task.id, e))
                }
            };
            report.creates.push(result);
        }

        info!(
            created = report.created().count(),
            failed = report.failed(),
            "Dispatched creates"
        );

        // Failed creates come back through the next diff; a failed
        // re-query only delays confirmation.
        if let Err(e) = self.refresh_mirror().await {
            debug!(error = %e, "Mirror re-query after creates failed");
        }

        report
    }

    /// Calls the listeners for the results in `report`.
    pub fn publish(&self, report: &CycleReport) {
        if report.snapshots_updated {
            for listener in &self.snapshot_listeners {
                listener(&self.reconciler);
            }
        }
        for result in &report.creates {
            for listener in &self.create_listeners {
                listener(result);
            }
        }
    }

    /// Obtains a new credential through the supervisor.
    ///
    /// The current credential is kept when the refresh fails.
    pub async fn refresh_credential(&mut self) -> SyncResult<()> {
        let current = self
            .credential
            .clone()
            .unwrap_or_else(|| Credential::new(String::new()));
        let refreshed = self.supervisor.refresh(&current).await?;
        self.credential = Some(refreshed);
        Ok(())
    }

    /// Runs a single cycle, refreshing the credential once if it expired,
    /// then calls the listeners.
    pub async fn sync_once(&mut self) -> SyncResult<CycleReport> {
        let mut report = self.run_cycle().await;
        if matches!(report.outcome, CycleOutcome::CredentialExpired) {
            self.refresh_credential().await?;
            report = self.run_cycle().await;
        }
        self.publish(&report);

        match report.outcome {
            CycleOutcome::CredentialExpired => Err(SyncError::CredentialExpired),
            _ => Ok(report),
        }
    }

    /// Reads both sides and returns the creates the next cycle would
    /// dispatch, without dispatching them.
    ///
    /// An expired credential is refreshed once.
    pub async fn preview(&mut self) -> SyncResult<Vec<PendingCreate>> {
        let tasks = match self.fetch_source().await {
            Err(SyncError::CredentialExpired) => {
                self.refresh_credential().await?;
                self.fetch_source().await?
            }
            other => other?,
        };
        self.reconciler.publish_source(tasks);
        self.refresh_mirror().await?;
        Ok(self.reconciler.pending_preview())
    }

    async fn fetch_source(&self) -> SyncResult<Vec<TaskItem>> {
        let credential = match &self.credential {
            Some(credential) if !credential.is_expired() => credential,
            Some(_) => {
                debug!("credential expiry hint has passed");
                return Err(SyncError::CredentialExpired);
            }
            None => return Err(SyncError::CredentialExpired),
        };

        match self.source.list_tasks(credential).await {
            Ok(tasks) => Ok(tasks),
            Err(e) if e.is_unauthorized() => {
                info!(source = self.source.name(), "Source rejected the credential");
                Err(SyncError::CredentialExpired)
            }
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Failed to fetch tasks");
                Err(SyncError::TransientFetch(e))
            }
        }
    }

    async fn refresh_mirror(&mut self) -> SyncResult<()> {
        match self.mirror.list_mirrored().await {
            Ok(items) => {
                let version = self.reconciler.publish_mirror(items);
                debug!(mirror_version = version, "Mirror snapshot updated");
                Ok(())
            }
            Err(e) => {
                warn!(mirror = self.mirror.name(), error = %e, "Failed to query mirror");
                Err(SyncError::TransientFetch(e))
            }
        }
    }
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("source", &self.source.name())
            .field("mirror", &self.mirror.name())
            .field("credential", &self.credential)
            .field("source_version", &self.reconciler.source().version())
            .field("mirror_version", &self.reconciler.mirror().version())
            .finish()
    }
}
