//! One-way reconciliation from the task source to the mirror.
//!
//! The pure [`diff`] computes which tasks have no mirror item yet. The
//! [`Reconciler`] owns the latest snapshot pair and gates the create pass so
//! that a create, which itself changes the mirror, cannot retrigger itself:
//!
//! 1. A new source snapshot marks the mirror snapshot stale.
//! 2. The mirror is re-queried for the new source version.
//! 3. The create pass runs at most once per (source version, mirror version)
//!    epoch.
//!
//! Reconciliation is create-only. Nothing here ever deletes or rewrites a
//! mirror item, and titles are not compared: a task is reconciled as soon as
//! some mirror item carries its id.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::snapshot::{MirrorSnapshot, SourceSnapshot};
use crate::task::{MirrorItem, TaskItem};

/// A task that has no mirror item yet and should be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreate {
    /// The task to mirror.
    pub task: TaskItem,
}

impl PendingCreate {
    /// Creates a pending create for `task`.
    pub fn new(task: TaskItem) -> Self {
        Self { task }
    }

    /// Returns the id of the task to mirror.
    pub fn task_id(&self) -> &str {
        &self.task.id
    }
}

/// Returns a create for every task in `source` whose id is not in `mirror`.
///
/// Output follows source order. A task id that appears more than once in the
/// source is emitted once, at its first position.
pub fn diff(source: &SourceSnapshot, mirror: &MirrorSnapshot) -> Vec<PendingCreate> {
    let mut seen = HashSet::new();
    source
        .items()
        .iter()
        .filter(|task| !mirror.contains(&task.id))
        .filter(|task| seen.insert(task.id.as_str()))
        .map(|task| PendingCreate::new(task.clone()))
        .collect()
}

/// What to do with a task whose mirror item disappeared from the mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorDeletionPolicy {
    /// Create the mirror item again on the next cycle.
    #[default]
    Recreate,
    /// Never create a mirror item twice for the same task in one session.
    Suppress,
}

/// Reconciler configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Handling of mirror items deleted outside the reconciler.
    pub deletion_policy: MirrorDeletionPolicy,
    /// Number of mirror snapshots a created item may be missing from before
    /// it is considered lost and becomes eligible for creation again.
    pub confirm_grace: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            deletion_policy: MirrorDeletionPolicy::Recreate,
            confirm_grace: 3,
        }
    }
}

impl ReconcilerConfig {
    /// Builder: set the deletion policy.
    pub fn with_deletion_policy(mut self, policy: MirrorDeletionPolicy) -> Self {
        self.deletion_policy = policy;
        self
    }

    /// Builder: set the confirmation grace.
    pub fn with_confirm_grace(mut self, grace: u32) -> Self {
        self.confirm_grace = grace;
        self
    }
}

/// Holds the latest snapshot pair and decides when creates are due.
#[derive(Debug, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
    source: SourceSnapshot,
    mirror: MirrorSnapshot,
    last_epoch: Option<(u64, u64)>,
    /// Created task ids not yet seen in a mirror snapshot, with the number of
    /// snapshots that missed them.
    unconfirmed: HashMap<String, u32>,
    /// Task ids ever mirrored or created; consulted under `Suppress`.
    suppressed: HashSet<String>,
}

impl Reconciler {
    /// Creates a reconciler with empty snapshots.
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Returns the latest source snapshot.
    pub fn source(&self) -> &SourceSnapshot {
        &self.source
    }

    /// Returns the latest mirror snapshot.
    pub fn mirror(&self) -> &MirrorSnapshot {
        &self.mirror
    }

    /// Replaces the source snapshot and returns its version.
    pub fn publish_source(&mut self, items: Vec<TaskItem>) -> u64 {
        let version = self.source.version() + 1;
        debug!(version, tasks = items.len(), "Published source snapshot");
        self.source = SourceSnapshot::new(items, version);
        version
    }

    /// Returns true if the mirror has not been queried for the current
    /// source snapshot.
    pub fn mirror_is_stale(&self) -> bool {
        self.mirror.version() == 0 || self.mirror.source_version() != self.source.version()
    }

    /// Replaces the mirror snapshot and returns its version.
    ///
    /// Created ids found in the new snapshot are confirmed. Ids missing for
    /// more than `confirm_grace` snapshots are released.
    pub fn publish_mirror(&mut self, items: Vec<MirrorItem>) -> u64 {
        let version = self.mirror.version() + 1;
        let snapshot = MirrorSnapshot::new(items, version, self.source.version());

        let grace = self.config.confirm_grace;
        self.unconfirmed.retain(|task_id, misses| {
            if snapshot.contains(task_id) {
                trace!(task_id = %task_id, "Confirmed created mirror item");
                return false;
            }
            *misses += 1;
            if *misses >= grace {
                debug!(task_id = %task_id, misses = *misses, "Created mirror item never appeared, releasing");
                return false;
            }
            true
        });

        if self.config.deletion_policy == MirrorDeletionPolicy::Suppress {
            self.suppressed.extend(snapshot.task_ids().iter().cloned());
        }

        debug!(
            version,
            source_version = snapshot.source_version(),
            items = snapshot.len(),
            "Published mirror snapshot"
        );
        self.mirror = snapshot;
        version
    }

    /// Returns the creates due for the current epoch.
    ///
    /// Returns nothing while the mirror is stale, and nothing on a second
    /// call for the same epoch.
    pub fn take_pending(&mut self) -> Vec<PendingCreate> {
        if self.mirror_is_stale() {
            trace!("Mirror snapshot is stale, deferring create pass");
            return Vec::new();
        }

        let epoch = (self.source.version(), self.mirror.version());
        if self.last_epoch == Some(epoch) {
            trace!(source_version = epoch.0, mirror_version = epoch.1, "Create pass already ran for epoch");
            return Vec::new();
        }
        self.last_epoch = Some(epoch);

        let pending = self.pending_preview();
        debug!(
            source_version = epoch.0,
            mirror_version = epoch.1,
            pending = pending.len(),
            "Computed pending creates"
        );
        pending
    }

    /// Returns the creates the next pass would emit, without consuming the
    /// epoch.
    pub fn pending_preview(&self) -> Vec<PendingCreate> {
        let suppress = self.config.deletion_policy == MirrorDeletionPolicy::Suppress;
        diff(&self.source, &self.mirror)
            .into_iter()
            .filter(|pending| !self.unconfirmed.contains_key(pending.task_id()))
            .filter(|pending| !(suppress && self.suppressed.contains(pending.task_id())))
            .collect()
    }

    /// Records a successful create so it is not emitted again before the
    /// mirror reflects it.
    pub fn record_created(&mut self, item: &MirrorItem) {
        self.unconfirmed.insert(item.task_id.clone(), 0);
        if self.config.deletion_policy == MirrorDeletionPolicy::Suppress {
            self.suppressed.insert(item.task_id.clone());
        }
    }

    /// Returns the number of created items not yet seen in the mirror.
    pub fn unconfirmed_count(&self) -> usize {
        self.unconfirmed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, title: &str) -> TaskItem {
        TaskItem::new(id, title, Utc::now())
    }

    fn mirror_item(task_id: &str) -> MirrorItem {
        MirrorItem::new(task_id, "mirrored", Utc::now())
    }

    fn ids(pending: &[PendingCreate]) -> Vec<&str> {
        pending.iter().map(PendingCreate::task_id).collect()
    }

    #[test]
    fn diff_emits_missing_task() {
        let source = SourceSnapshot::new(vec![task("a", "Buy milk")], 1);
        let mirror = MirrorSnapshot::default();

        let pending = diff(&source, &mirror);
        assert_eq!(ids(&pending), vec!["a"]);
        assert_eq!(pending[0].task.title, "Buy milk");
    }

    #[test]
    fn diff_skips_mirrored_tasks() {
        let source = SourceSnapshot::new(vec![task("a", "A"), task("b", "B")], 1);
        let mirror = MirrorSnapshot::new(vec![mirror_item("a")], 1, 1);

        assert_eq!(ids(&diff(&source, &mirror)), vec!["b"]);
    }

    #[test]
    fn diff_ignores_title_changes() {
        let source = SourceSnapshot::new(vec![task("a", "Renamed")], 1);
        let mirror = MirrorSnapshot::new(vec![MirrorItem::new("a", "Original", Utc::now())], 1, 1);

        assert!(diff(&source, &mirror).is_empty());
    }

    #[test]
    fn diff_keeps_source_order_without_duplicates() {
        let source = SourceSnapshot::new(
            vec![task("c", "C"), task("a", "A"), task("c", "C again"), task("b", "B")],
            1,
        );
        let mirror = MirrorSnapshot::new(vec![mirror_item("a")], 1, 1);

        let pending = diff(&source, &mirror);
        assert_eq!(ids(&pending), vec!["c", "b"]);
        assert_eq!(pending[0].task.title, "C");
    }

    #[test]
    fn diff_is_deterministic() {
        let source = SourceSnapshot::new(vec![task("a", "A"), task("b", "B"), task("c", "C")], 1);
        let mirror = MirrorSnapshot::new(vec![mirror_item("b")], 1, 1);

        assert_eq!(diff(&source, &mirror), diff(&source, &mirror));
    }

    #[test]
    fn diff_reaches_fixed_point_after_create() {
        let source = SourceSnapshot::new(vec![task("a", "Buy milk")], 1);
        let empty = MirrorSnapshot::default();
        assert_eq!(ids(&diff(&source, &empty)), vec!["a"]);

        let after = MirrorSnapshot::new(vec![mirror_item("a")], 2, 1);
        assert!(diff(&source, &after).is_empty());
    }

    #[test]
    fn reconciler_defers_until_mirror_queried() {
        let mut reconciler = Reconciler::default();
        reconciler.publish_source(vec![task("a", "A")]);

        assert!(reconciler.mirror_is_stale());
        assert!(reconciler.take_pending().is_empty());

        reconciler.publish_mirror(vec![]);
        assert!(!reconciler.mirror_is_stale());
        assert_eq!(ids(&reconciler.take_pending()), vec!["a"]);
    }

    #[test]
    fn reconciler_new_source_marks_mirror_stale() {
        let mut reconciler = Reconciler::default();
        reconciler.publish_source(vec![task("a", "A")]);
        reconciler.publish_mirror(vec![]);
        assert!(!reconciler.mirror_is_stale());

        let version = reconciler.publish_source(vec![task("a", "A")]);
        assert_eq!(version, 2);
        assert!(reconciler.mirror_is_stale());
    }

    #[test]
    fn reconciler_runs_create_pass_once_per_epoch() {
        let mut reconciler = Reconciler::default();
        reconciler.publish_source(vec![task("a", "A")]);
        reconciler.publish_mirror(vec![]);

        assert_eq!(reconciler.take_pending().len(), 1);
        assert!(reconciler.take_pending().is_empty());

        // A fresh mirror query opens a new epoch.
        reconciler.publish_mirror(vec![]);
        assert_eq!(reconciler.take_pending().len(), 1);
    }

    #[test]
    fn reconciler_holds_back_unconfirmed_creates() {
        let mut reconciler = Reconciler::default();
        reconciler.publish_source(vec![task("a", "A"), task("b", "B")]);
        reconciler.publish_mirror(vec![]);
        assert_eq!(reconciler.take_pending().len(), 2);

        reconciler.record_created(&mirror_item("a"));

        // The store has not caught up with the write yet.
        reconciler.publish_source(vec![task("a", "A"), task("b", "B")]);
        reconciler.publish_mirror(vec![]);
        assert_eq!(ids(&reconciler.take_pending()), vec!["b"]);
        assert_eq!(reconciler.unconfirmed_count(), 1);
    }

    #[test]
    fn reconciler_confirms_created_items() {
        let mut reconciler = Reconciler::default();
        reconciler.publish_source(vec![task("a", "A")]);
        reconciler.publish_mirror(vec![]);
        reconciler.take_pending();
        reconciler.record_created(&mirror_item("a"));

        reconciler.publish_mirror(vec![mirror_item("a")]);
        assert_eq!(reconciler.unconfirmed_count(), 0);
        assert!(reconciler.take_pending().is_empty());
    }

    #[test]
    fn reconciler_releases_lost_creates_after_grace() {
        let mut reconciler = Reconciler::new(ReconcilerConfig::default().with_confirm_grace(2));
        reconciler.publish_source(vec![task("a", "A")]);
        reconciler.publish_mirror(vec![]);
        reconciler.take_pending();
        reconciler.record_created(&mirror_item("a"));

        reconciler.publish_mirror(vec![]);
        assert!(reconciler.take_pending().is_empty());

        reconciler.publish_mirror(vec![]);
        assert_eq!(reconciler.unconfirmed_count(), 0);
        assert_eq!(ids(&reconciler.take_pending()), vec!["a"]);
    }

    #[test]
    fn recreate_policy_restores_deleted_mirror_item() {
        let mut reconciler = Reconciler::default();
        reconciler.publish_source(vec![task("a", "A")]);
        reconciler.publish_mirror(vec![mirror_item("a")]);
        assert!(reconciler.take_pending().is_empty());

        // Page deleted by hand in the mirror.
        reconciler.publish_source(vec![task("a", "A")]);
        reconciler.publish_mirror(vec![]);
        assert_eq!(ids(&reconciler.take_pending()), vec!["a"]);
    }

    #[test]
    fn suppress_policy_keeps_deleted_mirror_item_deleted() {
        let config = ReconcilerConfig::default().with_deletion_policy(MirrorDeletionPolicy::Suppress);
        let mut reconciler = Reconciler::new(config);
        reconciler.publish_source(vec![task("a", "A"), task("b", "B")]);
        reconciler.publish_mirror(vec![mirror_item("a")]);
        assert_eq!(ids(&reconciler.take_pending()), vec!["b"]);
        reconciler.record_created(&mirror_item("b"));

        reconciler.publish_source(vec![task("a", "A"), task("b", "B")]);
        reconciler.publish_mirror(vec![]);
        assert!(reconciler.take_pending().is_empty());
    }

    #[test]
    fn deletion_policy_deserializes_lowercase() {
        let policy: MirrorDeletionPolicy = serde_json::from_str("\"suppress\"").unwrap();
        assert_eq!(policy, MirrorDeletionPolicy::Suppress);
        assert_eq!(MirrorDeletionPolicy::default(), MirrorDeletionPolicy::Recreate);
    }
}
