//! Replacement-style snapshots of the source and mirror sides.
//!
//! Each snapshot carries a version assigned by the reconciler when it is
//! published. Versions only grow; a snapshot never merges into a previous
//! one.

use std::collections::HashSet;

use crate::task::{MirrorItem, TaskItem};

/// Ordered set of tasks from one source poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSnapshot {
    items: Vec<TaskItem>,
    version: u64,
}

impl SourceSnapshot {
    /// Creates a snapshot with the given items and version.
    pub fn new(items: Vec<TaskItem>, version: u64) -> Self {
        Self { items, version }
    }

    /// Returns the tasks in source order.
    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    /// Returns the snapshot version (0 for the initial empty snapshot).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of tasks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the snapshot holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ordered set of mirror items from one mirror query, indexed by task id.
#[derive(Debug, Clone, Default)]
pub struct MirrorSnapshot {
    items: Vec<MirrorItem>,
    task_ids: HashSet<String>,
    version: u64,
    source_version: u64,
}

impl MirrorSnapshot {
    /// Creates a snapshot taken for `source_version`.
    pub fn new(items: Vec<MirrorItem>, version: u64, source_version: u64) -> Self {
        let task_ids = items.iter().map(|item| item.task_id.clone()).collect();
        Self {
            items,
            task_ids,
            version,
            source_version,
        }
    }

    /// Returns the mirror items in query order.
    pub fn items(&self) -> &[MirrorItem] {
        &self.items
    }

    /// Returns true if some mirror item references `task_id`.
    pub fn contains(&self, task_id: &str) -> bool {
        self.task_ids.contains(task_id)
    }

    /// Returns the set of mirrored task ids.
    pub fn task_ids(&self) -> &HashSet<String> {
        &self.task_ids
    }

    /// Returns the snapshot version (0 for the initial empty snapshot).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the source snapshot version this query was taken for.
    pub fn source_version(&self) -> u64 {
        self.source_version
    }

    /// Returns the number of mirror items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the snapshot holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
