//! Task and mirror item types.
//!
//! A [`TaskItem`] is what the task source reports; a [`MirrorItem`] is the
//! page the mirror store holds for a task. The mirror item's `task_id` is the
//! only link between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task read from the task source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    /// Provider-assigned identifier, stable and unique.
    pub id: String,
    /// Task title.
    pub title: String,
    /// When the task was last updated at the source.
    pub updated_at: DateTime<Utc>,
}

impl TaskItem {
    /// Creates a new task item.
    pub fn new(id: impl Into<String>, title: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            updated_at,
        }
    }
}

/// An item in the mirror store, marking a task as already reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorItem {
    /// Identifier of the [`TaskItem`] this item mirrors.
    pub task_id: String,
    /// Title as written to the mirror.
    pub title: String,
    /// Creation timestamp recorded in the mirror.
    pub created_at: DateTime<Utc>,
}

impl MirrorItem {
    /// Creates a new mirror item.
    pub fn new(
        task_id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            title: title.into(),
            created_at,
        }
    }

    /// Builds the mirror item that a create for `task` is expected to yield.
    pub fn for_task(task: &TaskItem) -> Self {
        Self::new(&task.id, &task.title, task.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mirror_item_for_task_copies_fields() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let task = TaskItem::new("a", "Buy milk", updated);

        let item = MirrorItem::for_task(&task);

        assert_eq!(item.task_id, "a");
        assert_eq!(item.title, "Buy milk");
        assert_eq!(item.created_at, updated);
    }

    #[test]
    fn task_item_serializes_snake_case() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let task = TaskItem::new("a", "Buy milk", updated);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["updated_at"], "2024-03-15T10:00:00Z");
    }
}
