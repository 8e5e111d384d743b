//! Core types: tasks, mirror items, snapshots, reconciliation

pub mod reconcile;
pub mod snapshot;
pub mod task;
pub mod tracing;

pub use reconcile::{MirrorDeletionPolicy, PendingCreate, Reconciler, ReconcilerConfig, diff};
pub use snapshot::{MirrorSnapshot, SourceSnapshot};
pub use task::{MirrorItem, TaskItem};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
