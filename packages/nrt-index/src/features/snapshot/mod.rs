//! Published snapshots and the manager that swaps them.

pub mod manager;
pub mod snapshot;

pub use manager::SnapshotManager;
pub use snapshot::{SegmentFingerprint, Snapshot};
