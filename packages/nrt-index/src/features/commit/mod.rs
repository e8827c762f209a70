pub mod coordinator;

pub use coordinator::{CommitCoordinator, CommitOutcome};
