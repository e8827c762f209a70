//! Querying: predicates, collectors and snapshot-bound execution.

pub mod collector;
pub mod executor;
pub mod predicate;

pub use collector::{ResultCollector, VecCollector};
pub use executor::{QueryExecutor, QueryOutcome};
pub use predicate::IndexQuery;
