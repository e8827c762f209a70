pub mod mutation_log;

pub use mutation_log::{MutationLog, MutationRecord};
