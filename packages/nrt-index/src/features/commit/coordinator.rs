//! Commit Coordinator
//!
//! One commit at a time: flush the writer, then refresh the published
//! snapshot. The mutex covers exactly those two steps; queries never touch it.
//! Mutations arriving during the flush are staged by the mutation log and
//! land in the next commit.

use crate::errors::{RepositoryError, Result};
use crate::features::snapshot::SnapshotManager;
use crate::features::writer::MutationLog;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tantivy::{IndexWriter, Opstamp};
use tracing::{debug, warn};

/// Result of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Engine opstamp the flush made durable
    pub opstamp: Opstamp,
    /// A new snapshot was published
    pub refreshed: bool,
    /// Generation published after this commit
    pub generation: u64,
}

#[derive(Default)]
pub struct CommitCoordinator {
    lock: Mutex<()>,
    commits: AtomicU64,
}

impl CommitCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit<K, V>(
        &self,
        writer: &RwLock<IndexWriter>,
        log: &MutationLog<K, V>,
        manager: &SnapshotManager,
    ) -> Result<CommitOutcome> {
        let _serialized = self.lock.lock();
        let start = Instant::now();

        // Appends arriving from here on are staged, not blocked.
        let flushed = log.begin_flush();
        let flush = writer.write().commit();
        let drained = log.finish_flush();

        let opstamp = flush.map_err(|e| {
            warn!(error = %e, pending = flushed, "flush failed");
            RepositoryError::Commit(e)
        })?;
        log.mark_committed(flushed);
        let drained = drained.map_err(|e| {
            warn!(error = %e, opstamp, "draining staged mutations failed");
            RepositoryError::Commit(e)
        })?;

        let refreshed = manager.refresh().map_err(|e| {
            warn!(error = %e, opstamp, "refresh after flush failed");
            e
        })?;
        let generation = manager.generation();
        self.commits.fetch_add(1, Ordering::Relaxed);

        debug!(
            opstamp,
            flushed,
            drained,
            refreshed,
            generation,
            elapsed_us = start.elapsed().as_micros() as u64,
            "commit finished"
        );

        Ok(CommitOutcome {
            opstamp,
            refreshed,
            generation,
        })
    }

    /// Commits that completed flush and refresh
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::document::{DocumentBuilder, RepositorySchema, TextSerializer};
    use crate::features::key_codec::{KeyField, StringKeyCodec};
    use std::sync::Arc;
    use tantivy::Index;

    struct Fixture {
        writer: Arc<RwLock<IndexWriter>>,
        log: MutationLog<String, String>,
        manager: SnapshotManager,
        coordinator: CommitCoordinator,
    }

    fn fixture() -> Fixture {
        let schema = Arc::new(RepositorySchema::builder().text("body").build().unwrap());
        let index = Index::create_in_ram(schema.schema().clone());
        let writer = Arc::new(RwLock::new(
            index.writer_with_num_threads(1, 15_000_000).unwrap(),
        ));
        let keys = KeyField::new(schema.key_field(), StringKeyCodec);
        let builder = DocumentBuilder::new(schema, keys, TextSerializer::new("body"));
        Fixture {
            log: MutationLog::new(Arc::clone(&writer), builder),
            writer,
            manager: SnapshotManager::open(index, true).unwrap(),
            coordinator: CommitCoordinator::new(),
        }
    }

    impl Fixture {
        fn commit(&self) -> CommitOutcome {
            self.coordinator
                .commit(&self.writer, &self.log, &self.manager)
                .unwrap()
        }
    }

    #[test]
    fn test_commit_publishes_and_clears_pending() {
        let f = fixture();
        f.log.create(&"1".to_string(), &"apple".to_string()).unwrap();
        assert_eq!(f.log.pending(), 1);

        let outcome = f.commit();
        assert!(outcome.refreshed);
        assert_eq!(outcome.generation, 1);
        assert_eq!(f.log.pending(), 0);
        assert_eq!(f.manager.current().num_docs(), 1);
        assert_eq!(f.coordinator.commits(), 1);
    }

    #[test]
    fn test_empty_commit_does_not_refresh() {
        let f = fixture();
        f.log.create(&"1".to_string(), &"apple".to_string()).unwrap();
        let first = f.commit();

        let second = f.commit();
        assert!(!second.refreshed);
        assert_eq!(second.generation, first.generation);
        assert_eq!(f.coordinator.commits(), 2);
    }

    #[test]
    fn test_concurrent_commits_are_serialized() {
        let f = fixture();
        std::thread::scope(|scope| {
            for t in 0..4 {
                let f = &f;
                scope.spawn(move || {
                    for i in 0..5 {
                        let key = format!("{}-{}", t, i);
                        f.log.create(&key, &"pear".to_string()).unwrap();
                        f.commit();
                    }
                });
            }
        });

        assert_eq!(f.coordinator.commits(), 20);
        assert_eq!(f.log.pending(), 0);
        assert_eq!(f.manager.current().num_docs(), 20);
    }

    #[test]
    fn test_mutations_during_commit_land_in_next_commit() {
        let f = fixture();
        std::thread::scope(|scope| {
            let f = &f;
            scope.spawn(move || {
                for i in 0..50 {
                    f.log
                        .update(&format!("w-{}", i), &"fig".to_string())
                        .unwrap();
                }
            });
            for _ in 0..10 {
                f.commit();
            }
        });

        f.commit();
        assert_eq!(f.log.pending(), 0);
        assert_eq!(f.manager.current().num_docs(), 50);
    }
}
