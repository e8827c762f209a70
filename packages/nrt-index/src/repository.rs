//! Near-real-time index repository
//!
//! # Architecture
//!
//! ```text
//! create/update/delete ─▶ MutationLog ─▶ IndexWriter (buffered, invisible)
//!                                              │
//! commit ─▶ CommitCoordinator ── flush ────────┘
//!                  │
//!                  └─ refresh ─▶ SnapshotManager ─▶ ArcSwap<Snapshot>
//!                                                        │
//! query ─▶ QueryExecutor ◀── captured once ──────────────┘
//! ```
//!
//! # Usage
//!
//! ```text
//! let schema = RepositorySchema::builder().text("body").build()?;
//! let repo = IndexRepository::in_ram(
//!     schema,
//!     JsonKeyCodec::<u64>::new(),
//!     TextSerializer::new("body"),
//!     RepositoryConfig::default(),
//! )?;
//!
//! repo.create(&1, &"apple".to_string())?;
//! repo.commit()?;
//!
//! let mut hits = VecCollector::new();
//! repo.query(&IndexQuery::text("apple"), 10, &mut hits)?;
//! ```

use crate::config::RepositoryConfig;
use crate::errors::{RepositoryError, Result};
use crate::features::commit::{CommitCoordinator, CommitOutcome};
use crate::features::document::{DocumentBuilder, FieldSerializer, RepositorySchema};
use crate::features::key_codec::{KeyCodec, KeyField};
use crate::features::query::{IndexQuery, QueryExecutor, QueryOutcome, ResultCollector};
use crate::features::snapshot::{Snapshot, SnapshotManager};
use crate::features::writer::{MutationLog, MutationRecord};

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexWriter, TantivyError};
use tracing::{info, warn};

/// Point-in-time counters for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RepositoryStats {
    /// Mutations accepted since the last successful commit
    pub pending_mutations: u64,
    pub commits: u64,
    /// Commits that published a new snapshot
    pub refreshes: u64,
    pub snapshot_generation: u64,
    /// Snapshots still held somewhere, the published one included
    pub live_snapshots: usize,
    /// Live documents in the published snapshot
    pub num_docs: u64,
}

/// Key-value index with explicit commits and snapshot-isolated queries.
pub struct IndexRepository<K, V> {
    schema: Arc<RepositorySchema>,
    config: RepositoryConfig,

    /// Shared with the mutation log; exclusive only while flushing
    writer: Arc<RwLock<IndexWriter>>,

    log: MutationLog<K, V>,
    snapshots: SnapshotManager,
    coordinator: CommitCoordinator,
    executor: QueryExecutor<K>,
}

impl<K, V> IndexRepository<K, V> {
    /// Bind to an engine index that is already open.
    ///
    /// The index schema must carry the `_key` identity field. `config` is
    /// used as given; the `NRT_INDEX_APPLY_ALL_DELETES` environment switch
    /// only applies when the caller opts in with
    /// [`RepositoryConfig::with_env_overrides`].
    pub fn from_index(
        index: Index,
        codec: impl KeyCodec<K> + 'static,
        serializer: impl FieldSerializer<V> + 'static,
        config: RepositoryConfig,
    ) -> Result<Self> {
        config.validate()?;
        let schema = Arc::new(RepositorySchema::from_tantivy(index.schema())?);

        let threads = config.resolved_writer_threads();
        let writer: IndexWriter = index
            .writer_with_num_threads(threads, config.writer_heap_bytes)
            .map_err(RepositoryError::Open)?;
        let writer = Arc::new(RwLock::new(writer));

        let keys = KeyField::new(schema.key_field(), codec);
        let builder = DocumentBuilder::new(Arc::clone(&schema), keys.clone(), serializer);
        let snapshots = SnapshotManager::open(index, config.apply_all_deletes)?;

        info!(
            fields = schema.field_names().count(),
            writer_threads = threads,
            writer_heap_bytes = config.writer_heap_bytes,
            apply_all_deletes = config.apply_all_deletes,
            num_docs = snapshots.current().num_docs(),
            "index repository opened"
        );

        Ok(Self {
            log: MutationLog::new(Arc::clone(&writer), builder),
            executor: QueryExecutor::new(Arc::clone(&schema), keys),
            schema,
            config,
            writer,
            snapshots,
            coordinator: CommitCoordinator::new(),
        })
    }

    /// Create a repository over a fresh in-memory index.
    pub fn in_ram(
        schema: RepositorySchema,
        codec: impl KeyCodec<K> + 'static,
        serializer: impl FieldSerializer<V> + 'static,
        config: RepositoryConfig,
    ) -> Result<Self> {
        let index = Index::create_in_ram(schema.schema().clone());
        Self::from_index(index, codec, serializer, config)
    }

    /// Open the index under `dir`, creating the directory and index if needed.
    ///
    /// An existing index must have been created with the same schema.
    pub fn open_in_dir(
        dir: impl AsRef<Path>,
        schema: RepositorySchema,
        codec: impl KeyCodec<K> + 'static,
        serializer: impl FieldSerializer<V> + 'static,
        config: RepositoryConfig,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let directory =
            MmapDirectory::open(dir).map_err(|e| RepositoryError::Open(TantivyError::from(e)))?;
        let index = Index::open_or_create(directory, schema.schema().clone())
            .map_err(RepositoryError::Open)?;

        info!(path = %dir.display(), "opened index directory");
        Self::from_index(index, codec, serializer, config)
    }

    /// Insert a document for a key that is not live.
    ///
    /// Creating a key that is already live leaves two documents for it; use
    /// [`update`](Self::update) when unsure.
    pub fn create(&self, key: &K, value: &V) -> Result<()> {
        self.log.create(key, value)
    }

    /// Replace the document for `key`, or insert it if there is none.
    pub fn update(&self, key: &K, value: &V) -> Result<()> {
        self.log.update(key, value)
    }

    /// Remove the document for `key`. Absent keys are not an error.
    pub fn delete(&self, key: &K) -> Result<()> {
        self.log.delete(key)
    }

    pub fn apply(&self, record: &MutationRecord<K, V>) -> Result<()> {
        self.log.apply(record)
    }

    /// Apply records in order; if any fails to encode, none are applied.
    pub fn apply_batch(&self, records: &[MutationRecord<K, V>]) -> Result<usize>
    where
        K: Sync,
        V: Sync,
    {
        self.log.apply_batch(records)
    }

    /// Predicate matching exactly the document stored for `key`.
    pub fn key_query(&self, key: &K) -> Result<IndexQuery> {
        let identity = self.log.builder().keys().identity_value(key)?;
        Ok(IndexQuery::Key(identity))
    }

    /// Flush buffered mutations and publish a new snapshot if anything changed.
    ///
    /// Mutations submitted while the flush runs are not blocked; they land in
    /// the next commit.
    pub fn commit(&self) -> Result<CommitOutcome> {
        self.coordinator
            .commit(&self.writer, &self.log, &self.snapshots)
    }

    /// Run `query` against the published snapshot.
    pub fn query(
        &self,
        query: &IndexQuery,
        limit: usize,
        collector: &mut dyn ResultCollector<K>,
    ) -> Result<QueryOutcome> {
        let snapshot = self.snapshots.current();
        self.executor.execute(&snapshot, query, limit, collector)
    }

    /// [`query`](Self::query) with the configured default limit.
    pub fn query_default(
        &self,
        query: &IndexQuery,
        collector: &mut dyn ResultCollector<K>,
    ) -> Result<QueryOutcome> {
        self.query(query, self.config.default_limit, collector)
    }

    /// Run `query` against a snapshot captured earlier with
    /// [`snapshot`](Self::snapshot).
    pub fn query_snapshot(
        &self,
        snapshot: &Snapshot,
        query: &IndexQuery,
        limit: usize,
        collector: &mut dyn ResultCollector<K>,
    ) -> Result<QueryOutcome> {
        self.executor.execute(snapshot, query, limit, collector)
    }

    /// The published snapshot. Holding it pins its segments until dropped.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.current()
    }

    pub fn stats(&self) -> RepositoryStats {
        let current = self.snapshots.current();
        RepositoryStats {
            pending_mutations: self.log.pending(),
            commits: self.coordinator.commits(),
            refreshes: self.snapshots.refreshes(),
            snapshot_generation: current.generation(),
            live_snapshots: self.snapshots.live_snapshots(),
            num_docs: current.num_docs(),
        }
    }

    pub fn schema(&self) -> &Arc<RepositorySchema> {
        &self.schema
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Shut the writer down, waiting for background merges.
    ///
    /// Mutations not yet committed are discarded. Snapshots callers still
    /// hold stay readable.
    pub fn close(self) -> Result<()> {
        let Self {
            writer,
            log,
            snapshots,
            ..
        } = self;

        let pending = log.pending();
        if pending > 0 {
            warn!(pending, "closing with uncommitted mutations");
        }
        let generation = snapshots.generation();
        drop(log);
        drop(snapshots);

        let writer = Arc::try_unwrap(writer)
            .map_err(|_| {
                RepositoryError::Commit(TantivyError::InternalError(
                    "index writer still shared at close".to_string(),
                ))
            })?
            .into_inner();
        writer
            .wait_merging_threads()
            .map_err(RepositoryError::Commit)?;

        info!(generation, "index repository closed");
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for IndexRepository<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRepository")
            .field("config", &self.config)
            .field("snapshot", &self.snapshots.current())
            .field("pending", &self.log.pending())
            .finish()
    }
}
