//! Snapshot Manager
//!
//! Owns the single published [`Snapshot`] and replaces it on refresh.
//!
//! ```text
//! refresh():
//!   latest = segment metas the writer committed
//!   current.segments == latest ?  ── yes ──▶ false (nothing reopened)
//!            │ no
//!            ▼
//!   reader.reload() → searcher → Snapshot{generation+1} → ArcSwap::store → true
//! ```
//!
//! Queries read `current` through `ArcSwap::load_full`, so they always get a
//! whole snapshot (old or new) and never wait on a refresh.

use super::snapshot::{SegmentFingerprint, Snapshot};
use crate::errors::{RepositoryError, Result};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tantivy::{Index, IndexReader, ReloadPolicy};
use tracing::debug;

pub struct SnapshotManager {
    index: Index,
    /// Reload handle. Reloads reuse the directory's open segment files.
    reader: IndexReader,
    current: ArcSwap<Snapshot>,
    apply_all_deletes: bool,
    generation: AtomicU64,
    refreshes: AtomicU64,
    live: Arc<AtomicUsize>,
}

impl SnapshotManager {
    /// Open the initial snapshot over whatever the index has committed.
    pub fn open(index: Index, apply_all_deletes: bool) -> Result<Self> {
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(RepositoryError::Open)?;

        let live = Arc::new(AtomicUsize::new(0));
        let initial = Snapshot::new(0, reader.searcher(), Arc::clone(&live));
        debug!(
            segments = initial.segments().num_segments(),
            num_docs = initial.num_docs(),
            apply_all_deletes,
            "opened initial snapshot"
        );

        Ok(Self {
            index,
            reader,
            current: ArcSwap::from_pointee(initial),
            apply_all_deletes,
            generation: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            live,
        })
    }

    /// The published snapshot. Callers keep the returned `Arc` for the whole
    /// operation instead of calling this again.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn apply_all_deletes(&self) -> bool {
        self.apply_all_deletes
    }

    /// Publish a new snapshot if the committed segment set changed.
    ///
    /// Callers serialize refreshes (the commit coordinator holds its lock).
    pub fn refresh(&self) -> Result<bool> {
        let current = self.current.load_full();

        let metas = self
            .index
            .searchable_segment_metas()
            .map_err(RepositoryError::Commit)?;
        let latest = SegmentFingerprint::from_metas(&metas);

        if !current
            .segments()
            .differs_from(&latest, self.apply_all_deletes)
        {
            debug!(generation = current.generation(), "segment set unchanged");
            return Ok(false);
        }

        self.reader.reload().map_err(RepositoryError::Commit)?;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let next = Snapshot::new(generation, self.reader.searcher(), Arc::clone(&self.live));

        debug!(
            generation,
            segments = next.segments().num_segments(),
            num_docs = next.num_docs(),
            deleted_docs = next.segments().num_deleted_docs(),
            "published snapshot"
        );
        self.current.store(Arc::new(next));
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Refreshes that published a new snapshot
    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Snapshots not yet released, the published one included
    pub fn live_snapshots(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}
