//! Snapshot: an immutable point-in-time view of the index.
//!
//! A snapshot pins the segment readers it was opened with. Dropping the last
//! `Arc<Snapshot>` releases them; the engine's directory keeps unchanged
//! segments mapped for whichever newer snapshot still uses them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tantivy::{Searcher, SegmentId, SegmentMeta};
use tracing::trace;

/// Segment set seen by a reader: segment id -> deleted doc count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentFingerprint {
    segments: BTreeMap<SegmentId, u32>,
}

impl SegmentFingerprint {
    pub fn from_searcher(searcher: &Searcher) -> Self {
        Self {
            segments: searcher
                .segment_readers()
                .iter()
                .map(|reader| (reader.segment_id(), reader.num_deleted_docs()))
                .collect(),
        }
    }

    pub fn from_metas(metas: &[SegmentMeta]) -> Self {
        Self {
            segments: metas
                .iter()
                .map(|meta| (meta.id(), meta.num_deleted_docs()))
                .collect(),
        }
    }

    /// Would a reader over `latest` see something this one does not?
    ///
    /// Without `apply_all_deletes`, new deletes inside an unchanged segment set
    /// do not count; they surface with the next segment change.
    pub fn differs_from(&self, latest: &SegmentFingerprint, apply_all_deletes: bool) -> bool {
        if apply_all_deletes {
            return self.segments != latest.segments;
        }
        !self.segments.keys().eq(latest.segments.keys())
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn num_deleted_docs(&self) -> u64 {
        self.segments.values().map(|&d| d as u64).sum()
    }
}

pub struct Snapshot {
    generation: u64,
    searcher: Searcher,
    segments: SegmentFingerprint,
    live: Arc<AtomicUsize>,
}

impl Snapshot {
    pub(crate) fn new(generation: u64, searcher: Searcher, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        let segments = SegmentFingerprint::from_searcher(&searcher);
        Self {
            generation,
            searcher,
            segments,
            live,
        }
    }

    /// Monotonic publish counter, 0 for the snapshot opened at construction
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    pub fn segments(&self) -> &SegmentFingerprint {
        &self.segments
    }

    /// Live documents visible in this snapshot
    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("generation", &self.generation)
            .field("segments", &self.segments.num_segments())
            .field("num_docs", &self.num_docs())
            .finish()
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        trace!(generation = self.generation, "snapshot released");
    }
}
