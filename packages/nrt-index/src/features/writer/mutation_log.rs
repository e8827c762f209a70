//! Mutation Log
//!
//! Appends inserts, upserts and deletes to the engine's write buffer. Nothing
//! appended here is visible to queries until the next commit publishes a
//! snapshot.
//!
//! ```text
//! append ─▶ gate.read ─┬─ not flushing ─▶ writer.read ─▶ engine buffer
//!                      └─ flushing ─────▶ staged queue ─┐
//! commit ─▶ begin_flush ─▶ writer.write ─▶ commit       │
//!        ─▶ finish_flush ─▶ drain staged ◀──────────────┘
//! ```
//!
//! The engine's flush needs the writer exclusively. Appends that arrive
//! meanwhile are staged in arrival order and drained right after the flush,
//! so they land in the next commit instead of waiting.

use crate::errors::{RepositoryError, Result};
use crate::features::document::{DocumentBuilder, IndexDocument};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tantivy::indexer::UserOperation;
use tantivy::{IndexWriter, TantivyDocument, Term};
use tracing::trace;

/// One single-key mutation, applied in program order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord<K, V> {
    /// Key must not be live; inserting a live key leaves two documents.
    Insert(K, V),
    /// Replace-or-insert by identity
    Update(K, V),
    /// No-op when the key is absent
    Delete(K),
}

/// Engine-level operation prepared from a record.
enum Prepared {
    Add(TantivyDocument),
    Upsert(Term, TantivyDocument),
    Delete(Term),
}

impl Prepared {
    fn into_operations(self, out: &mut Vec<UserOperation>) {
        match self {
            Prepared::Add(doc) => out.push(UserOperation::Add(doc)),
            Prepared::Upsert(term, doc) => {
                out.push(UserOperation::Delete(term));
                out.push(UserOperation::Add(doc));
            }
            Prepared::Delete(term) => out.push(UserOperation::Delete(term)),
        }
    }
}

pub struct MutationLog<K, V> {
    writer: Arc<RwLock<IndexWriter>>,
    builder: DocumentBuilder<K, V>,
    pending: AtomicU64,
    /// `true` while a commit owns the writer
    flushing: RwLock<bool>,
    staged: Mutex<Vec<UserOperation>>,
}

impl<K, V> MutationLog<K, V> {
    pub fn new(writer: Arc<RwLock<IndexWriter>>, builder: DocumentBuilder<K, V>) -> Self {
        Self {
            writer,
            builder,
            pending: AtomicU64::new(0),
            flushing: RwLock::new(false),
            staged: Mutex::new(Vec::new()),
        }
    }

    pub fn builder(&self) -> &DocumentBuilder<K, V> {
        &self.builder
    }

    /// Append an insert. The caller guarantees the key is not live.
    pub fn create(&self, key: &K, value: &V) -> Result<()> {
        let (identity, doc) = self.builder.build(key, value)?.into_parts();

        let staged = self.submit(vec![UserOperation::Add(doc)], 1)?;
        trace!(key = %identity, staged, "buffered insert");
        Ok(())
    }

    /// Append delete-by-identity followed by insert, as one engine batch.
    ///
    /// A key that was never created is simply inserted.
    pub fn update(&self, key: &K, value: &V) -> Result<()> {
        let doc = self.builder.build(key, value)?;
        let term = self.builder.keys().term_for(doc.identity());
        let (identity, doc) = doc.into_parts();

        let staged = self.submit(vec![UserOperation::Delete(term), UserOperation::Add(doc)], 1)?;
        trace!(key = %identity, staged, "buffered upsert");
        Ok(())
    }

    /// Append delete-by-identity. Absent keys are a no-op at commit.
    pub fn delete(&self, key: &K) -> Result<()> {
        let term = self.builder.keys().identity_term(key)?;

        let staged = self.submit(vec![UserOperation::Delete(term)], 1)?;
        trace!(staged, "buffered delete");
        Ok(())
    }

    pub fn apply(&self, record: &MutationRecord<K, V>) -> Result<()> {
        match record {
            MutationRecord::Insert(key, value) => self.create(key, value),
            MutationRecord::Update(key, value) => self.update(key, value),
            MutationRecord::Delete(key) => self.delete(key),
        }
    }

    /// Apply records in order as a single engine batch.
    ///
    /// Documents are built in parallel first; if any record fails to encode,
    /// nothing is appended. Returns the number of records applied.
    pub fn apply_batch(&self, records: &[MutationRecord<K, V>]) -> Result<usize>
    where
        K: Sync,
        V: Sync,
    {
        if records.is_empty() {
            return Ok(0);
        }

        let prepared = records
            .par_iter()
            .map(|record| self.prepare(record))
            .collect::<Result<Vec<_>>>()?;

        let mut operations = Vec::with_capacity(prepared.len() * 2);
        for op in prepared {
            op.into_operations(&mut operations);
        }

        let staged = self.submit(operations, records.len() as u64)?;
        trace!(records = records.len(), staged, "buffered batch");
        Ok(records.len())
    }

    fn prepare(&self, record: &MutationRecord<K, V>) -> Result<Prepared> {
        Ok(match record {
            MutationRecord::Insert(key, value) => {
                let (_, doc) = self.builder.build(key, value)?.into_parts();
                Prepared::Add(doc)
            }
            MutationRecord::Update(key, value) => {
                let doc: IndexDocument = self.builder.build(key, value)?;
                let term = self.builder.keys().term_for(doc.identity());
                Prepared::Upsert(term, doc.into_parts().1)
            }
            MutationRecord::Delete(key) => Prepared::Delete(self.builder.keys().identity_term(key)?),
        })
    }

    /// Hand operations to the writer, or stage them while a flush runs.
    /// Returns whether they were staged.
    ///
    /// Counted under the gate so `begin_flush` reads an exact pending count.
    fn submit(&self, operations: Vec<UserOperation>, records: u64) -> Result<bool> {
        let flushing = self.flushing.read();
        if *flushing {
            self.staged.lock().extend(operations);
            self.pending.fetch_add(records, Ordering::Relaxed);
            return Ok(true);
        }

        self.writer
            .read()
            .run(operations)
            .map_err(RepositoryError::IndexWrite)?;
        self.pending.fetch_add(records, Ordering::Relaxed);
        Ok(false)
    }

    /// Mutations accepted since the last successful commit
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Route new appends to the staging queue. Returns the number of
    /// mutations already in the writer, which the flush will cover.
    pub(crate) fn begin_flush(&self) -> u64 {
        let mut flushing = self.flushing.write();
        *flushing = true;
        self.pending()
    }

    /// Drain staged appends into the writer and reopen the direct path.
    /// Returns how many engine operations were drained.
    pub(crate) fn finish_flush(&self) -> tantivy::Result<usize> {
        let mut flushing = self.flushing.write();
        *flushing = false;

        let staged = std::mem::take(&mut *self.staged.lock());
        if staged.is_empty() {
            return Ok(0);
        }
        let drained = staged.len();
        // Gate still held: nothing can overtake the staged operations.
        self.writer.read().run(staged)?;
        Ok(drained)
    }

    /// Called by the commit coordinator once a flush that covered `flushed`
    /// mutations succeeded.
    pub(crate) fn mark_committed(&self, flushed: u64) {
        let _ = self
            .pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |pending| {
                Some(pending.saturating_sub(flushed))
            });
    }
}
