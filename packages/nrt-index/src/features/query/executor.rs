//! Query Executor
//!
//! Runs against a snapshot the caller already captured. Matching, scoring and
//! key resolution all go through that one snapshot's searcher, so a commit
//! landing mid-query cannot mix two points in time.

use super::collector::ResultCollector;
use super::predicate::IndexQuery;
use crate::errors::{RepositoryError, Result};
use crate::features::document::RepositorySchema;
use crate::features::key_codec::KeyField;
use crate::features::snapshot::Snapshot;
use std::ops::ControlFlow;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::TantivyDocument;
use tracing::trace;

/// What a query delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Hits handed to the collector
    pub delivered: usize,
    /// The collector asked to stop before the top-`limit` list ran out
    pub stopped_early: bool,
    /// Generation of the snapshot the query ran on
    pub generation: u64,
}

pub struct QueryExecutor<K> {
    schema: Arc<RepositorySchema>,
    keys: KeyField<K>,
}

impl<K> QueryExecutor<K> {
    pub fn new(schema: Arc<RepositorySchema>, keys: KeyField<K>) -> Self {
        Self { schema, keys }
    }

    /// Deliver up to `limit` hits, best first, to `collector`.
    ///
    /// Equal scores keep the engine's document order, which callers must
    /// treat as unspecified.
    pub fn execute(
        &self,
        snapshot: &Snapshot,
        query: &IndexQuery,
        limit: usize,
        collector: &mut dyn ResultCollector<K>,
    ) -> Result<QueryOutcome> {
        let mut outcome = QueryOutcome {
            delivered: 0,
            stopped_early: false,
            generation: snapshot.generation(),
        };
        let searcher = snapshot.searcher();
        // The engine reserves room for `limit` hits up front.
        let limit = limit.min(searcher.num_docs() as usize);
        if limit == 0 {
            return Ok(outcome);
        }

        let compiled = query.compile(&self.schema, searcher.index())?;

        let top_docs = searcher
            .search(&compiled, &TopDocs::with_limit(limit))
            .map_err(|e| RepositoryError::query(format!("Search failed: {}", e)))?;

        let total = top_docs.len();
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| RepositoryError::query(format!("Failed to retrieve doc: {}", e)))?;
            let key = self
                .keys
                .extract_key(&doc)
                .map_err(|e| RepositoryError::query(format!("Unreadable stored key: {}", e)))?;

            outcome.delivered += 1;
            if let ControlFlow::Break(()) = collector.collect(key, score) {
                outcome.stopped_early = outcome.delivered < total;
                break;
            }
        }

        trace!(
            generation = outcome.generation,
            delivered = outcome.delivered,
            "query finished"
        );
        Ok(outcome)
    }
}
