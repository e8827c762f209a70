//! Repository building blocks
//!
//! ```text
//! create/update/delete ──▶ writer::MutationLog ──▶ engine write buffer
//!                                                        │
//! commit ──▶ commit::CommitCoordinator ── flush ─────────┘
//!                      │
//!                      └─ refresh ──▶ snapshot::SnapshotManager ──▶ Arc<Snapshot>
//!                                                                       │
//! query ──▶ query::QueryExecutor (one captured snapshot) ◀──────────────┘
//! ```
//!
//! `document` and `key_codec` turn caller keys and values into engine
//! documents and back.

pub mod commit;
pub mod document;
pub mod key_codec;
pub mod query;
pub mod snapshot;
pub mod writer;
