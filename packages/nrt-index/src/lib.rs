/*
 * nrt-index - Near-Real-Time Index Repository
 *
 * Feature-First Layout:
 * - config/     : Presets, YAML v1 overrides, environment switch
 * - features/   : Vertical slices (key_codec → document → writer → commit → snapshot → query)
 * - repository  : Facade tying the slices to one engine index
 *
 * Model:
 * - Mutations are buffered and invisible until commit
 * - Commit = flush + open-if-changed refresh, one at a time
 * - Queries run on one atomically published snapshot, lock-free
 */

// Crate-level lint configuration
#![allow(clippy::module_inception)] // snapshot::snapshot naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::should_implement_trait)] // from_str naming intentional
#![allow(clippy::type_complexity)] // Collector and serializer trait objects

pub mod config;
pub mod errors;
pub mod features;
pub mod repository;

pub use config::{Preset, RepositoryConfig};
pub use errors::{RepositoryError, Result, SerializationError};
pub use features::commit::CommitOutcome;
pub use features::document::{
    FieldKind, FieldSerializer, FieldValue, Fields, JsonFieldSerializer, RepositorySchema,
    TextSerializer, KEY_FIELD,
};
pub use features::key_codec::{JsonKeyCodec, KeyCodec, StringKeyCodec};
pub use features::query::{IndexQuery, QueryOutcome, ResultCollector, VecCollector};
pub use features::snapshot::Snapshot;
pub use features::writer::MutationRecord;
pub use repository::{IndexRepository, RepositoryStats};
