//! Documents: schema, value serializers and the builder that joins them.

pub mod builder;
pub mod schema;
pub mod serializer;

pub use builder::{DocumentBuilder, IndexDocument};
pub use schema::{FieldKind, RepositorySchema, RepositorySchemaBuilder, KEY_FIELD};
pub use serializer::{FieldSerializer, FieldValue, Fields, JsonFieldSerializer, TextSerializer};
