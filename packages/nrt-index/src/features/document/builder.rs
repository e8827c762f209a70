//! Document Builder
//!
//! ```text
//! (key, value) → KeyField ─────────────┐
//!              → FieldSerializer → check names/kinds → TantivyDocument
//! ```

use super::schema::{FieldKind, RepositorySchema, KEY_FIELD};
use super::serializer::{FieldSerializer, FieldValue};
use crate::errors::SerializationError;
use crate::features::key_codec::KeyField;
use std::sync::Arc;
use tantivy::TantivyDocument;

/// A document ready for the writer, with its encoded identity kept alongside
/// so upserts and deletes need not re-encode the key.
#[derive(Debug, Clone)]
pub struct IndexDocument {
    identity: String,
    doc: TantivyDocument,
}

impl IndexDocument {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn document(&self) -> &TantivyDocument {
        &self.doc
    }

    pub fn into_parts(self) -> (String, TantivyDocument) {
        (self.identity, self.doc)
    }
}

pub struct DocumentBuilder<K, V> {
    schema: Arc<RepositorySchema>,
    keys: KeyField<K>,
    serializer: Arc<dyn FieldSerializer<V>>,
}

impl<K, V> Clone for DocumentBuilder<K, V> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            keys: self.keys.clone(),
            serializer: Arc::clone(&self.serializer),
        }
    }
}

impl<K, V> DocumentBuilder<K, V> {
    pub fn new(
        schema: Arc<RepositorySchema>,
        keys: KeyField<K>,
        serializer: impl FieldSerializer<V> + 'static,
    ) -> Self {
        Self {
            schema,
            keys,
            serializer: Arc::new(serializer),
        }
    }

    pub fn keys(&self) -> &KeyField<K> {
        &self.keys
    }

    pub fn schema(&self) -> &Arc<RepositorySchema> {
        &self.schema
    }

    /// Build the document for one (key, value) pair.
    pub fn build(&self, key: &K, value: &V) -> Result<IndexDocument, SerializationError> {
        let identity = self.keys.identity_value(key)?;

        let mut doc = TantivyDocument::default();
        doc.add_text(self.keys.field(), &identity);

        for (name, value) in self.serializer.to_fields(value)? {
            if name == KEY_FIELD {
                return Err(SerializationError::new(format!(
                    "serializer emitted the reserved '{}' field",
                    KEY_FIELD
                )));
            }
            let (field, kind) = self.schema.field(&name).ok_or_else(|| {
                SerializationError::new(format!("field '{}' is not in the schema", name))
            })?;

            match (kind, value) {
                (FieldKind::Text | FieldKind::Keyword, FieldValue::Str(s)) => {
                    doc.add_text(field, s)
                }
                // integers are searchable as text when the schema says so
                (FieldKind::Text | FieldKind::Keyword, FieldValue::I64(i)) => {
                    doc.add_text(field, i.to_string())
                }
                (FieldKind::I64, FieldValue::I64(i)) => doc.add_i64(field, i),
                (FieldKind::I64, FieldValue::Str(s)) => {
                    let parsed = s.trim().parse::<i64>().map_err(|_| {
                        SerializationError::new(format!(
                            "field '{}' expects an integer, got '{}'",
                            name, s
                        ))
                    })?;
                    doc.add_i64(field, parsed)
                }
            }
        }

        Ok(IndexDocument { identity, doc })
    }
}
