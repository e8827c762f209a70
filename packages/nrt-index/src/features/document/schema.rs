//! Repository Schema
//!
//! # Fields
//!
//! 1. `_key` - Identity (STORED, raw keyword). Always present, reserved.
//! 2. Content fields declared by the caller:
//!    - `Text` - tokenized with the engine's default analyzer (NOT STORED)
//!    - `Keyword` - raw exact match (NOT STORED)
//!    - `I64` - indexed integer (NOT STORED)
//!
//! Only the identity field is ever read back, so nothing else is stored.

use crate::errors::{RepositoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tantivy::schema::{
    Field, FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, INDEXED, TEXT,
};

/// Reserved identity field name
pub const KEY_FIELD: &str = "_key";

const RAW_TOKENIZER: &str = "raw";

/// How a content field is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Keyword,
    I64,
}

/// Builder for [`RepositorySchema`].
#[derive(Debug, Clone, Default)]
pub struct RepositorySchemaBuilder {
    fields: Vec<(String, FieldKind)>,
}

impl RepositorySchemaBuilder {
    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Text)
    }

    pub fn keyword(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Keyword)
    }

    pub fn i64(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::I64)
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind));
        self
    }

    pub fn build(self) -> Result<RepositorySchema> {
        let mut builder = Schema::builder();
        builder.add_text_field(KEY_FIELD, key_options());

        let mut seen = HashMap::new();
        for (name, kind) in self.fields {
            if name == KEY_FIELD {
                return Err(RepositoryError::schema(format!(
                    "'{}' is reserved for the identity field",
                    KEY_FIELD
                )));
            }
            if name.is_empty() {
                return Err(RepositoryError::schema("field name cannot be empty"));
            }
            if seen.insert(name.clone(), kind).is_some() {
                return Err(RepositoryError::schema(format!(
                    "field '{}' declared twice",
                    name
                )));
            }

            match kind {
                FieldKind::Text => builder.add_text_field(&name, TEXT),
                FieldKind::Keyword => builder.add_text_field(&name, keyword_options()),
                FieldKind::I64 => builder.add_i64_field(&name, INDEXED),
            };
        }

        RepositorySchema::from_tantivy(builder.build())
    }
}

fn key_options() -> TextOptions {
    keyword_options().set_stored()
}

fn keyword_options() -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(RAW_TOKENIZER) // No tokenization (exact match)
            .set_index_option(IndexRecordOption::Basic),
    )
}

/// Field handles (cached for performance)
#[derive(Debug, Clone)]
pub struct RepositorySchema {
    schema: Schema,
    key: Field,
    fields: HashMap<String, (Field, FieldKind)>,
    text_fields: Vec<Field>,
}

impl RepositorySchema {
    pub fn builder() -> RepositorySchemaBuilder {
        RepositorySchemaBuilder::default()
    }

    /// Recover the repository view of an existing engine schema.
    ///
    /// Fields the repository cannot address (dates, bytes, ...) are ignored.
    pub fn from_tantivy(schema: Schema) -> Result<Self> {
        let key = schema.get_field(KEY_FIELD).map_err(|_| {
            RepositoryError::schema(format!("index has no '{}' identity field", KEY_FIELD))
        })?;

        let key_entry = schema.get_field_entry(key);
        if !key_entry.is_stored() || classify(key_entry.field_type()) != Some(FieldKind::Keyword) {
            return Err(RepositoryError::schema(format!(
                "'{}' must be a stored raw text field",
                KEY_FIELD
            )));
        }

        let mut fields = HashMap::new();
        let mut text_fields = Vec::new();
        for (field, entry) in schema.fields() {
            if field == key {
                continue;
            }
            let Some(kind) = classify(entry.field_type()) else {
                continue;
            };
            if kind == FieldKind::Text {
                text_fields.push(field);
            }
            fields.insert(entry.name().to_string(), (field, kind));
        }

        Ok(Self {
            schema,
            key,
            fields,
            text_fields,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn key_field(&self) -> Field {
        self.key
    }

    pub fn field(&self, name: &str) -> Option<(Field, FieldKind)> {
        self.fields.get(name).copied()
    }

    /// Default fields for free-text queries
    pub fn text_fields(&self) -> &[Field] {
        &self.text_fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

fn classify(field_type: &FieldType) -> Option<FieldKind> {
    match field_type {
        FieldType::Str(options) => {
            let indexing = options.get_indexing_options()?;
            if indexing.tokenizer() == RAW_TOKENIZER {
                Some(FieldKind::Keyword)
            } else {
                Some(FieldKind::Text)
            }
        }
        FieldType::I64(options) if options.is_indexed() => Some(FieldKind::I64),
        _ => None,
    }
}
