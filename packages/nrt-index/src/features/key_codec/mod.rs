//! Key Codec
//!
//! Maps an application key to the identity field stored with every document,
//! to the exact-match predicate used by update/delete, and back again when a
//! query result is resolved.
//!
//! ```text
//! key ──encode──▶ "_key" value ──Term──▶ identity predicate
//!  ▲                   │
//!  └──────decode───────┘  (stored field, read back per hit)
//! ```

use crate::errors::SerializationError;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tantivy::query::TermQuery;
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{TantivyDocument, Term};

/// Encodes keys into the identity field.
///
/// Implementations must be total and injective over the key domain and
/// `decode(encode(k)) == k` must hold for every valid key.
pub trait KeyCodec<K>: Send + Sync {
    fn encode(&self, key: &K) -> Result<String, SerializationError>;

    fn decode(&self, encoded: &str) -> Result<K, SerializationError>;
}

/// String keys stored verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKeyCodec;

impl KeyCodec<String> for StringKeyCodec {
    fn encode(&self, key: &String) -> Result<String, SerializationError> {
        Ok(key.clone())
    }

    fn decode(&self, encoded: &str) -> Result<String, SerializationError> {
        Ok(encoded.to_string())
    }
}

/// Any serde key, stored as compact JSON.
///
/// Injective as long as the key's `Serialize` impl is deterministic
/// (avoid `HashMap` inside keys) and the key holds no floats: NaN and both
/// infinities all serialize as `null`, so such keys collide and fail to
/// decode. Use integers or strings for key components.
pub struct JsonKeyCodec<K> {
    _key: PhantomData<fn() -> K>,
}

impl<K> JsonKeyCodec<K> {
    pub fn new() -> Self {
        Self { _key: PhantomData }
    }
}

impl<K> Default for JsonKeyCodec<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for JsonKeyCodec<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for JsonKeyCodec<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonKeyCodec")
    }
}

impl<K> KeyCodec<K> for JsonKeyCodec<K>
where
    K: Serialize + DeserializeOwned,
{
    fn encode(&self, key: &K) -> Result<String, SerializationError> {
        serde_json::to_string(key)
            .map_err(|e| SerializationError::new(format!("cannot encode key: {}", e)))
    }

    fn decode(&self, encoded: &str) -> Result<K, SerializationError> {
        serde_json::from_str(encoded).map_err(|e| {
            SerializationError::new(format!("cannot decode key '{}': {}", encoded, e))
        })
    }
}

/// A codec bound to the schema's identity field.
pub struct KeyField<K> {
    field: Field,
    codec: Arc<dyn KeyCodec<K>>,
}

impl<K> Clone for KeyField<K> {
    fn clone(&self) -> Self {
        Self {
            field: self.field,
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<K> KeyField<K> {
    pub fn new(field: Field, codec: impl KeyCodec<K> + 'static) -> Self {
        Self {
            field,
            codec: Arc::new(codec),
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Serialized identity value for `key`.
    pub fn identity_value(&self, key: &K) -> Result<String, SerializationError> {
        let encoded = self.codec.encode(key)?;
        if encoded.is_empty() {
            return Err(SerializationError::new("key encodes to an empty identity"));
        }
        Ok(encoded)
    }

    pub fn identity_term(&self, key: &K) -> Result<Term, SerializationError> {
        Ok(self.term_for(&self.identity_value(key)?))
    }

    pub fn term_for(&self, encoded: &str) -> Term {
        Term::from_field_text(self.field, encoded)
    }

    /// Exact-match predicate over the identity field.
    pub fn identity_predicate(&self, key: &K) -> Result<TermQuery, SerializationError> {
        Ok(TermQuery::new(
            self.identity_term(key)?,
            IndexRecordOption::Basic,
        ))
    }

    /// Read the key back from a stored document.
    pub fn extract_key(&self, doc: &TantivyDocument) -> Result<K, SerializationError> {
        let encoded = doc
            .get_first(self.field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SerializationError::new("document has no identity field"))?;
        self.codec.decode(encoded)
    }
}
