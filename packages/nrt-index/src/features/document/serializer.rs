//! Value serializers
//!
//! The repository never looks inside a value. A [`FieldSerializer`] turns it
//! into `(field name, value)` pairs and the document builder checks those
//! names against the schema.

use crate::errors::SerializationError;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// One indexable value. The schema decides whether a string is tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    I64(i64),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::I64(value)
    }
}

/// Serializer output: field name and value, repeated names allowed.
pub type Fields = Vec<(String, FieldValue)>;

/// Maps an application value to indexable fields.
///
/// Must be pure: no I/O, no access to repository state.
pub trait FieldSerializer<V>: Send + Sync {
    fn to_fields(&self, value: &V) -> Result<Fields, SerializationError>;
}

impl<V, F> FieldSerializer<V> for F
where
    F: Fn(&V) -> Result<Fields, SerializationError> + Send + Sync,
{
    fn to_fields(&self, value: &V) -> Result<Fields, SerializationError> {
        self(value)
    }
}

/// Puts a string-like value into a single field.
#[derive(Debug, Clone)]
pub struct TextSerializer {
    field: String,
}

impl TextSerializer {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl<V: AsRef<str>> FieldSerializer<V> for TextSerializer {
    fn to_fields(&self, value: &V) -> Result<Fields, SerializationError> {
        Ok(vec![(self.field.clone(), FieldValue::from(value.as_ref()))])
    }
}

/// Indexes named top-level members of any serde value.
///
/// Strings, integers and booleans map directly; arrays contribute one value
/// per element; nulls and absent members are skipped. An empty field list
/// means every top-level member.
#[derive(Debug, Clone, Default)]
pub struct JsonFieldSerializer {
    fields: Vec<String>,
}

impl JsonFieldSerializer {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all_fields() -> Self {
        Self::default()
    }

    fn push(out: &mut Fields, name: &str, value: &JsonValue) -> Result<(), SerializationError> {
        match value {
            JsonValue::Null => {}
            JsonValue::String(s) => out.push((name.to_string(), FieldValue::Str(s.clone()))),
            JsonValue::Bool(b) => out.push((name.to_string(), FieldValue::Str(b.to_string()))),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => out.push((name.to_string(), FieldValue::I64(i))),
                // floats and u64 beyond i64 are indexed by their text form
                None => out.push((name.to_string(), FieldValue::Str(n.to_string()))),
            },
            JsonValue::Array(items) => {
                for item in items {
                    if item.is_array() {
                        return Err(SerializationError::new(format!(
                            "field '{}' holds nested arrays",
                            name
                        )));
                    }
                    Self::push(out, name, item)?;
                }
            }
            JsonValue::Object(_) => {
                return Err(SerializationError::new(format!(
                    "field '{}' is an object; only top-level scalars are indexable",
                    name
                )))
            }
        }
        Ok(())
    }
}

impl<V: Serialize> FieldSerializer<V> for JsonFieldSerializer {
    fn to_fields(&self, value: &V) -> Result<Fields, SerializationError> {
        let json = serde_json::to_value(value)?;
        let JsonValue::Object(map) = json else {
            return Err(SerializationError::new(
                "value must serialize to a JSON object",
            ));
        };

        let mut out = Vec::new();
        if self.fields.is_empty() {
            for (name, member) in &map {
                Self::push(&mut out, name, member)?;
            }
        } else {
            for name in &self.fields {
                if let Some(member) = map.get(name) {
                    Self::push(&mut out, name, member)?;
                }
            }
        }
        Ok(out)
    }
}
