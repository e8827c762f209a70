//! Query model
//!
//! A small, engine-independent description of what to match, compiled into an
//! engine query against the snapshot that will run it.

use crate::errors::{RepositoryError, Result};
use crate::features::document::{FieldKind, FieldValue, RepositorySchema};
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{Index, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    /// Every live document, score 1.0
    All,

    /// One exact term. Text fields are matched against lowercased tokens.
    Term { field: String, value: FieldValue },

    /// Engine query-string syntax (`apple OR body:cherry`, phrases, `+`/`-`).
    /// An empty field list searches every text field.
    Text { fields: Vec<String>, text: String },

    Bool {
        must: Vec<IndexQuery>,
        should: Vec<IndexQuery>,
        must_not: Vec<IndexQuery>,
    },

    /// Exact match on an already encoded identity
    Key(String),
}

impl IndexQuery {
    pub fn text(text: impl Into<String>) -> Self {
        IndexQuery::Text {
            fields: Vec::new(),
            text: text.into(),
        }
    }

    pub fn text_in<I, S>(fields: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexQuery::Text {
            fields: fields.into_iter().map(Into::into).collect(),
            text: text.into(),
        }
    }

    pub fn term(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        IndexQuery::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn all_of(queries: Vec<IndexQuery>) -> Self {
        IndexQuery::Bool {
            must: queries,
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    pub fn any_of(queries: Vec<IndexQuery>) -> Self {
        IndexQuery::Bool {
            must: Vec::new(),
            should: queries,
            must_not: Vec::new(),
        }
    }

    pub fn excluding(self, excluded: IndexQuery) -> Self {
        match self {
            IndexQuery::Bool {
                must,
                should,
                mut must_not,
            } => {
                must_not.push(excluded);
                IndexQuery::Bool {
                    must,
                    should,
                    must_not,
                }
            }
            other => IndexQuery::Bool {
                must: vec![other],
                should: Vec::new(),
                must_not: vec![excluded],
            },
        }
    }

    /// Compile against the index a snapshot was opened on.
    pub fn compile(&self, schema: &RepositorySchema, index: &Index) -> Result<Box<dyn Query>> {
        match self {
            IndexQuery::All => Ok(Box::new(AllQuery)),

            IndexQuery::Key(encoded) => Ok(Box::new(TermQuery::new(
                Term::from_field_text(schema.key_field(), encoded),
                IndexRecordOption::Basic,
            ))),

            IndexQuery::Term { field, value } => {
                let (handle, kind) = lookup(schema, field)?;
                let (term, option) = match (kind, value) {
                    (FieldKind::Text, FieldValue::Str(s)) => (
                        Term::from_field_text(handle, &s.to_lowercase()),
                        IndexRecordOption::WithFreqs,
                    ),
                    (FieldKind::Text, FieldValue::I64(i)) => (
                        Term::from_field_text(handle, &i.to_string()),
                        IndexRecordOption::WithFreqs,
                    ),
                    (FieldKind::Keyword, FieldValue::Str(s)) => {
                        (Term::from_field_text(handle, s), IndexRecordOption::Basic)
                    }
                    (FieldKind::Keyword, FieldValue::I64(i)) => (
                        Term::from_field_text(handle, &i.to_string()),
                        IndexRecordOption::Basic,
                    ),
                    (FieldKind::I64, FieldValue::I64(i)) => {
                        (Term::from_field_i64(handle, *i), IndexRecordOption::Basic)
                    }
                    (FieldKind::I64, FieldValue::Str(s)) => {
                        let parsed = s.trim().parse::<i64>().map_err(|_| {
                            RepositoryError::InvalidQuery(format!(
                                "field '{}' is an integer field, got '{}'",
                                field, s
                            ))
                        })?;
                        (Term::from_field_i64(handle, parsed), IndexRecordOption::Basic)
                    }
                };
                Ok(Box::new(TermQuery::new(term, option)))
            }

            IndexQuery::Text { fields, text } => {
                let targets = if fields.is_empty() {
                    schema.text_fields().to_vec()
                } else {
                    fields
                        .iter()
                        .map(|name| lookup(schema, name).map(|(handle, _)| handle))
                        .collect::<Result<Vec<_>>>()?
                };
                if targets.is_empty() {
                    return Err(RepositoryError::InvalidQuery(
                        "schema has no text fields to search".to_string(),
                    ));
                }

                let parser = QueryParser::for_index(index, targets);
                parser
                    .parse_query(text)
                    .map_err(|e| RepositoryError::InvalidQuery(format!("'{}': {}", text, e)))
            }

            IndexQuery::Bool {
                must,
                should,
                must_not,
            } => {
                let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
                for query in must {
                    clauses.push((Occur::Must, query.compile(schema, index)?));
                }
                for query in should {
                    clauses.push((Occur::Should, query.compile(schema, index)?));
                }
                // A purely negative query would match nothing.
                if must.is_empty() && should.is_empty() && !must_not.is_empty() {
                    clauses.push((Occur::Must, Box::new(AllQuery)));
                }
                for query in must_not {
                    clauses.push((Occur::MustNot, query.compile(schema, index)?));
                }
                Ok(Box::new(BooleanQuery::new(clauses)))
            }
        }
    }
}

fn lookup(schema: &RepositorySchema, name: &str) -> Result<(tantivy::schema::Field, FieldKind)> {
    schema
        .field(name)
        .ok_or_else(|| RepositoryError::InvalidQuery(format!("unknown field '{}'", name)))
}
