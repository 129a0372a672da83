//! In-memory model backend.
//!
//! `MemoryModel` keeps its rows in a `Vec` behind a tokio `RwLock`. It is used
//! by tests and the CLI, and as a reference for what a [`Model`] implementation
//! must honour: equality filtering, ordering, then offset and limit.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::trace;

use crate::error::ModelError;
use crate::traits::{FindOptions, Model};

/// In-memory model holding JSON object rows.
#[derive(Debug)]
pub struct MemoryModel {
    name: String,
    data_source: String,
    rows: Arc<RwLock<Vec<Value>>>,
}

impl MemoryModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>, data_source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_source: data_source.into(),
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates a model pre-populated with rows.
    pub fn with_rows(
        name: impl Into<String>,
        data_source: impl Into<String>,
        rows: Vec<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            data_source: data_source.into(),
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidQuery` if the row is not a JSON object.
    pub async fn insert(&self, row: Value) -> Result<(), ModelError> {
        if !row.is_object() {
            return Err(ModelError::invalid_query(format!(
                "{} rows must be JSON objects",
                self.name
            )));
        }
        self.rows.write().await.push(row);
        Ok(())
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns whether the model holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl Model for MemoryModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_source_identifier(&self) -> &str {
        &self.data_source
    }

    async fn find_all(&self, options: &FindOptions) -> Result<Vec<Value>, ModelError> {
        for (field, value) in &options.filter {
            if value.is_object() || value.is_array() {
                return Err(ModelError::invalid_query(format!(
                    "filter on '{field}' must be a scalar value"
                )));
            }
        }

        let rows = self.rows.read().await;
        let mut matched: Vec<Value> = rows
            .iter()
            .filter(|row| {
                options
                    .filter
                    .iter()
                    .all(|(field, expected)| row.get(field).unwrap_or(&Value::Null) == expected)
            })
            .cloned()
            .collect();
        drop(rows);

        if !options.order.is_empty() {
            matched.sort_by(|a, b| {
                for term in &options.order {
                    let ord = compare_json(
                        a.get(&term.field).unwrap_or(&Value::Null),
                        b.get(&term.field).unwrap_or(&Value::Null),
                    );
                    let ord = if term.descending { ord.reverse() } else { ord };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = options.offset.unwrap_or(0);
        let limit = options.limit.unwrap_or(usize::MAX);
        let page: Vec<Value> = matched.into_iter().skip(offset).take(limit).collect();

        trace!(model = %self.name, rows = page.len(), "memory model query");
        Ok(page)
    }
}

/// Total order over JSON scalars: null < bool < number < string < other.
fn compare_json(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
