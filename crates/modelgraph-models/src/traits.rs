//! Runtime model traits.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ModelError;

/// A runtime model bound to a data source.
///
/// The `(data_source_identifier, name)` pair identifies the model across
/// tenants: two handles with the same pair are interchangeable.
#[async_trait]
pub trait Model: Send + Sync {
    /// The model name (e.g. `"Widget"`).
    fn name(&self) -> &str;

    /// Identifier of the owning connection or tenant.
    fn data_source_identifier(&self) -> &str;

    /// Returns all rows matching the options, as JSON objects.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidQuery` if the options reference unknown
    /// attributes, or `ModelError::DataSource` on backend failures.
    async fn find_all(&self, options: &FindOptions) -> Result<Vec<Value>, ModelError>;

    /// Returns the first row matching the options.
    ///
    /// # Errors
    ///
    /// Same as [`Model::find_all`].
    async fn find_one(&self, options: &FindOptions) -> Result<Option<Value>, ModelError> {
        let mut options = options.clone();
        options.limit = Some(1);
        Ok(self.find_all(&options).await?.into_iter().next())
    }
}

/// Type alias for a shareable model.
pub type DynModel = Arc<dyn Model>;

/// A single ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Attribute to order by.
    pub field: String,
    /// Descending order when true.
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parses `"field"` or `"reverse:field"`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.strip_prefix("reverse:") {
            Some(field) => Self::desc(field),
            None => Self::asc(text),
        }
    }
}

/// Finder options: equality filters, ordering and pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Attribute equality filters.
    pub filter: IndexMap<String, Value>,
    /// Ordering terms, applied in sequence.
    pub order: Vec<OrderBy>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

impl FindOptions {
    /// Creates empty options (match everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    /// Adds an ordering term.
    #[must_use]
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the row offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
