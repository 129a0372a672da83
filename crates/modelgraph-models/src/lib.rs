//! # modelgraph-models
//!
//! Relational model layer for modelgraph.
//!
//! This crate holds two things:
//!
//! - **Model metadata** ([`ModelDefinition`], [`AttributeDefinition`],
//!   [`DataType`]): the declarative description of an entity and its
//!   attributes. GraphQL types are derived from it.
//! - **Runtime models** ([`Model`]): a handle to a concrete entity bound to a
//!   data source (connection, tenant), able to answer finder queries.
//!
//! ## Example
//!
//! ```
//! use modelgraph_models::{AttributeDefinition, DataType, ModelDefinition};
//!
//! let widget = ModelDefinition::new()
//!     .graphql(true)
//!     .attribute("id", AttributeDefinition::new(DataType::Integer).primary_key())
//!     .attribute("name", AttributeDefinition::new(DataType::String).not_null())
//!     .attribute(
//!         "status",
//!         AttributeDefinition::new(DataType::enumeration(["ACTIVE", "RETIRED"])),
//!     );
//!
//! assert!(widget.exposes_graphql());
//! assert_eq!(widget.attributes.len(), 3);
//! ```
//!
//! ## Implementing a model
//!
//! ```ignore
//! use async_trait::async_trait;
//! use modelgraph_models::{FindOptions, Model, ModelError};
//!
//! struct SqlWidget { pool: Pool }
//!
//! #[async_trait]
//! impl Model for SqlWidget {
//!     fn name(&self) -> &str { "Widget" }
//!     fn data_source_identifier(&self) -> &str { "primary" }
//!     async fn find_all(&self, options: &FindOptions) -> Result<Vec<Value>, ModelError> {
//!         // Translate options into SQL
//!     }
//! }
//! ```

mod definition;
mod error;
pub mod memory;
mod traits;

pub use definition::{AttributeDefinition, DataType, ModelDefinition, ModelOptions};
pub use error::ModelError;
pub use memory::MemoryModel;
pub use traits::{DynModel, FindOptions, Model, OrderBy};

/// Type alias for a model result.
pub type ModelResult<T> = Result<T, ModelError>;
