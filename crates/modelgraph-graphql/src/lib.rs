//! # modelgraph-graphql
//!
//! A GraphQL schema registry for model-backed applications.
//!
//! The registry collects schema fragments and resolvers from three places,
//! then compiles them once into an executable schema:
//!
//! - **Model derivation**: GraphQL types generated from model attribute
//!   metadata ([`SchemaRegistry::derive_from_models`]).
//! - **Project scanning**: `schema.graphql` files and resolver/mutator modules
//!   found on disk ([`SchemaRegistry::scan`]).
//! - **Explicit registration**: fragments and resolver maps given as values
//!   ([`SchemaRegistry::register`]).
//!
//! ## Example
//!
//! ```
//! use async_graphql::{Value, Variables};
//! use modelgraph_graphql::resolvers::{resolver_fn, ResolverMap};
//! use modelgraph_graphql::{RegistryEntry, RequestContext, SchemaRegistry};
//!
//! # tokio_test::block_on(async {
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     [RegistryEntry::new()
//!         .schema("type Query { ping: String }")
//!         .resolvers(ResolverMap::new().field(
//!             "Query",
//!             "ping",
//!             resolver_fn(|_| async { Ok(Value::from("pong")) }),
//!         ))],
//!     None,
//! );
//!
//! let response = registry
//!     .execute("{ ping }", Variables::default(), RequestContext::new())
//!     .await
//!     .unwrap();
//! assert_eq!(
//!     response.data.into_json().unwrap(),
//!     serde_json::json!({"ping": "pong"})
//! );
//! # });
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! script_extensions = ["js"]
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Registry configuration
//! - [`context`] - Per-request context handed to resolvers
//! - [`derive`] - GraphQL types from model metadata
//! - [`loader`] - Resolver module loading for scanned files
//! - [`resolvers`] - Field resolvers, resolver maps and model resolvers
//! - [`scan`] - File discovery and classification
//! - [`schema`] - Merging, compilation and lazy caching
//! - [`error`] - Error types

pub mod config;
pub mod context;
pub mod derive;
pub mod error;
pub mod loader;
pub mod registry;
pub mod resolvers;
pub mod scan;
pub mod schema;

// Re-export main types
pub use config::RegistryConfig;
pub use context::{RequestContext, RequestContextBuilder};
pub use error::RegistryError;
pub use loader::{ModuleLoader, ResolverSource, StaticModuleLoader, Transform};
pub use registry::{RegistryEntry, SchemaRegistry, SchemaRegistryBuilder};
pub use resolvers::{FieldResolver, ResolveParams, Resolver, ResolverMap};
pub use schema::SchemaState;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
