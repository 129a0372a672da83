//! Field resolvers and resolver maps.
//!
//! A [`Resolver`] computes the value of one GraphQL field. It receives the
//! classic `(source, args, context, info)` quadruple bundled as
//! [`ResolveParams`] and returns an owned [`Value`]. Object values are then
//! walked by the schema's default property resolver, so a resolver returning
//! `{ "id": 1, "name": "bolt" }` for a `Widget` field satisfies every scalar
//! sub-field without further code.
//!
//! Resolvers are grouped by type and field name in a [`ResolverMap`]:
//!
//! ```
//! use async_graphql::Value;
//! use modelgraph_graphql::resolvers::{resolver_fn, ResolverMap};
//!
//! let map = ResolverMap::new().field(
//!     "Query",
//!     "ping",
//!     resolver_fn(|_params| async { Ok(Value::from("pong")) }),
//! );
//! assert!(map.get("Query", "ping").is_some());
//! ```

mod model;

pub use model::{
    FindResolverAdapter, ModelLookup, ResolverAdapter, ResolverCacheKey, model_lookup_fn,
};
pub(crate) use model::ModelResolverFactory;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use async_trait::async_trait;

use crate::context::RequestContext;

/// Field arguments as received from the execution engine.
pub type Arguments = IndexMap<Name, Value>;

/// Static information about the field being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
    /// Name of the type owning the field.
    pub parent_type: String,
    /// Field name.
    pub field_name: String,
    /// Declared return type, in SDL notation (e.g. `[Widget!]!`).
    pub return_type: String,
    /// Whether the return type is a list (ignoring non-null wrappers).
    pub returns_list: bool,
}

/// Everything a resolver gets at call time.
#[derive(Debug, Clone)]
pub struct ResolveParams {
    /// Value of the parent object (`null` on root types).
    pub parent: Value,
    /// Field arguments.
    pub args: Arguments,
    /// Request context.
    pub context: RequestContext,
    /// Field information.
    pub info: ResolveInfo,
}

/// A GraphQL field resolver.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// Computes the field value.
    ///
    /// # Errors
    ///
    /// Errors are reported in the response's `errors` list for this field.
    async fn resolve(&self, params: ResolveParams) -> async_graphql::Result<Value>;
}

/// Type alias for a shareable resolver.
pub type Resolver = Arc<dyn FieldResolver>;

/// Adapter turning an async closure into a [`FieldResolver`].
pub struct FnResolver<F>(F);

#[async_trait]
impl<F, Fut> FieldResolver for FnResolver<F>
where
    F: Fn(ResolveParams) -> Fut + Send + Sync,
    Fut: Future<Output = async_graphql::Result<Value>> + Send + 'static,
{
    async fn resolve(&self, params: ResolveParams) -> async_graphql::Result<Value> {
        (self.0)(params).await
    }
}

/// Wraps an async closure as a [`Resolver`].
pub fn resolver_fn<F, Fut>(f: F) -> Resolver
where
    F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = async_graphql::Result<Value>> + Send + 'static,
{
    Arc::new(FnResolver(f))
}

/// Resolvers keyed by type name, then field name.
#[derive(Clone, Default)]
pub struct ResolverMap {
    types: IndexMap<String, IndexMap<String, Resolver>>,
}

impl ResolverMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resolver, builder style.
    #[must_use]
    pub fn field(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: Resolver,
    ) -> Self {
        self.insert(type_name, field_name, resolver);
        self
    }

    /// Adds a resolver, replacing any previous one for the same field.
    pub fn insert(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: Resolver,
    ) {
        self.types
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), resolver);
    }

    /// Returns the resolver for `type_name.field_name`.
    #[must_use]
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&Resolver> {
        self.types.get(type_name)?.get(field_name)
    }

    /// Iterates over `(type, field, resolver)` triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Resolver)> {
        self.types.iter().flat_map(|(type_name, fields)| {
            fields
                .iter()
                .map(move |(field, resolver)| (type_name.as_str(), field.as_str(), resolver))
        })
    }

    /// Number of field resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }

    /// Returns whether the map holds no resolvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges maps in order; for the same field the last map wins.
    pub fn merge<'a>(maps: impl IntoIterator<Item = &'a ResolverMap>) -> ResolverMap {
        let mut merged = ResolverMap::new();
        for map in maps {
            for (type_name, field, resolver) in map.iter() {
                merged.insert(type_name, field, Arc::clone(resolver));
            }
        }
        merged
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (type_name, fields) in &self.types {
            map.entry(type_name, &fields.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}
