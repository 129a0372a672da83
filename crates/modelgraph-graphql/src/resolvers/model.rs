//! Model-bound resolvers.
//!
//! `SchemaRegistry::model_resolver("Widget")` hands out a resolver that, on
//! every call, asks the [`ModelLookup`] which concrete model serves this
//! request (tenants may map `Widget` to different data sources), then
//! delegates to a wrapper built by the [`ResolverAdapter`]. Wrappers are
//! cached per `(data source, model)` pair for the lifetime of the registry.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use modelgraph_models::{DynModel, FindOptions, Model, ModelError, OrderBy};
use tracing::{debug, trace, warn};

use super::{Arguments, FieldResolver, ResolveParams, Resolver};
use crate::context::RequestContext;
use crate::error::RegistryError;

/// Resolves a model name to the concrete model serving a request.
#[async_trait]
pub trait ModelLookup: Send + Sync {
    /// Returns the model for `model_name` given the field arguments and the
    /// request context.
    ///
    /// # Errors
    ///
    /// Any error is wrapped into `RegistryError::Resolution` and reported on
    /// the field.
    async fn lookup(
        &self,
        model_name: &str,
        args: &Arguments,
        context: &RequestContext,
    ) -> Result<DynModel, ModelError>;
}

struct FnModelLookup<F>(F);

#[async_trait]
impl<F> ModelLookup for FnModelLookup<F>
where
    F: Fn(&str, &Arguments, &RequestContext) -> Result<DynModel, ModelError> + Send + Sync,
{
    async fn lookup(
        &self,
        model_name: &str,
        args: &Arguments,
        context: &RequestContext,
    ) -> Result<DynModel, ModelError> {
        (self.0)(model_name, args, context)
    }
}

/// Wraps a synchronous closure as a [`ModelLookup`].
pub fn model_lookup_fn<F>(f: F) -> Arc<dyn ModelLookup>
where
    F: Fn(&str, &Arguments, &RequestContext) -> Result<DynModel, ModelError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnModelLookup(f))
}

/// Builds a field resolver for a concrete model.
pub trait ResolverAdapter: Send + Sync {
    /// Creates the resolver wrapper for `model`.
    fn wrap(&self, model: DynModel) -> Resolver;
}

/// Default adapter: answers fields with `Model::find_all` / `Model::find_one`.
///
/// Arguments map onto [`FindOptions`]:
/// - `limit`, `offset`: pagination;
/// - `order`: `"field"` or `"reverse:field"`, or a list of those;
/// - `where`: an object of equality filters;
/// - any other argument: an equality filter on the attribute of that name.
///
/// List-typed fields get every matching row, other fields the first one.
#[derive(Debug, Default, Clone, Copy)]
pub struct FindResolverAdapter;

impl ResolverAdapter for FindResolverAdapter {
    fn wrap(&self, model: DynModel) -> Resolver {
        Arc::new(FindResolver { model })
    }
}

struct FindResolver {
    model: DynModel,
}

#[async_trait]
impl FieldResolver for FindResolver {
    async fn resolve(&self, params: ResolveParams) -> async_graphql::Result<Value> {
        let options = find_options(&params.args)?;

        debug!(
            model = %self.model.name(),
            field = %params.info.field_name,
            list = params.info.returns_list,
            "Resolving model field"
        );

        if params.info.returns_list {
            let rows = self.model.find_all(&options).await?;
            Ok(Value::from_json(serde_json::Value::Array(rows))?)
        } else {
            match self.model.find_one(&options).await? {
                Some(row) => Ok(Value::from_json(row)?),
                None => Ok(Value::Null),
            }
        }
    }
}

/// Translates field arguments into finder options.
pub(crate) fn find_options(args: &Arguments) -> Result<FindOptions, ModelError> {
    let mut options = FindOptions::new();

    for (name, value) in args {
        match name.as_str() {
            "limit" => options.limit = Some(as_count("limit", value)?),
            "offset" => options.offset = Some(as_count("offset", value)?),
            "order" => match value {
                Value::List(items) => {
                    for item in items {
                        options.order.push(OrderBy::parse(&as_order(item)?));
                    }
                }
                Value::Null => {}
                other => options.order.push(OrderBy::parse(&as_order(other)?)),
            },
            "where" => match value {
                Value::Object(filters) => {
                    for (field, expected) in filters {
                        options
                            .filter
                            .insert(field.to_string(), to_json(expected.clone())?);
                    }
                }
                Value::Null => {}
                _ => return Err(ModelError::invalid_query("'where' must be an object")),
            },
            field => {
                options
                    .filter
                    .insert(field.to_string(), to_json(value.clone())?);
            }
        }
    }

    Ok(options)
}

fn as_count(name: &str, value: &Value) -> Result<usize, ModelError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ModelError::invalid_query(format!("'{name}' must be a non-negative integer"))),
        _ => Err(ModelError::invalid_query(format!(
            "'{name}' must be a non-negative integer"
        ))),
    }
}

fn as_order(value: &Value) -> Result<String, ModelError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Enum(name) => Ok(name.to_string()),
        _ => Err(ModelError::invalid_query("'order' must be a string")),
    }
}

fn to_json(value: Value) -> Result<serde_json::Value, ModelError> {
    value
        .into_json()
        .map_err(|e| ModelError::invalid_query(e.to_string()))
}

/// Key of the resolver wrapper cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolverCacheKey {
    /// Data source identifier of the model.
    pub data_source: String,
    /// Model name.
    pub model: String,
}

impl ResolverCacheKey {
    /// Builds the key for a model.
    #[must_use]
    pub fn for_model(model: &dyn Model) -> Self {
        Self {
            data_source: model.data_source_identifier().to_string(),
            model: model.name().to_string(),
        }
    }
}

impl fmt::Display for ResolverCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.data_source, self.model)
    }
}

/// Produces model-bound resolvers sharing one wrapper cache.
#[derive(Clone)]
pub(crate) struct ModelResolverFactory {
    lookup: Arc<dyn ModelLookup>,
    adapter: Arc<dyn ResolverAdapter>,
    cache: Arc<DashMap<ResolverCacheKey, Resolver>>,
}

impl ModelResolverFactory {
    pub(crate) fn new(lookup: Arc<dyn ModelLookup>, adapter: Arc<dyn ResolverAdapter>) -> Self {
        Self {
            lookup,
            adapter,
            cache: Arc::new(DashMap::new()),
        }
    }

    pub(crate) fn resolver(&self, model_name: &str) -> Resolver {
        Arc::new(ModelBoundResolver {
            model_name: model_name.to_string(),
            factory: self.clone(),
        })
    }

    pub(crate) fn cached_wrappers(&self) -> usize {
        self.cache.len()
    }

    /// Returns the wrapper for `model`, building it on first use.
    fn wrapper_for(&self, model: DynModel) -> Resolver {
        let key = ResolverCacheKey::for_model(model.as_ref());
        match self.cache.entry(key) {
            Entry::Occupied(entry) => {
                trace!(key = %entry.key(), "Reusing model resolver wrapper");
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                debug!(key = %entry.key(), "Building model resolver wrapper");
                let wrapper = self.adapter.wrap(model);
                entry.insert(Arc::clone(&wrapper));
                wrapper
            }
        }
    }
}

struct ModelBoundResolver {
    model_name: String,
    factory: ModelResolverFactory,
}

#[async_trait]
impl FieldResolver for ModelBoundResolver {
    async fn resolve(&self, params: ResolveParams) -> async_graphql::Result<Value> {
        let model = self
            .factory
            .lookup
            .lookup(&self.model_name, &params.args, &params.context)
            .await
            .map_err(|source| {
                warn!(model = %self.model_name, error = %source, "Model lookup failed");
                RegistryError::Resolution {
                    model: self.model_name.clone(),
                    source,
                }
            })?;

        let wrapper = self.factory.wrapper_for(model);
        wrapper.resolve(params).await
    }
}
