//! The schema registry.
//!
//! A [`SchemaRegistry`] owns two ordered, append-only sequences (schema
//! fragments and resolver maps) filled during bootstrap, a model-resolver
//! factory, and the lazily compiled executable schema.
//!
//! ```no_run
//! use async_graphql::Variables;
//! use modelgraph_graphql::{RegistryEntry, RequestContext, SchemaRegistry};
//!
//! # async fn run() -> Result<(), modelgraph_graphql::RegistryError> {
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .scan("src/graphql", None)?
//!     .register([RegistryEntry::new().schema("type Query { ping: String }")], None);
//!
//! let response = registry
//!     .execute("{ ping }", Variables::default(), RequestContext::new())
//!     .await?;
//! println!("{}", response.data);
//! # Ok(())
//! # }
//! ```

mod collector;

pub use collector::RegistryEntry;

use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, Variables};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::context::RequestContext;
use crate::error::RegistryError;
use crate::loader::{ModuleLoader, StaticModuleLoader};
use crate::resolvers::{
    FindResolverAdapter, ModelLookup, ModelResolverFactory, Resolver, ResolverAdapter, ResolverMap,
};
use crate::schema::{LazySchema, SchemaCompiler, SchemaState, merge_type_definitions};

/// Collects schema fragments and resolvers, and serves the compiled schema.
///
/// The compiled schema can only be produced by the registry itself:
///
/// ```compile_fail
/// let registry = modelgraph_graphql::SchemaRegistry::new();
/// registry.schema = Default::default();
/// ```
pub struct SchemaRegistry {
    config: RegistryConfig,
    loader: Arc<dyn ModuleLoader>,
    models: Option<ModelResolverFactory>,
    fragments: Vec<String>,
    resolvers: Vec<ResolverMap>,
    schema: LazySchema,
}

impl SchemaRegistry {
    /// Creates a registry with the default configuration, an empty module
    /// table and no model lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(RegistryConfig::default(), Arc::new(StaticModuleLoader::new()), None)
    }

    /// Returns a builder for a configured registry.
    #[must_use]
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    fn from_parts(
        config: RegistryConfig,
        loader: Arc<dyn ModuleLoader>,
        models: Option<ModelResolverFactory>,
    ) -> Self {
        Self {
            config,
            loader,
            models,
            fragments: Vec::new(),
            resolvers: Vec::new(),
            schema: LazySchema::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Collected schema fragments, in registration order.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Collected resolver maps, in registration order.
    #[must_use]
    pub fn resolver_maps(&self) -> &[ResolverMap] {
        &self.resolvers
    }

    /// Returns a resolver bound to the model named `model_name`.
    ///
    /// The concrete model is looked up on every call; resolver wrappers are
    /// shared per `(data source, model)` pair across every resolver handed
    /// out by this registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::MissingModelLookup` if the registry was built
    /// without a model lookup.
    pub fn model_resolver(&self, model_name: &str) -> Result<Resolver, RegistryError> {
        let models = self.models.as_ref().ok_or(RegistryError::MissingModelLookup)?;
        debug!(model = %model_name, "Creating model resolver");
        Ok(models.resolver(model_name))
    }

    /// Number of model resolver wrappers built so far.
    #[must_use]
    pub fn cached_model_resolvers(&self) -> usize {
        self.models.as_ref().map_or(0, ModelResolverFactory::cached_wrappers)
    }

    /// Compiles the schema on first call and returns it.
    ///
    /// Every successful call returns the same schema. Fragments or resolvers
    /// added after the first success are not used.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NoSchemaFragments` while nothing is registered,
    /// and `RegistryError::Compilation` if the build fails. A failed build is
    /// reported again on every call until [`SchemaRegistry::reset`].
    pub async fn ensure_compiled(&self) -> Result<Arc<Schema>, RegistryError> {
        let compiler = SchemaCompiler::new(self.config.clone());
        self.schema
            .get_or_build(|| compiler.compile(&self.fragments, &self.resolvers))
            .await
    }

    /// Returns the compiled schema without building it.
    #[must_use]
    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.schema.get()
    }

    /// Returns the compilation state.
    #[must_use]
    pub fn schema_state(&self) -> SchemaState {
        self.schema.state()
    }

    /// Clears a failed compilation so the next access retries. A compiled
    /// schema is kept. Returns whether a failure was cleared.
    pub async fn reset(&self) -> bool {
        self.schema.reset().await
    }

    /// Runs `query` with `variables`, passing `context` to every resolver.
    ///
    /// # Errors
    ///
    /// Only compilation problems are errors; query failures are reported in
    /// the response.
    pub async fn execute(
        &self,
        query: impl Into<String>,
        variables: Variables,
        context: RequestContext,
    ) -> Result<Response, RegistryError> {
        let request = Request::new(query).variables(variables).data(context);
        self.execute_request(request).await
    }

    /// Runs a prepared request.
    ///
    /// # Errors
    ///
    /// See [`SchemaRegistry::execute`].
    pub async fn execute_request(&self, request: Request) -> Result<Response, RegistryError> {
        let schema = self.ensure_compiled().await?;
        Ok(schema.execute(request).await)
    }

    /// Renders the merged type definitions as SDL.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NoSchemaFragments` when nothing is registered
    /// and `RegistryError::Compilation` if the fragments do not merge.
    pub fn merged_sdl(&self) -> Result<String, RegistryError> {
        if self.fragments.is_empty() {
            return Err(RegistryError::NoSchemaFragments);
        }
        Ok(merge_type_definitions(&self.fragments)?.to_sdl())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("config", &self.config)
            .field("fragments", &self.fragments.len())
            .field("resolvers", &self.resolvers)
            .field("model_lookup", &self.models.is_some())
            .field("schema", &self.schema)
            .finish()
    }
}

/// Builder for [`SchemaRegistry`].
#[derive(Default)]
pub struct SchemaRegistryBuilder {
    config: Option<RegistryConfig>,
    loader: Option<Arc<dyn ModuleLoader>>,
    lookup: Option<Arc<dyn ModelLookup>>,
    adapter: Option<Arc<dyn ResolverAdapter>>,
}

impl SchemaRegistryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the loader used for scanned resolver modules.
    #[must_use]
    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Sets the model lookup used by model resolvers.
    #[must_use]
    pub fn with_model_lookup(mut self, lookup: Arc<dyn ModelLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Sets the adapter building resolvers for concrete models.
    ///
    /// Defaults to [`FindResolverAdapter`].
    #[must_use]
    pub fn with_resolver_adapter(mut self, adapter: impl ResolverAdapter + 'static) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidConfig` if the configuration is invalid.
    pub fn build(self) -> Result<SchemaRegistry, RegistryError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(StaticModuleLoader::new()));
        let models = self.lookup.map(|lookup| {
            let adapter = self
                .adapter
                .unwrap_or_else(|| Arc::new(FindResolverAdapter));
            ModelResolverFactory::new(lookup, adapter)
        });

        Ok(SchemaRegistry::from_parts(config, loader, models))
    }
}
