//! Registry assembly from files on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use modelgraph_graphql::loader::LoadError;
use modelgraph_graphql::resolvers::model_lookup_fn;
use modelgraph_graphql::{
    ModuleLoader, RegistryConfig, RegistryEntry, ResolverMap, ResolverSource, SchemaRegistry,
};
use modelgraph_models::{DynModel, MemoryModel, ModelDefinition, ModelError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Data source identifier of the in-memory models.
const DATA_SOURCE: &str = "memory";

/// Model definitions keyed by model name.
pub type Models = IndexMap<String, ModelDefinition>;

/// Rows keyed by model name.
pub type Rows = IndexMap<String, Vec<Value>>;

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    graphql: RegistryConfig,
}

/// Inputs needed to assemble a registry.
#[derive(Debug, Default)]
pub struct Project {
    pub config: RegistryConfig,
    pub models: Models,
    pub scan: Vec<PathBuf>,
    pub model_queries: bool,
}

impl Project {
    /// Reads the configuration and model files.
    pub fn load(
        config: Option<&Path>,
        models: Option<&Path>,
        scan: Vec<PathBuf>,
        model_queries: bool,
    ) -> Result<Self> {
        let config = match config {
            Some(path) => load_config(path)?,
            None => RegistryConfig::default(),
        };
        let models = match models {
            Some(path) => load_models(path)?,
            None => Models::new(),
        };
        Ok(Self {
            config,
            models,
            scan,
            model_queries,
        })
    }

    /// Builds the registry, serving every model from `rows`.
    pub fn registry(&self, rows: Rows) -> Result<SchemaRegistry> {
        let mut tables: HashMap<String, DynModel> = HashMap::new();
        for name in self.models.keys() {
            let data = rows.get(name).cloned().unwrap_or_default();
            debug!(model = %name, rows = data.len(), "Serving model from memory");
            tables.insert(name.clone(), Arc::new(MemoryModel::with_rows(name, DATA_SOURCE, data)));
        }
        for name in rows.keys().filter(|name| !self.models.contains_key(*name)) {
            warn!(model = %name, "Ignoring rows for an undefined model");
        }

        let lookup = model_lookup_fn(move |name, _, _| {
            tables
                .get(name)
                .cloned()
                .ok_or_else(|| ModelError::unknown_model(name))
        });

        let mut registry = SchemaRegistry::builder()
            .with_config(self.config.clone())
            .with_loader(SkipModules)
            .with_model_lookup(lookup)
            .build()?;

        registry.derive_from_models(&self.models);
        if !self.scan.is_empty() {
            registry.scan(self.scan.as_slice(), None)?;
        }
        if self.model_queries {
            if let Some(entry) = self.model_query_entry(&registry)? {
                registry.register([entry], None);
            }
        }

        Ok(registry)
    }

    /// A `Query` type with one list field per exposed model.
    fn model_query_entry(&self, registry: &SchemaRegistry) -> Result<Option<RegistryEntry>> {
        let mut fields = Vec::new();
        let mut resolvers = ResolverMap::new();

        for (name, definition) in &self.models {
            if !definition.exposes_graphql() {
                continue;
            }
            let field = list_field_name(name);
            fields.push(format!(
                "{field}(limit: Int, offset: Int, order: String): [{name}!]!"
            ));
            resolvers.insert(
                registry.config().query_type.as_str(),
                field,
                registry.model_resolver(name)?,
            );
        }

        if fields.is_empty() {
            return Ok(None);
        }

        let schema = format!(
            "type {} {{\n  {}\n}}",
            registry.config().query_type,
            fields.join("\n  ")
        );
        Ok(Some(RegistryEntry::new().schema(schema).resolvers(resolvers)))
    }
}

/// `Widget` -> `widgetList`.
fn list_field_name(model: &str) -> String {
    let mut chars = model.chars();
    match chars.next() {
        Some(first) => format!("{}{}List", first.to_lowercase(), chars.as_str()),
        None => "list".to_string(),
    }
}

/// Resolver modules cannot run outside their application; the CLI keeps
/// their fields on the default property resolver.
struct SkipModules;

impl ModuleLoader for SkipModules {
    fn load(&self, path: &Path) -> Result<ResolverSource, LoadError> {
        warn!(path = %path.display(), "Skipping resolver module");
        Ok(ResolverSource::Map(ResolverMap::new()))
    }
}

pub fn load_config(path: &Path) -> Result<RegistryConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&text)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    file.graphql.validate()?;
    Ok(file.graphql)
}

pub fn load_models(path: &Path) -> Result<Models> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read models {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid models {}", path.display()))
}

pub fn load_rows(path: &Path) -> Result<Rows> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid data {}", path.display()))
}
