//! Fragment and resolver collection.
//!
//! Three entry points feed the registry: derivation from model metadata,
//! project scanning and explicit registration. Each appends to the ordered
//! fragment and resolver sequences and returns the registry for chaining.

use std::fs;

use indexmap::IndexMap;
use modelgraph_models::ModelDefinition;
use tracing::{debug, trace};

use super::SchemaRegistry;
use crate::derive::model_fragments;
use crate::error::RegistryError;
use crate::loader::{ResolverSource, Transform};
use crate::resolvers::ResolverMap;
use crate::scan::{FileRole, ScanPaths, classify, expand_paths};

/// An explicitly registered schema module.
///
/// ```
/// use modelgraph_graphql::RegistryEntry;
///
/// let entry = RegistryEntry::new().schema("type Query { ping: String }");
/// assert!(entry.resolvers.is_none());
/// ```
#[derive(Debug, Default)]
pub struct RegistryEntry {
    /// Type definitions contributed by the entry.
    pub schema: Option<String>,
    /// Mutation resolvers.
    pub mutators: Option<ResolverSource>,
    /// Query and type resolvers.
    pub resolvers: Option<ResolverSource>,
}

impl RegistryEntry {
    /// Creates an empty entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type definitions.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the mutators.
    #[must_use]
    pub fn mutators(mut self, mutators: impl Into<ResolverSource>) -> Self {
        self.mutators = Some(mutators.into());
        self
    }

    /// Sets the resolvers.
    #[must_use]
    pub fn resolvers(mut self, resolvers: impl Into<ResolverSource>) -> Self {
        self.resolvers = Some(resolvers.into());
        self
    }
}

impl SchemaRegistry {
    /// Derives GraphQL types from model definitions.
    ///
    /// Models without the `graphql` option, and virtual models, are skipped.
    pub fn derive_from_models(&mut self, definitions: &IndexMap<String, ModelDefinition>) -> &mut Self {
        for (name, definition) in definitions {
            let fragments = model_fragments(name, definition);
            if fragments.is_empty() {
                debug!(model = %name, "Skipping model without GraphQL exposure");
                continue;
            }
            for fragment in fragments {
                self.push_fragment(fragment, name);
            }
        }
        self
    }

    /// Scans files and directories for schema fragments and resolver modules.
    ///
    /// Resolver modules are loaded through the registry's module loader. A
    /// module exporting a factory is handed to `transform` when given, or
    /// invoked with no arguments otherwise; a module exporting a plain map is
    /// collected as-is.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Scan` or `RegistryError::InvalidScanPath` if a
    /// path cannot be walked or read, and `RegistryError::Load` if a resolver
    /// module cannot be loaded. Files collected before the failure stay
    /// registered.
    pub fn scan(
        &mut self,
        paths: impl ScanPaths,
        transform: Option<&Transform<'_>>,
    ) -> Result<&mut Self, RegistryError> {
        let files = expand_paths(paths.into_paths(), &self.config)?;

        for file in files {
            match classify(&file) {
                FileRole::Resolvers => {
                    let map = match self.loader.load(&file)? {
                        ResolverSource::Map(map) => map,
                        factory @ ResolverSource::Factory(_) => factory.apply(transform),
                    };
                    self.push_resolvers(map, &file.display());
                }
                FileRole::Schema => {
                    let text = fs::read_to_string(&file).map_err(|source| RegistryError::Scan {
                        path: file.clone(),
                        source,
                    })?;
                    self.push_fragment(text.trim().to_string(), &file.display());
                }
                FileRole::Ignored => {
                    trace!(path = %file.display(), "Ignoring scanned file");
                }
            }
        }

        Ok(self)
    }

    /// Registers schema modules given as values.
    ///
    /// For each entry the schema is appended to the fragments, then the
    /// mutators and the resolvers (through `transform` when given) to the
    /// resolver maps.
    pub fn register(
        &mut self,
        entries: impl IntoIterator<Item = RegistryEntry>,
        transform: Option<&Transform<'_>>,
    ) -> &mut Self {
        for entry in entries {
            if let Some(schema) = entry.schema {
                self.push_fragment(schema, &"registered entry");
            }
            if let Some(mutators) = entry.mutators {
                self.push_resolvers(mutators.apply(transform), &"registered mutators");
            }
            if let Some(resolvers) = entry.resolvers {
                self.push_resolvers(resolvers.apply(transform), &"registered resolvers");
            }
        }
        self
    }

    fn push_fragment(&mut self, fragment: String, origin: &dyn std::fmt::Display) {
        if self.schema.get().is_some() {
            debug!(origin = %origin, "Schema already compiled; fragment will not be used");
        }
        debug!(origin = %origin, bytes = fragment.len(), "Collected schema fragment");
        self.fragments.push(fragment);
    }

    fn push_resolvers(&mut self, map: ResolverMap, origin: &dyn std::fmt::Display) {
        if self.schema.get().is_some() {
            debug!(origin = %origin, "Schema already compiled; resolvers will not be used");
        }
        debug!(origin = %origin, fields = map.len(), "Collected resolver map");
        self.resolvers.push(map);
    }
}
