//! Resolver module loading.
//!
//! `scan` finds resolver and mutator files by name but cannot execute them:
//! a compiled program has no `require`. A [`ModuleLoader`] maps a file to the
//! resolvers it stands for. The default [`StaticModuleLoader`] is a table
//! filled at startup, keyed by path, file name or file stem:
//!
//! ```
//! use async_graphql::Value;
//! use modelgraph_graphql::loader::{ModuleLoader, StaticModuleLoader};
//! use modelgraph_graphql::resolvers::{resolver_fn, ResolverMap};
//!
//! let loader = StaticModuleLoader::new().module("userResolvers", || {
//!     ResolverMap::new().field(
//!         "Query",
//!         "me",
//!         resolver_fn(|_| async { Ok(Value::from("ada")) }),
//!     )
//! });
//!
//! let source = loader.load("src/users/userResolvers.js".as_ref()).unwrap();
//! assert_eq!(source.into_map().len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::resolvers::ResolverMap;

/// A deferred resolver map, invoked once with no arguments.
pub type ResolverFactory = Box<dyn FnOnce() -> ResolverMap + Send>;

/// Callback turning a resolver source into a map, typically to inject
/// dependencies before the resolvers are used. It may borrow caller state.
pub type Transform<'a> = dyn Fn(ResolverSource) -> ResolverMap + 'a;

/// What a resolver module provides.
pub enum ResolverSource {
    /// A ready resolver map.
    Map(ResolverMap),
    /// A factory producing the resolver map.
    Factory(ResolverFactory),
}

impl ResolverSource {
    /// Wraps a factory closure.
    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce() -> ResolverMap + Send + 'static,
    {
        Self::Factory(Box::new(f))
    }

    /// Returns the resolver map, invoking the factory if needed.
    #[must_use]
    pub fn into_map(self) -> ResolverMap {
        match self {
            Self::Map(map) => map,
            Self::Factory(factory) => factory(),
        }
    }

    /// Returns the resolver map through `transform` when given, otherwise
    /// through [`ResolverSource::into_map`].
    #[must_use]
    pub fn apply(self, transform: Option<&Transform<'_>>) -> ResolverMap {
        match transform {
            Some(transform) => transform(self),
            None => self.into_map(),
        }
    }
}

impl From<ResolverMap> for ResolverSource {
    fn from(map: ResolverMap) -> Self {
        Self::Map(map)
    }
}

impl fmt::Debug for ResolverSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Errors raised while loading a resolver module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No module is registered for the file.
    #[error("Cannot find module '{}'", path.display())]
    NotFound {
        /// The file that was looked up.
        path: PathBuf,
    },

    /// The module exists but failed to load.
    #[error("Failed to load module '{}': {message}", path.display())]
    Failed {
        /// The file that was loaded.
        path: PathBuf,
        /// Failure description.
        message: String,
    },
}

/// Loads resolver modules found by `scan`.
pub trait ModuleLoader: Send + Sync {
    /// Loads the module for `path`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the module is unknown or fails to load; scanning
    /// stops with that error.
    fn load(&self, path: &Path) -> Result<ResolverSource, LoadError>;
}

type ModuleFactory = Arc<dyn Fn() -> ResolverSource + Send + Sync>;

/// Compiled table of resolver modules.
///
/// Lookup order for a scanned file: its full path, then its file name
/// (`userResolvers.js`), then its file stem (`userResolvers`).
#[derive(Default, Clone)]
pub struct StaticModuleLoader {
    modules: HashMap<String, ModuleFactory>,
}

impl StaticModuleLoader {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module exporting a resolver-map factory.
    #[must_use]
    pub fn module<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> ResolverMap + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        self.modules.insert(
            key.into(),
            Arc::new(move || {
                let factory = Arc::clone(&factory);
                ResolverSource::factory(move || factory())
            }),
        );
        self
    }

    /// Registers a module exporting a plain resolver map.
    #[must_use]
    pub fn module_map(mut self, key: impl Into<String>, map: ResolverMap) -> Self {
        self.modules
            .insert(key.into(), Arc::new(move || ResolverSource::Map(map.clone())));
        self
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns whether no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn find(&self, path: &Path) -> Option<&ModuleFactory> {
        let full = path.to_string_lossy();
        let file_name = path.file_name().map(|n| n.to_string_lossy());
        let stem = path.file_stem().map(|n| n.to_string_lossy());

        self.modules
            .get(full.as_ref())
            .or_else(|| file_name.and_then(|n| self.modules.get(n.as_ref())))
            .or_else(|| stem.and_then(|n| self.modules.get(n.as_ref())))
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, path: &Path) -> Result<ResolverSource, LoadError> {
        self.find(path)
            .map(|factory| factory())
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

impl fmt::Debug for StaticModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.modules.keys().collect();
        keys.sort();
        f.debug_struct("StaticModuleLoader")
            .field("modules", &keys)
            .finish()
    }
}
