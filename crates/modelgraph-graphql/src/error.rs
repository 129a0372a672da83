//! Error types for the schema registry.
//!
//! Errors fall in four groups: configuration (nothing to build, no model
//! lookup), resolution (a model could not be resolved for a request),
//! compilation (merge or schema construction failed) and collection (scanning
//! or loading project files). Every variant keeps its underlying cause.

use std::path::PathBuf;

use modelgraph_models::ModelError;

use crate::loader::LoadError;

/// Errors that can occur while assembling or using the schema registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A model-bound resolver was requested from a registry without a model lookup.
    #[error("Missing model resolver")]
    MissingModelLookup,

    /// The schema was requested before any type definitions were registered.
    #[error("Missing schemas for GraphQL")]
    NoSchemaFragments,

    /// The registry configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The model lookup failed for a request.
    #[error("Unable to resolve({model}). {source}")]
    Resolution {
        /// Name of the model that failed to resolve.
        model: String,
        /// Error reported by the model lookup.
        #[source]
        source: ModelError,
    },

    /// Merging or building the executable schema failed.
    #[error("Unable to start GraphQL. {0}")]
    Compilation(String),

    /// A scan path or a scanned file could not be read.
    #[error("Unable to scan {}: {source}", path.display())]
    Scan {
        /// The offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A scan path could not be turned into a glob pattern.
    #[error("Invalid scan path {}: {message}", path.display())]
    InvalidScanPath {
        /// The offending path.
        path: PathBuf,
        /// Pattern error description.
        message: String,
    },

    /// A resolver module could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl RegistryError {
    /// Returns a stable error code, suitable for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingModelLookup => "MISSING_MODEL_LOOKUP",
            Self::NoSchemaFragments => "NO_SCHEMA_FRAGMENTS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Resolution { .. } => "RESOLUTION_FAILED",
            Self::Compilation(_) => "SCHEMA_BUILD_FAILED",
            Self::Scan { .. } | Self::InvalidScanPath { .. } => "SCAN_FAILED",
            Self::Load(_) => "LOAD_FAILED",
        }
    }

    /// Returns whether the error is a configuration problem that no retry can fix.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingModelLookup | Self::NoSchemaFragments | Self::InvalidConfig(_)
        )
    }

    pub(crate) fn compilation(message: impl Into<String>) -> Self {
        Self::Compilation(message.into())
    }
}
