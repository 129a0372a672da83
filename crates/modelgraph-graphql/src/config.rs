//! Registry configuration.
//!
//! Configuration can be specified in TOML, typically under a `[graphql]`
//! section of the application config.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! script_extensions = ["js"]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Schema registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Extensions (without the dot) of resolver/mutator module files picked up
    /// by `scan`.
    /// Default: ["js"]
    #[serde(default = "default_script_extensions")]
    pub script_extensions: Vec<String>,

    /// Name of the query root type, unless a `schema { ... }` block says otherwise.
    /// Default: "Query"
    #[serde(default = "default_query_type")]
    pub query_type: String,

    /// Name of the mutation root type, used when such a type is defined.
    /// Default: "Mutation"
    #[serde(default = "default_mutation_type")]
    pub mutation_type: String,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_script_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

fn default_query_type() -> String {
    "Query".to_string()
}

fn default_mutation_type() -> String {
    "Mutation".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            script_extensions: default_script_extensions(),
            query_type: default_query_type(),
            mutation_type: default_mutation_type(),
        }
    }
}

impl RegistryConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidConfig` if the text is not valid TOML,
    /// does not match the schema, or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, RegistryError> {
        let config: Self =
            toml::from_str(text).map_err(|e| RegistryError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidConfig` if configuration values are invalid.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.max_depth == 0 {
            return Err(RegistryError::InvalidConfig(
                "graphql.max_depth must be > 0".into(),
            ));
        }
        if self.max_complexity == 0 {
            return Err(RegistryError::InvalidConfig(
                "graphql.max_complexity must be > 0".into(),
            ));
        }
        if let Some(ext) = self
            .script_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.') || ext.contains('/'))
        {
            return Err(RegistryError::InvalidConfig(format!(
                "graphql.script_extensions entry '{ext}' must be a bare extension like \"js\""
            )));
        }
        if self.query_type.trim().is_empty() || self.mutation_type.trim().is_empty() {
            return Err(RegistryError::InvalidConfig(
                "graphql root type names must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Returns whether `ext` is one of the configured script extensions.
    #[must_use]
    pub fn is_script_extension(&self, ext: &str) -> bool {
        self.script_extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}
