//! Model error types.

/// Errors raised by models and model lookups.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No model with this name is known to the lookup.
    #[error("Unknown model: {model}")]
    UnknownModel {
        /// The requested model name.
        model: String,
    },

    /// The finder options could not be applied.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// The underlying data source failed.
    #[error("Data source error: {message}")]
    DataSource {
        /// Description of the failure.
        message: String,
    },

    /// An internal model error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl ModelError {
    /// Creates a new `UnknownModel` error.
    #[must_use]
    pub fn unknown_model(model: impl Into<String>) -> Self {
        Self::UnknownModel {
            model: model.into(),
        }
    }

    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a new `DataSource` error.
    #[must_use]
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownModel { .. } | Self::InvalidQuery { .. })
    }
}
