//! Lazy schema compilation.
//!
//! `LazySchema` holds the executable schema of a registry. It is built on
//! first demand under a build lock, so concurrent first accesses wait for a
//! single build, and it is never replaced afterwards.
//!
//! A failed build poisons the holder: later accesses return the same error
//! without rebuilding until [`LazySchema::reset`] is called. Running out of
//! fragments is not a failure and never poisons.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use async_graphql::dynamic::Schema;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::RegistryError;

/// State of the lazy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Schema has not been built yet.
    Uninitialized,
    /// Schema is currently being built.
    Building,
    /// Schema is ready for use.
    Ready,
    /// Schema build failed; a reset is required before the next attempt.
    Failed,
}

/// Thread-safe lazy schema holder.
#[derive(Default)]
pub struct LazySchema {
    /// The compiled schema, set at most once.
    schema: OnceLock<Arc<Schema>>,

    /// Build lock, guarding the message of the last failed build.
    failure: Mutex<Option<String>>,

    /// Set while `build` runs.
    building: AtomicBool,

    /// Mirrors `failure.is_some()` for lock-free state reads.
    failed: AtomicBool,
}

impl LazySchema {
    /// Creates an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema if it has been built.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Schema>> {
        self.schema.get().cloned()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SchemaState {
        if self.schema.get().is_some() {
            SchemaState::Ready
        } else if self.building.load(Ordering::Acquire) {
            SchemaState::Building
        } else if self.failed.load(Ordering::Acquire) {
            SchemaState::Failed
        } else {
            SchemaState::Uninitialized
        }
    }

    /// Gets the schema, running `build` if it has not been built yet.
    ///
    /// # Errors
    ///
    /// Returns the error of `build`, or the recorded compilation error if a
    /// previous build failed and no reset happened since.
    pub async fn get_or_build<F>(&self, build: F) -> Result<Arc<Schema>, RegistryError>
    where
        F: FnOnce() -> Result<Schema, RegistryError>,
    {
        if let Some(schema) = self.schema.get() {
            return Ok(Arc::clone(schema));
        }

        let mut failure = self.failure.lock().await;

        // Another caller may have finished the build while we waited.
        if let Some(schema) = self.schema.get() {
            return Ok(Arc::clone(schema));
        }
        if let Some(message) = failure.as_ref() {
            return Err(RegistryError::Compilation(message.clone()));
        }

        info!("Building GraphQL schema...");
        self.building.store(true, Ordering::Release);
        let result = match build() {
            Ok(schema) => {
                info!("GraphQL schema built successfully");
                Ok(Arc::clone(self.schema.get_or_init(|| Arc::new(schema))))
            }
            Err(RegistryError::Compilation(message)) => {
                warn!(error = %message, "Failed to build GraphQL schema");
                *failure = Some(message.clone());
                self.failed.store(true, Ordering::Release);
                Err(RegistryError::Compilation(message))
            }
            Err(e) => {
                warn!(error = %e, "GraphQL schema is not available");
                Err(e)
            }
        };
        // Cleared only once the outcome is recorded.
        self.building.store(false, Ordering::Release);
        result
    }

    /// Clears a failed build so the next access retries.
    ///
    /// A ready schema is kept. Returns whether a failure was cleared.
    pub async fn reset(&self) -> bool {
        let mut failure = self.failure.lock().await;
        let cleared = failure.take().is_some();
        self.failed.store(false, Ordering::Release);
        if cleared {
            info!("Cleared failed GraphQL schema build");
        }
        cleared
    }

    /// Returns the message of the last failed build, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.failure.lock().await.clone()
    }
}

impl std::fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySchema")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::schema::SchemaCompiler;

    fn ping_schema() -> Result<Schema, RegistryError> {
        SchemaCompiler::default().compile(&["type Query { ping: String }"], &[])
    }

    #[tokio::test]
    async fn test_built_once() {
        let lazy = LazySchema::new();
        assert_eq!(lazy.state(), SchemaState::Uninitialized);
        assert!(lazy.get().is_none());

        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            ping_schema()
        };

        let first = lazy.get_or_build(build).await.unwrap();
        let second = lazy.get_or_build(build).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(lazy.state(), SchemaState::Ready);
    }

    #[tokio::test]
    async fn test_failure_poisons_until_reset() {
        let lazy = LazySchema::new();

        let err = lazy
            .get_or_build(|| Err(RegistryError::compilation("boom")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unable to start GraphQL. boom");
        assert_eq!(lazy.state(), SchemaState::Failed);

        // Poisoned: the builder is not called again.
        let err = lazy.get_or_build(ping_schema).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to start GraphQL. boom");
        assert_eq!(lazy.last_error().await.as_deref(), Some("boom"));

        assert!(lazy.reset().await);
        assert_eq!(lazy.state(), SchemaState::Uninitialized);
        assert!(lazy.get_or_build(ping_schema).await.is_ok());
        assert!(!lazy.reset().await);
        assert_eq!(lazy.state(), SchemaState::Ready);
    }

    #[tokio::test]
    async fn test_missing_fragments_do_not_poison() {
        let lazy = LazySchema::new();

        for _ in 0..2 {
            let err = lazy
                .get_or_build(|| Err(RegistryError::NoSchemaFragments))
                .await
                .unwrap_err();
            assert!(matches!(err, RegistryError::NoSchemaFragments));
        }
        assert_eq!(lazy.state(), SchemaState::Uninitialized);
        assert!(lazy.get_or_build(ping_schema).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_first_access() {
        let lazy = Arc::new(LazySchema::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                let builds = Arc::clone(&builds);
                tokio::spawn(async move {
                    lazy.get_or_build(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        ping_schema()
                    })
                    .await
                })
            })
            .collect();

        let mut schemas = Vec::new();
        for handle in handles {
            schemas.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(schemas.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_state_tracks_build_not_lock() {
        let lazy = LazySchema::new();

        // Holding the lock outside a build (as `reset` does) is not building.
        {
            let _guard = lazy.failure.lock().await;
            assert_eq!(lazy.state(), SchemaState::Uninitialized);
        }

        let mut seen = None;
        lazy.get_or_build(|| {
            seen = Some(lazy.state());
            Err(RegistryError::compilation("boom"))
        })
        .await
        .unwrap_err();
        assert_eq!(seen, Some(SchemaState::Building));

        let _guard = lazy.failure.lock().await;
        assert_eq!(lazy.state(), SchemaState::Failed);
    }
}
