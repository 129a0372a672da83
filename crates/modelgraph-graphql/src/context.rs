//! Per-request execution context.
//!
//! A [`RequestContext`] travels with every query: it is attached to the
//! async-graphql request as data, handed to every resolver through
//! [`ResolveParams`](crate::resolvers::ResolveParams), and passed to the
//! [`ModelLookup`](crate::resolvers::ModelLookup) so that models can be
//! chosen per request or per tenant.
//!
//! # Example
//!
//! ```
//! use modelgraph_graphql::RequestContext;
//!
//! #[derive(Clone)]
//! struct CurrentUser(u64);
//!
//! let context = RequestContext::builder()
//!     .with_request_id("req-123")
//!     .with_tenant("acme")
//!     .with_attribute("locale", serde_json::json!("en"))
//!     .with_extension(CurrentUser(7))
//!     .build();
//!
//! assert_eq!(context.tenant(), Some("acme"));
//! assert_eq!(context.extension::<CurrentUser>().map(|u| u.0), Some(7));
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};

/// GraphQL request context.
///
/// Cheap to clone: shared state sits behind `Arc`s.
#[derive(Clone, Default, Debug)]
pub struct RequestContext {
    request_id: Option<String>,
    tenant: Option<String>,
    attributes: Arc<Map<String, Value>>,
    extensions: Arc<http::Extensions>,
}

impl RequestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Request ID for tracing and correlation.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Tenant (data source) the request is bound to.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// Returns a free-form attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// All free-form attributes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns a typed extension.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

/// Builder for [`RequestContext`].
#[derive(Default)]
pub struct RequestContextBuilder {
    request_id: Option<String>,
    tenant: Option<String>,
    attributes: Map<String, Value>,
    extensions: http::Extensions,
}

impl RequestContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Sets the tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Sets a free-form attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Stores a typed extension, replacing any previous value of that type.
    #[must_use]
    pub fn with_extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> RequestContext {
        RequestContext {
            request_id: self.request_id,
            tenant: self.tenant,
            attributes: Arc::new(self.attributes),
            extensions: Arc::new(self.extensions),
        }
    }
}
