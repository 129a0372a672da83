//! Registry lifecycle: memoization, empty registries, derivation, resolver
//! caching and project scanning.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_graphql::{Value, Variables};
use indexmap::IndexMap;
use modelgraph_graphql::resolvers::{
    FindResolverAdapter, ResolveInfo, ResolverAdapter, model_lookup_fn, resolver_fn,
};
use modelgraph_graphql::{
    RegistryEntry, RegistryError, RequestContext, ResolveParams, Resolver, ResolverMap,
    ResolverSource, SchemaRegistry, SchemaState, StaticModuleLoader,
};
use modelgraph_models::{
    AttributeDefinition, DataType, DynModel, MemoryModel, ModelDefinition, ModelError,
};
use serde_json::json;

fn ping_entry() -> RegistryEntry {
    RegistryEntry::new()
        .schema("type Query { ping: String }")
        .resolvers(ResolverMap::new().field(
            "Query",
            "ping",
            resolver_fn(|_| async { Ok(Value::from("pong")) }),
        ))
}

#[tokio::test]
async fn compiled_schema_is_memoized() {
    let mut registry = SchemaRegistry::new();
    registry.register([ping_entry()], None);

    let first = registry.ensure_compiled().await.unwrap();
    let second = registry.ensure_compiled().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &registry.schema().unwrap()));
}

#[tokio::test]
async fn registrations_after_compilation_are_ignored() {
    let mut registry = SchemaRegistry::new();
    registry.register([ping_entry()], None);
    let first = registry.ensure_compiled().await.unwrap();

    registry.register(
        [RegistryEntry::new().schema("type Query { version: String }")],
        None,
    );
    let second = registry.ensure_compiled().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!second.sdl().contains("version"));
    assert_eq!(registry.fragments().len(), 2);
}

#[tokio::test]
async fn empty_registry_fails_every_time() {
    let registry = SchemaRegistry::new();

    for _ in 0..3 {
        let err = registry.ensure_compiled().await.unwrap_err();
        assert!(matches!(err, RegistryError::NoSchemaFragments));
        assert_eq!(err.to_string(), "Missing schemas for GraphQL");
    }
    assert_eq!(registry.schema_state(), SchemaState::Uninitialized);

    let err = registry
        .execute("{ ping }", Variables::default(), RequestContext::new())
        .await
        .unwrap_err();
    assert!(err.is_configuration_error());
}

#[tokio::test]
async fn failed_compilation_is_poisoned_until_reset() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        [RegistryEntry::new().schema("type Query { widget: Widget }")],
        None,
    );

    let first = registry.ensure_compiled().await.unwrap_err();
    assert!(first.to_string().starts_with("Unable to start GraphQL. "));
    assert_eq!(registry.schema_state(), SchemaState::Failed);

    let again = registry.ensure_compiled().await.unwrap_err();
    assert_eq!(first.to_string(), again.to_string());

    // Fixing the fragments alone is not enough: the failure sticks.
    registry.register(
        [RegistryEntry::new().schema("type Widget { id: Int }")],
        None,
    );
    assert!(registry.ensure_compiled().await.is_err());

    assert!(registry.reset().await);
    let schema = registry.ensure_compiled().await.unwrap();
    assert!(schema.sdl().contains("type Widget"));
    assert_eq!(registry.schema_state(), SchemaState::Ready);
}

#[test]
fn derived_enum_and_type_fragments() {
    let mut models = IndexMap::new();
    models.insert(
        "M".to_string(),
        ModelDefinition::new()
            .graphql(true)
            .attribute("id", AttributeDefinition::new(DataType::Integer).primary_key())
            .attribute("status", AttributeDefinition::new(DataType::enumeration(["A", "B"])))
            .attribute("title", AttributeDefinition::new(DataType::String))
            .attribute("display", AttributeDefinition::new(DataType::Virtual)),
    );

    let mut registry = SchemaRegistry::new();
    registry.derive_from_models(&models);

    let fragments = registry.fragments();
    assert_eq!(
        fragments,
        [
            "enum MStatusEnumType {\n  A\n  B\n}",
            "type M {\n  id: Int!\n  status: MStatusEnumType\n  title: String\n}",
        ]
    );
}

struct CountingAdapter {
    built: Arc<AtomicUsize>,
}

impl ResolverAdapter for CountingAdapter {
    fn wrap(&self, model: DynModel) -> Resolver {
        self.built.fetch_add(1, Ordering::SeqCst);
        FindResolverAdapter.wrap(model)
    }
}

fn params(field: &str) -> ResolveParams {
    ResolveParams {
        parent: Value::Null,
        args: Default::default(),
        context: RequestContext::new(),
        info: ResolveInfo {
            parent_type: "Query".to_string(),
            field_name: field.to_string(),
            return_type: "[Widget]".to_string(),
            returns_list: true,
        },
    }
}

#[tokio::test]
async fn model_resolver_wrappers_are_cached_per_model() {
    let built = Arc::new(AtomicUsize::new(0));
    let widgets: DynModel = Arc::new(MemoryModel::new("Widget", "primary"));
    let gadgets: DynModel = Arc::new(MemoryModel::new("Gadget", "primary"));

    let lookup = model_lookup_fn(move |name, _, _| match name {
        "Widget" => Ok(Arc::clone(&widgets)),
        "Gadget" => Ok(Arc::clone(&gadgets)),
        other => Err(ModelError::unknown_model(other)),
    });
    let registry = SchemaRegistry::builder()
        .with_model_lookup(lookup)
        .with_resolver_adapter(CountingAdapter {
            built: Arc::clone(&built),
        })
        .build()
        .unwrap();

    let widget = registry.model_resolver("Widget").unwrap();
    widget.resolve(params("widgets")).await.unwrap();
    widget.resolve(params("widgets")).await.unwrap();

    // A second resolver for the same model shares the wrapper.
    let again = registry.model_resolver("Widget").unwrap();
    again.resolve(params("widgets")).await.unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    let gadget = registry.model_resolver("Gadget").unwrap();
    gadget.resolve(params("gadgets")).await.unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_eq!(registry.cached_model_resolvers(), 2);
}

#[tokio::test]
async fn failed_model_lookup_is_reported() {
    let registry = SchemaRegistry::builder()
        .with_model_lookup(model_lookup_fn(|name, _, _| {
            Err(ModelError::unknown_model(name))
        }))
        .build()
        .unwrap();

    let err = registry
        .model_resolver("Ghost")
        .unwrap()
        .resolve(params("ghosts"))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Unable to resolve(Ghost). Unknown model: Ghost");
}

#[tokio::test]
async fn scan_collects_resolvers_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("userResolvers.js"), "module.exports = () => ({})").unwrap();
    fs::write(
        dir.path().join("schema.graphql"),
        "\n  type Query { ping: String }  \n",
    )
    .unwrap();
    fs::write(dir.path().join("helpers.js"), "").unwrap();

    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    let loader = StaticModuleLoader::new().module("userResolvers", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        ResolverMap::new().field(
            "Query",
            "ping",
            resolver_fn(|_| async { Ok(Value::from("pong")) }),
        )
    });

    let mut registry = SchemaRegistry::builder().with_loader(loader).build().unwrap();
    registry.scan(dir.path(), None).unwrap();

    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(registry.resolver_maps().len(), 1);
    assert_eq!(registry.fragments(), ["type Query { ping: String }"]);

    let response = registry
        .execute("{ ping }", Variables::default(), RequestContext::new())
        .await
        .unwrap();
    assert_eq!(response.data.into_json().unwrap(), json!({"ping": "pong"}));
}

#[tokio::test]
async fn scan_accepts_several_paths() {
    let api = tempfile::tempdir().unwrap();
    let admin = tempfile::tempdir().unwrap();
    fs::write(api.path().join("schema.graphql"), "type Query { ping: String }").unwrap();
    fs::write(admin.path().join("schema.gql"), "extend type Query { stats: Int }").unwrap();

    let mut registry = SchemaRegistry::new();
    registry.scan([api.path(), admin.path()], None).unwrap();

    assert_eq!(registry.fragments().len(), 2);
    assert!(registry.merged_sdl().unwrap().contains("stats: Int"));
    assert!(registry.ensure_compiled().await.is_ok());
}

#[tokio::test]
async fn scan_transform_injects_dependencies_into_factories() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("greetingResolvers.js"), "").unwrap();
    fs::write(dir.path().join("mutations.js"), "").unwrap();
    fs::write(
        dir.path().join("schema.graphql"),
        "type Query { greeting: String }\ntype Mutation { touch: Boolean }",
    )
    .unwrap();

    let loader = StaticModuleLoader::new()
        .module("greetingResolvers", || {
            panic!("the transform replaces the factory call")
        })
        .module_map(
            "mutations",
            ResolverMap::new().field(
                "Mutation",
                "touch",
                resolver_fn(|_| async { Ok(Value::from(true)) }),
            ),
        );

    // Borrowed, not moved: the transform only lives for the scan.
    let greeting = String::from("hello");
    let transformed = AtomicUsize::new(0);
    let transform = |_source: ResolverSource| {
        transformed.fetch_add(1, Ordering::SeqCst);
        let greeting = greeting.clone();
        ResolverMap::new().field(
            "Query",
            "greeting",
            resolver_fn(move |_| {
                let greeting = greeting.clone();
                async move { Ok(Value::from(greeting)) }
            }),
        )
    };

    let mut registry = SchemaRegistry::builder().with_loader(loader).build().unwrap();
    registry.scan(dir.path(), Some(&transform)).unwrap();

    // Only the factory module went through the transform.
    assert_eq!(transformed.load(Ordering::SeqCst), 1);
    assert_eq!(registry.resolver_maps().len(), 2);

    let response = registry
        .execute("{ greeting }", Variables::default(), RequestContext::new())
        .await
        .unwrap();
    assert_eq!(response.data.into_json().unwrap(), json!({"greeting": "hello"}));
}

#[tokio::test]
async fn scan_skips_hidden_directories() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join(".cache");
    fs::create_dir_all(&cache).unwrap();
    fs::write(dir.path().join("schema.graphql"), "type Query { ping: String }").unwrap();
    fs::write(cache.join("schema.graphql"), "type Query { stale: Int }").unwrap();
    fs::write(cache.join("resolvers.js"), "").unwrap();

    let mut registry = SchemaRegistry::new();
    registry.scan(dir.path(), None).unwrap();

    assert_eq!(registry.fragments(), ["type Query { ping: String }"]);
    assert!(registry.resolver_maps().is_empty());
}

