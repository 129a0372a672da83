//! End-to-end queries against derived model types served by in-memory models.

use std::sync::Arc;

use async_graphql::Variables;
use indexmap::IndexMap;
use modelgraph_graphql::resolvers::model_lookup_fn;
use modelgraph_graphql::{
    RegistryEntry, RegistryError, RequestContext, ResolverMap, SchemaRegistry,
};
use modelgraph_models::{
    AttributeDefinition, DataType, DynModel, MemoryModel, ModelDefinition, ModelError,
};
use serde_json::json;

fn widget_definition() -> ModelDefinition {
    ModelDefinition::new()
        .graphql(true)
        .attribute("id", AttributeDefinition::new(DataType::Integer).primary_key())
        .attribute(
            "name",
            AttributeDefinition::new(DataType::String)
                .not_null()
                .comment("Display name"),
        )
        .attribute(
            "status",
            AttributeDefinition::new(DataType::enumeration(["ACTIVE", "RETIRED"])),
        )
        .attribute("tags", AttributeDefinition::new(DataType::array(DataType::String)))
}

fn rows(prefix: &str) -> Vec<serde_json::Value> {
    vec![
        json!({"id": 1, "name": format!("{prefix}-bolt"), "status": "ACTIVE", "tags": ["m8"]}),
        json!({"id": 2, "name": format!("{prefix}-nut"), "status": "RETIRED", "tags": []}),
        json!({"id": 3, "name": format!("{prefix}-gear"), "status": "ACTIVE", "tags": ["large"]}),
    ]
}

/// Registry whose `Widget` model lives in a per-tenant data source.
fn tenant_registry() -> Result<SchemaRegistry, RegistryError> {
    let acme: DynModel = Arc::new(MemoryModel::with_rows("Widget", "acme", rows("acme")));
    let globex: DynModel = Arc::new(MemoryModel::with_rows("Widget", "globex", rows("globex")));

    let lookup = model_lookup_fn(move |name, _, context| match (name, context.tenant()) {
        ("Widget", Some("globex")) => Ok(Arc::clone(&globex)),
        ("Widget", _) => Ok(Arc::clone(&acme)),
        (other, _) => Err(ModelError::unknown_model(other)),
    });

    let mut registry = SchemaRegistry::builder().with_model_lookup(lookup).build()?;

    let mut models = IndexMap::new();
    models.insert("Widget".to_string(), widget_definition());

    let widgets = registry.model_resolver("Widget")?;
    let resolvers = ResolverMap::new()
        .field("Query", "widgets", Arc::clone(&widgets))
        .field("Query", "widget", widgets);

    registry.derive_from_models(&models).register(
        [RegistryEntry::new()
            .schema(
                "type Query {\n  widgets(status: WidgetStatusEnumType, limit: Int, offset: Int, order: String): [Widget!]!\n  widget(id: Int!): Widget\n}",
            )
            .resolvers(resolvers)],
        None,
    );

    Ok(registry)
}

async fn query(
    registry: &SchemaRegistry,
    query: &str,
    context: RequestContext,
) -> serde_json::Value {
    let response = registry
        .execute(query, Variables::default(), context)
        .await
        .unwrap();
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

#[tokio::test]
async fn list_query_with_enum_filter_and_order() {
    let registry = tenant_registry().unwrap();

    let data = query(
        &registry,
        r#"{ widgets(status: ACTIVE, order: "reverse:id") { id name status tags } }"#,
        RequestContext::new(),
    )
    .await;

    assert_eq!(
        data,
        json!({"widgets": [
            {"id": 3, "name": "acme-gear", "status": "ACTIVE", "tags": ["large"]},
            {"id": 1, "name": "acme-bolt", "status": "ACTIVE", "tags": ["m8"]},
        ]})
    );
}

#[tokio::test]
async fn single_query_and_pagination() {
    let registry = tenant_registry().unwrap();

    let data = query(
        &registry,
        "{ widget(id: 2) { name status } widgets(limit: 1, offset: 1) { id } }",
        RequestContext::new(),
    )
    .await;

    assert_eq!(
        data,
        json!({
            "widget": {"name": "acme-nut", "status": "RETIRED"},
            "widgets": [{"id": 2}],
        })
    );

    let missing = query(&registry, "{ widget(id: 42) { name } }", RequestContext::new()).await;
    assert_eq!(missing, json!({"widget": null}));
}

#[tokio::test]
async fn tenant_selects_data_source() {
    let registry = tenant_registry().unwrap();

    let globex = RequestContext::builder().with_tenant("globex").build();
    let data = query(&registry, "{ widget(id: 1) { name } }", globex).await;
    assert_eq!(data, json!({"widget": {"name": "globex-bolt"}}));

    let data = query(&registry, "{ widget(id: 1) { name } }", RequestContext::new()).await;
    assert_eq!(data, json!({"widget": {"name": "acme-bolt"}}));

    // One wrapper per data source, reused across queries.
    assert_eq!(registry.cached_model_resolvers(), 2);
}

#[tokio::test]
async fn derived_descriptions_reach_the_schema() {
    let registry = tenant_registry().unwrap();
    let schema = registry.ensure_compiled().await.unwrap();

    let sdl = schema.sdl();
    assert!(sdl.contains("Display name"));
    assert!(sdl.contains("enum WidgetStatusEnumType"));
}

#[tokio::test]
async fn unknown_model_is_a_field_error() {
    let mut registry = SchemaRegistry::builder()
        .with_model_lookup(model_lookup_fn(|name, _, _| {
            Err(ModelError::unknown_model(name))
        }))
        .build()
        .unwrap();

    let ghosts = registry.model_resolver("Ghost").unwrap();
    registry.register(
        [RegistryEntry::new()
            .schema("type Ghost { id: Int }\ntype Query { ghosts: [Ghost] }")
            .resolvers(ResolverMap::new().field("Query", "ghosts", ghosts))],
        None,
    );

    let response = registry
        .execute("{ ghosts { id } }", Variables::default(), RequestContext::new())
        .await
        .unwrap();

    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Unable to resolve(Ghost). Unknown model: Ghost"
    );
    assert_eq!(response.data.into_json().unwrap(), json!({"ghosts": null}));
}
