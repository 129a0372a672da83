use anyhow::Result;
use modelgraph_graphql::SchemaRegistry;
use modelgraph_graphql::schema::merge::{TypeDefKind, merge_type_definitions};

use crate::output::{print_success, print_table};

pub async fn check(registry: &SchemaRegistry) -> Result<()> {
    registry.ensure_compiled().await?;

    let definitions = merge_type_definitions(registry.fragments())?;
    let rows = definitions
        .types()
        .map(|ty| {
            let (kind, members) = describe(&ty.kind);
            [ty.name.clone(), kind.to_string(), members.to_string()]
        })
        .collect();
    print_table(["Type", "Kind", "Members"], rows);

    let resolvers: usize = registry.resolver_maps().iter().map(|m| m.len()).sum();
    print_success(&format!(
        "Schema compiles: {} types from {} fragments, {} field resolvers",
        definitions.len(),
        registry.fragments().len(),
        resolvers
    ));
    Ok(())
}

fn describe(kind: &TypeDefKind) -> (&'static str, usize) {
    match kind {
        TypeDefKind::Scalar => ("scalar", 0),
        TypeDefKind::Object(object) => ("object", object.fields.len()),
        TypeDefKind::Interface(object) => ("interface", object.fields.len()),
        TypeDefKind::Union(members) => ("union", members.len()),
        TypeDefKind::Enum(values) => ("enum", values.len()),
        TypeDefKind::InputObject(fields) => ("input", fields.len()),
    }
}
