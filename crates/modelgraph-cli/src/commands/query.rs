use std::fs;

use anyhow::{Context, Result};
use async_graphql::Variables;
use modelgraph_graphql::{RequestContext, SchemaRegistry};

use crate::cli::QueryArgs;
use crate::output::print_json;

pub async fn query(registry: &SchemaRegistry, args: &QueryArgs) -> Result<()> {
    let text = query_text(&args.query)?;
    let variables = match &args.variables {
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("--variables must be valid JSON")?;
            anyhow::ensure!(value.is_object(), "--variables must be a JSON object");
            Variables::from_json(value)
        }
        None => Variables::default(),
    };

    let context = RequestContext::builder()
        .with_request_id(format!("cli-{}", std::process::id()))
        .build();
    let response = registry.execute(text, variables, context).await?;

    print_json(&serde_json::to_value(&response)?)?;
    if response.is_err() {
        anyhow::bail!("Query returned {} error(s)", response.errors.len());
    }
    Ok(())
}

/// `@path` reads the query from a file.
fn query_text(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read query {path}"))
        }
        None => Ok(arg.to_string()),
    }
}
