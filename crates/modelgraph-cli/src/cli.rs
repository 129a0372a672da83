use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "modelgraph")]
#[command(about = "Modelgraph CLI: inspect, check and query model-backed GraphQL schemas")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model definitions (JSON object keyed by model name)
    #[arg(short, long, global = true, env = "MODELGRAPH_MODELS")]
    pub models: Option<PathBuf>,

    /// Files or directories to scan for schema.graphql files
    #[arg(short, long, global = true)]
    pub scan: Vec<PathBuf>,

    /// Configuration file with a [graphql] section
    #[arg(short, long, global = true, env = "MODELGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not add list fields for every model to the Query type
    #[arg(long, global = true)]
    pub no_model_queries: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the merged type definitions
    Sdl(SdlArgs),
    /// Check that the schema compiles
    Check,
    /// Run a query against in-memory data
    Query(QueryArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum SdlSource {
    /// Merged fragments as registered
    #[default]
    Merged,
    /// SDL exported by the compiled schema
    Compiled,
}

#[derive(clap::Args)]
pub struct SdlArgs {
    /// Which SDL to print
    #[arg(long, default_value = "merged")]
    pub source: SdlSource,
}

#[derive(clap::Args)]
pub struct QueryArgs {
    /// Query text, or @file to read it from a file
    pub query: String,
    /// Variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,
    /// Rows per model (JSON object: model name -> array of rows)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Tenant passed in the request context
    #[arg(long)]
    pub tenant: Option<String>,
}
