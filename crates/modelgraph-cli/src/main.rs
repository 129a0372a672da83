mod cli;
mod commands;
mod observability;
mod output;
mod project;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;
use project::{Project, Rows};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    let project = Project::load(
        cli.config.as_deref(),
        cli.models.as_deref(),
        cli.scan.clone(),
        !cli.no_model_queries,
    )?;

    match &cli.command {
        Commands::Sdl(args) => {
            let registry = project.registry(Rows::new())?;
            commands::sdl::sdl(&registry, args.source).await?;
        }
        Commands::Check => {
            let registry = project.registry(Rows::new())?;
            commands::check::check(&registry).await?;
        }
        Commands::Query(args) => {
            let rows = match &args.data {
                Some(path) => project::load_rows(path)?,
                None => {
                    if !project.models.is_empty() {
                        output::print_warning("No --data given; every model is empty");
                    }
                    Rows::new()
                }
            };
            let registry = project.registry(rows)?;
            commands::query::query(&registry, args).await?;
        }
    }

    Ok(())
}
