use anyhow::Result;
use modelgraph_graphql::SchemaRegistry;

use crate::cli::SdlSource;

pub async fn sdl(registry: &SchemaRegistry, source: SdlSource) -> Result<()> {
    let sdl = match source {
        SdlSource::Merged => registry.merged_sdl()?,
        SdlSource::Compiled => registry.ensure_compiled().await?.sdl(),
    };
    println!("{}", sdl.trim_end());
    Ok(())
}
