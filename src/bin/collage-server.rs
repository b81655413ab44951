use std::sync::Arc;

use anyhow::Context;
use collage_studio::config::Config;
use collage_studio::layout::LayoutRegistry;
use collage_studio::{logging, server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(logging::DEFAULT_DIRECTIVES);

    let config = Config::load().context("failed to load configuration")?;

    // Built once, shared with every request
    let registry = Arc::new(LayoutRegistry::builtin());
    info!(layouts = registry.len(), "layout catalog ready");

    server::serve(config, registry).await.context("collage server failed")?;
    Ok(())
}
