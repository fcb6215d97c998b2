//! Build command implementation.

use anyhow::{Context, Result};
use plog_core::Config;
use plog_render::{RenderSummary, SiteRenderer};
use std::path::Path;

/// Load the config and run one full render.
pub fn build_site(config_path: &Path) -> Result<RenderSummary> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    build_with_config(&config)
}

pub fn build_with_config(config: &Config) -> Result<RenderSummary> {
    tracing::info!(
        "Rendering {:?} into {:?}",
        config.docs_dir(),
        config.output_dir()
    );
    let summary = SiteRenderer::from_config(config)
        .render()
        .context("Failed to render documents")?;
    Ok(summary)
}
