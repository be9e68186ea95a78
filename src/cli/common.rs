//! Common utilities shared across CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::asset::{AssetServlet, DirSource, PackagedSource};
use crate::config::AppConfig;
use crate::debug;

/// Build the servlet over the configured packaged directory.
pub fn build_servlet(config: &AppConfig) -> Result<AssetServlet> {
    let source: Arc<dyn PackagedSource> = Arc::new(DirSource::new(&config.assets.source));
    debug!("assets"; "packaged source: {}", config.assets.source.display());

    AssetServlet::initialize(&config.assets, source).with_context(|| {
        format!(
            "failed to initialize {} from {}",
            config.assets.servlet_name,
            config.config_path.display()
        )
    })
}
