//! Generation engine providers: the engine installed in the workspace, and the
//! one shipped with the worker.
mod bundled;
mod project_local;

use std::path::Path;

use sitegen_core::api::SiteConfig;
use sitegen_core::config::site;

pub use bundled::{BundledEngine, BundledProvider};
pub use project_local::{ProjectLocalEngine, ProjectLocalProvider};

/// The workspace site configuration, or an empty one when the file is absent.
async fn read_site_config(base_dir: &Path) -> anyhow::Result<SiteConfig> {
    match site::locate(base_dir).await {
        Some(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow::anyhow!("read {} failed: {e}", path.display()))?;
            site::parse(&text)
        }
        None => {
            tracing::debug!("no site config in {}, using layout defaults", base_dir.display());
            Ok(SiteConfig::new())
        }
    }
}
