use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SiteConfig;

use super::{EngineAdapter, GenerationEngine, SiteLayout, TracingLifecycle};

/// Engine over a plain directory using the default content primitives.
pub(crate) struct DirEngine {
    pub site: SiteLayout,
}

#[async_trait]
impl GenerationEngine for DirEngine {
    fn name(&self) -> &str {
        "dir"
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn site(&self) -> Option<&SiteLayout> {
        Some(&self.site)
    }

    async fn generate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) fn dir_adapter(base: &Path) -> EngineAdapter {
    let site = SiteLayout::from_config(base, &SiteConfig::new());
    EngineAdapter::from_engine(Box::new(DirEngine { site }), Arc::new(TracingLifecycle))
}
