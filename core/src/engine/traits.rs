use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::content::front_matter::PostData;
use crate::runner::{CommandRunner, PackageManager};

use super::files;
use super::layout::SiteLayout;

/// Everything a provider needs to build an engine bound to one workspace.
#[derive(Clone)]
pub struct EngineContext {
    pub base_dir: PathBuf,
    pub runner: Arc<dyn CommandRunner>,
    pub package_manager: PackageManager,
    /// Script the workspace exposes for the engine CLI.
    pub script: String,
    pub debug: bool,
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("base_dir", &self.base_dir)
            .field("runner", &self.runner.name())
            .field("package_manager", &self.package_manager)
            .field("script", &self.script)
            .field("debug", &self.debug)
            .finish()
    }
}

/// A static site generation engine bound to one workspace.
///
/// `site()` is `None` until `init` succeeded. The default content primitives
/// work off that layout, so implementations usually only provide `init` and
/// `generate`.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    async fn init(&mut self) -> anyhow::Result<()>;

    fn site(&self) -> Option<&SiteLayout>;

    fn require_site(&self) -> anyhow::Result<&SiteLayout> {
        self.site()
            .ok_or_else(|| anyhow::anyhow!("engine '{}' is not initialized", self.name()))
    }

    /// Materialize the front matter of a new content file; returns its path.
    async fn create(&self, post: &PostData, replace: bool) -> anyhow::Result<PathBuf> {
        files::create_post(self.require_site()?, post, replace).await
    }

    /// Turn the matching draft into a post; returns the post path.
    async fn publish(&self, post: &PostData, replace: bool) -> anyhow::Result<PathBuf> {
        files::publish_draft(self.require_site()?, post, replace).await
    }

    /// Load the content source tree; returns the content files found.
    async fn process(&self) -> anyhow::Result<Vec<PathBuf>> {
        files::discover(self.require_site()?).await
    }

    async fn generate(&self) -> anyhow::Result<()>;

    /// Release engine resources. `error` is set when exiting because of a failure.
    async fn exit(&self, error: Option<&str>) -> anyhow::Result<()> {
        let _ = error;
        Ok(())
    }
}

/// Builds an engine for a workspace, or explains why it can't.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self, ctx: &EngineContext) -> anyhow::Result<Box<dyn GenerationEngine>>;
}
