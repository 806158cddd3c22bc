use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::content::front_matter::PostData;
use crate::content::Layout;
use crate::error::{ProcessError, TaskError};

use super::hooks::EngineLifecycle;
use super::layout::SiteLayout;
use super::selector::EngineSelector;
use super::traits::{EngineContext, GenerationEngine};

/// Keeps a `ProcessError` raised inside an engine typed; anything else is an
/// engine failure.
fn engine_error(err: anyhow::Error) -> TaskError {
    match err.downcast::<ProcessError>() {
        Ok(p) => TaskError::Process(p),
        Err(e) => TaskError::engine(format!("{e:#}")),
    }
}

/// Drives one engine through init, content operations, generate and exit,
/// firing lifecycle callbacks along the way.
pub struct EngineAdapter {
    engine: Box<dyn GenerationEngine>,
    lifecycle: Arc<dyn EngineLifecycle>,
    exited: AtomicBool,
}

impl EngineAdapter {
    /// Install workspace dependencies, pick an engine and initialize it.
    #[tracing::instrument(name = "engine.init", skip_all, fields(base_dir = %ctx.base_dir.display()))]
    pub async fn init(
        ctx: &EngineContext,
        selector: &EngineSelector,
        lifecycle: Arc<dyn EngineLifecycle>,
        install_dependencies: bool,
    ) -> Result<Self, TaskError> {
        if install_dependencies {
            tracing::info!("Installing node modules for {}", ctx.base_dir.display());
            ctx.runner
                .exec(ctx.package_manager.install_command(), &ctx.base_dir)
                .await?;
            tracing::info!("Successfully install node modules");
        }

        let mut engine = selector.select(ctx).await?;
        if let Err(e) = engine.init().await {
            let message = format!("{e:#}");
            if let Err(exit_err) = engine.exit(Some(&message)).await {
                tracing::warn!(error = %exit_err, "engine exit after failed init also failed");
            }
            lifecycle.on_exit(Some(&message));
            return Err(TaskError::engine(format!("init failed: {message}")));
        }

        tracing::info!("{} version: {}", engine.name(), engine.version());
        if let Some(site) = engine.site() {
            tracing::debug!(
                base_dir = %site.base_dir.display(),
                source_dir = %site.source_dir.display(),
                public_dir = %site.public_dir.display(),
                "engine directories"
            );
        }
        tracing::info!("{} has been initialized", engine.name());
        lifecycle.on_ready(engine.name(), engine.version());

        Ok(Self::from_engine(engine, lifecycle))
    }

    /// Wrap an engine that is already initialized.
    pub fn from_engine(engine: Box<dyn GenerationEngine>, lifecycle: Arc<dyn EngineLifecycle>) -> Self {
        Self {
            engine,
            lifecycle,
            exited: AtomicBool::new(false),
        }
    }

    pub fn site(&self) -> Result<&SiteLayout, TaskError> {
        self.engine.require_site().map_err(engine_error)
    }

    /// Where the item titled `title` lives under `layout`. Always computed
    /// from the current layout, never cached.
    pub fn resolve_path(
        &self,
        title: &str,
        layout: Layout,
        date: DateTime<Utc>,
    ) -> Result<PathBuf, TaskError> {
        Ok(self.site()?.canonical_path(title, layout, date))
    }

    pub async fn create(&self, post: &PostData, replace: bool) -> Result<PathBuf, TaskError> {
        let path = self.engine.create(post, replace).await.map_err(engine_error)?;
        self.lifecycle.on_item_discovered(&path);
        Ok(path)
    }

    pub async fn publish(&self, post: &PostData, replace: bool) -> Result<PathBuf, TaskError> {
        let path = self.engine.publish(post, replace).await.map_err(engine_error)?;
        self.lifecycle.on_item_discovered(&path);
        Ok(path)
    }

    /// Process the source tree then generate output. Returns the number of
    /// content items found. On failure the engine is exited with the error
    /// before it is returned.
    #[tracing::instrument(name = "engine.generate", skip_all, fields(engine = self.engine.name()))]
    pub async fn generate(&self) -> Result<usize, TaskError> {
        match self.process_and_generate().await {
            Ok(count) => Ok(count),
            Err(e) => {
                if let Err(exit_err) = self.exit(Some(&e.to_string())).await {
                    tracing::warn!(error = %exit_err, "engine exit after failed generate also failed");
                }
                Err(e)
            }
        }
    }

    async fn process_and_generate(&self) -> Result<usize, TaskError> {
        self.lifecycle.on_process_started();
        let items = self.engine.process().await.map_err(engine_error)?;
        self.lifecycle.on_process_finished();

        self.lifecycle.on_generate_started(items.len());
        self.engine.generate().await.map_err(engine_error)?;
        self.lifecycle.on_generate_finished();
        Ok(items.len())
    }

    /// Release the engine. Only the first call reaches the engine.
    pub async fn exit(&self, error: Option<&str>) -> Result<(), TaskError> {
        if self.exited.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let result = self.engine.exit(error).await;
        self.lifecycle.on_exit(error);
        result.map_err(engine_error)
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }
}

impl Drop for EngineAdapter {
    fn drop(&mut self) {
        if !self.exited.load(Ordering::SeqCst) {
            tracing::warn!(engine = self.engine.name(), "engine dropped without exit");
        }
    }
}
