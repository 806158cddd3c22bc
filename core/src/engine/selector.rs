use crate::error::TaskError;

use super::traits::{EngineContext, EngineProvider, GenerationEngine};

/// Tries providers in order and keeps the first engine that loads.
pub struct EngineSelector {
    providers: Vec<Box<dyn EngineProvider>>,
}

impl EngineSelector {
    pub fn new(providers: Vec<Box<dyn EngineProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// A provider that fails to load is logged and skipped; only running out
    /// of providers is an error.
    pub async fn select(&self, ctx: &EngineContext) -> Result<Box<dyn GenerationEngine>, TaskError> {
        let mut last_error = None;
        for provider in &self.providers {
            tracing::debug!(
                provider = provider.name(),
                base_dir = %ctx.base_dir.display(),
                "try load engine"
            );
            match provider.load(ctx).await {
                Ok(engine) => {
                    tracing::info!(provider = provider.name(), "Use {} engine", engine.name());
                    return Ok(engine);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "engine loading failed in {}, falling back",
                        ctx.base_dir.display()
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(TaskError::GenerationEngine(match last_error {
            Some(e) => format!("no engine could be loaded: {e}"),
            None => "no engine providers configured".to_string(),
        }))
    }
}
