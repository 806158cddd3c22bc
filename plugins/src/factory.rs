use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use sitegen_core::api::{
    engine_default_config, validate_backend, CommandRunner, ConfigMerger, EngineProvider,
    EngineSelector, ShellRunner, TaskReporter, TaskSource, WorkerConfig,
};
use sitegen_core::config::site;

use crate::backend::{FileTaskSource, HttpBackend, LogReporter};
use crate::engine::{BundledProvider, ProjectLocalProvider};

/// Where the task comes from and where its status goes.
pub struct Backend {
    pub source: Arc<dyn TaskSource>,
    pub reporter: Arc<dyn TaskReporter>,
}

pub fn build_runner(cfg: &WorkerConfig) -> Arc<dyn CommandRunner> {
    Arc::new(ShellRunner::new(&cfg.runner))
}

/// Project-local engine first (unless disabled), bundled engine as the fallback.
pub fn build_selector(cfg: &WorkerConfig) -> EngineSelector {
    let mut providers: Vec<Box<dyn EngineProvider>> = Vec::new();
    if cfg.engine.prefer_local {
        providers.push(Box::new(ProjectLocalProvider));
    }
    providers.push(Box::new(BundledProvider));
    EngineSelector::new(providers)
}

pub fn build_merger(cfg: &WorkerConfig) -> ConfigMerger {
    ConfigMerger::new(engine_default_config(), site::platform_defaults(&cfg.site))
}

/// A local payload file runs offline with reports going to the log; otherwise
/// the HTTP backend serves both roles and its settings must be complete.
pub fn build_backend(cfg: &WorkerConfig, payload: Option<&Path>) -> Result<Backend> {
    if let Some(path) = payload {
        return Ok(Backend {
            source: Arc::new(FileTaskSource::new(path)),
            reporter: Arc::new(LogReporter),
        });
    }

    validate_backend(cfg).map_err(anyhow::Error::msg)?;
    let http = Arc::new(HttpBackend::new(&cfg.backend)?);
    Ok(Backend {
        source: http.clone(),
        reporter: http,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selector_order_follows_prefer_local() {
        let mut cfg = WorkerConfig::default();
        assert_eq!(build_selector(&cfg).provider_names(), vec!["project-local", "bundled"]);

        cfg.engine.prefer_local = false;
        assert_eq!(build_selector(&cfg).provider_names(), vec!["bundled"]);
    }

    #[test]
    fn http_backend_requires_complete_settings() {
        let err = build_backend(&WorkerConfig::default(), None).err().unwrap();
        assert!(err.to_string().contains("WORKER_SECRET"));
    }

    #[test]
    fn payload_file_needs_no_backend_settings() {
        let backend = build_backend(&WorkerConfig::default(), Some(Path::new("task.json"))).unwrap();
        assert_eq!(backend.source.name(), "file");
    }
}
