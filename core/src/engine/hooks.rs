use std::path::Path;

/// Lifecycle callbacks the adapter invokes, in order, while driving an engine.
///
/// Every slot defaults to a no-op.
pub trait EngineLifecycle: Send + Sync {
    fn on_ready(&self, _engine: &str, _version: &str) {}
    fn on_item_discovered(&self, _path: &Path) {}
    fn on_process_started(&self) {}
    fn on_process_finished(&self) {}
    fn on_generate_started(&self, _item_count: usize) {}
    fn on_generate_finished(&self) {}
    fn on_exit(&self, _error: Option<&str>) {}
}

/// Logs every lifecycle event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLifecycle;

impl EngineLifecycle for TracingLifecycle {
    fn on_ready(&self, engine: &str, version: &str) {
        tracing::debug!(target: "sitegen.engine", engine, version, "engine initialization finished");
    }

    fn on_item_discovered(&self, path: &Path) {
        tracing::debug!(target: "sitegen.engine", path = %path.display(), "new content item");
    }

    fn on_process_started(&self) {
        tracing::debug!(target: "sitegen.engine", "engine process started");
    }

    fn on_process_finished(&self) {
        tracing::debug!(target: "sitegen.engine", "engine process finished");
    }

    fn on_generate_started(&self, item_count: usize) {
        tracing::debug!(target: "sitegen.engine", item_count, "found {item_count} content items");
    }

    fn on_generate_finished(&self) {
        tracing::debug!(target: "sitegen.engine", "engine generate finished");
    }

    fn on_exit(&self, error: Option<&str>) {
        match error {
            Some(error) => tracing::warn!(target: "sitegen.engine", error, "engine exited on failure"),
            None => tracing::debug!(target: "sitegen.engine", "engine exited"),
        }
    }
}
