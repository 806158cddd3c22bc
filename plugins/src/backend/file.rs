use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use sitegen_core::api::{TaskReport, TaskReporter, TaskSource};

/// Reads one task payload from a local JSON file.
pub struct FileTaskSource {
    path: PathBuf,
}

impl FileTaskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaskSource for FileTaskSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> anyhow::Result<Option<Value>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| anyhow::anyhow!("read {} failed: {e}", self.path.display()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let payload: Value = serde_json::from_str(&text)?;
        Ok((!payload.is_null()).then_some(payload))
    }
}

/// Reporter for local runs: status transitions only go to the log.
#[derive(Debug, Default)]
pub struct LogReporter;

#[async_trait]
impl TaskReporter for LogReporter {
    async fn report(&self, report: &TaskReport) -> anyhow::Result<()> {
        let data = report
            .data
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        tracing::info!(
            target: "sitegen.report",
            reason = %report.status,
            timestamp = %report.timestamp,
            data = %data,
            "task report"
        );
        Ok(())
    }
}
