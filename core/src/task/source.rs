use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::TaskError;

/// Where tasks come from.
#[async_trait]
pub trait TaskSource: Send + Sync {
    fn name(&self) -> &str;

    /// One pending task payload, or `None` when there is nothing to do.
    async fn fetch(&self) -> anyhow::Result<Option<Value>>;
}

/// Where task status transitions go.
#[async_trait]
pub trait TaskReporter: Send + Sync {
    async fn report(&self, report: &TaskReport) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Started,
    Finished,
    Errored,
    HealthCheck,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Finished => "FINISHED",
            Self::Errored => "ERRORED",
            Self::HealthCheck => "HEALTH_CHECK",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped status event. The reporter adds the worker identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    #[serde(rename = "reason")]
    pub status: TaskStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TaskReport {
    pub fn new(status: TaskStatus, data: Option<Value>) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn started(task_id: &str, method: &str) -> Self {
        Self::new(
            TaskStatus::Started,
            Some(serde_json::json!({ "taskId": task_id, "taskMethod": method })),
        )
    }

    pub fn finished(data: Value) -> Self {
        Self::new(TaskStatus::Finished, Some(data))
    }

    pub fn errored(err: &TaskError) -> Self {
        Self::new(
            TaskStatus::Errored,
            Some(serde_json::json!({ "message": err.to_string() })),
        )
    }

    pub fn health(data: Value) -> Self {
        Self::new(TaskStatus::HealthCheck, Some(data))
    }
}
