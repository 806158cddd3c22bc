use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use crate::config::{user_site_fields, ConfigMerger, MergeOutcome, WorkerConfig};
use crate::content::{BatchReport, ContentManager, Layout};
use crate::engine::{EngineAdapter, EngineContext, EngineLifecycle, EngineSelector, TracingLifecycle};
use crate::error::TaskError;
use crate::runner::{CommandRunner, PackageManager};

use super::model::{Task, TaskMethod};
use super::source::{TaskReport, TaskReporter, TaskSource};

/// What a finished task did; sent along with the FINISHED report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskSummary {
    Config { config: MergeOutcome },
    Generate { config: MergeOutcome, items: usize },
    Content(BatchReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub task_id: String,
    pub task_method: TaskMethod,
    pub workspace: PathBuf,
    pub summary: TaskSummary,
}

pub struct DispatcherArgs {
    pub config: WorkerConfig,
    pub source: Arc<dyn TaskSource>,
    pub reporter: Arc<dyn TaskReporter>,
    pub runner: Arc<dyn CommandRunner>,
    pub selector: EngineSelector,
    pub merger: ConfigMerger,
}

/// Runs exactly one task: fetch, validate, merge config, init the engine,
/// dispatch to one handler, exit the engine and report.
pub struct Dispatcher {
    config: WorkerConfig,
    source: Arc<dyn TaskSource>,
    reporter: Arc<dyn TaskReporter>,
    runner: Arc<dyn CommandRunner>,
    selector: EngineSelector,
    merger: ConfigMerger,
    lifecycle: Arc<dyn EngineLifecycle>,
}

impl Dispatcher {
    pub fn new(args: DispatcherArgs) -> Self {
        let DispatcherArgs {
            config,
            source,
            reporter,
            runner,
            selector,
            merger,
        } = args;
        Self {
            config,
            source,
            reporter,
            runner,
            selector,
            merger,
            lifecycle: Arc::new(TracingLifecycle),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn EngineLifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub async fn run(&self) -> Result<DispatchOutcome, TaskError> {
        let payload = self
            .source
            .fetch()
            .await
            .map_err(|e| TaskError::TaskFetch(format!("{e:#}")))?
            .ok_or_else(|| {
                TaskError::TaskFetch("Can not get task config from backend or gateway".into())
            })?;

        let task = Task::from_value(payload)?;
        let span = tracing::info_span!("task", task_id = %task.id, method = %task.method);
        self.run_task(task).instrument(span).await
    }

    /// Everything after the fetch. Validation failures return before the
    /// workspace is touched.
    pub async fn run_task(&self, task: Task) -> Result<DispatchOutcome, TaskError> {
        tracing::info!("Task id {} start, method {}", task.id, task.method);

        let workspace = self
            .config
            .workspace
            .tmp_root()
            .join(&task.workspace)
            .join(&task.repo_name);
        tracing::debug!("work dir is: {}", workspace.display());
        let is_dir = tokio::fs::metadata(&workspace)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(TaskError::WorkspaceMissing(workspace));
        }

        if let Err(e) = self
            .reporter
            .report(&TaskReport::started(&task.id, task.method.as_str()))
            .await
        {
            tracing::warn!(error = %e, "report STARTED failed");
        }

        let merged = match task.site() {
            Some(site) if task.method.is_config_task() => Some(
                self.merger
                    .merge_and_persist(&workspace, &user_site_fields(site))
                    .await?,
            ),
            _ => None,
        };

        let ctx = EngineContext {
            base_dir: workspace.clone(),
            runner: self.runner.clone(),
            package_manager: PackageManager::detect(&workspace).await,
            script: self.config.engine.script.clone(),
            debug: self.config.engine.debug,
        };
        let engine = EngineAdapter::init(
            &ctx,
            &self.selector,
            self.lifecycle.clone(),
            self.config.engine.install_dependencies,
        )
        .await?;

        let summary = match self.handle(&task, &engine, merged).await {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(exit_err) = engine.exit(Some(&e.to_string())).await {
                    tracing::warn!(error = %exit_err, "engine exit after failed task also failed");
                }
                return Err(e);
            }
        };
        engine.exit(None).await?;

        let outcome = DispatchOutcome {
            task_id: task.id,
            task_method: task.method,
            workspace,
            summary,
        };
        let data = serde_json::to_value(&outcome.summary).unwrap_or(serde_json::Value::Null);
        self.reporter
            .report(&TaskReport::finished(data))
            .await
            .map_err(|e| TaskError::Backend(format!("{e:#}")))?;
        tracing::info!("Task finished");
        Ok(outcome)
    }

    async fn handle(
        &self,
        task: &Task,
        engine: &EngineAdapter,
        merged: Option<MergeOutcome>,
    ) -> Result<TaskSummary, TaskError> {
        let method = task.method;
        tracing::info!("Starting task {method}");

        let batch = || {
            task.content()
                .ok_or_else(|| TaskError::InvalidPayload(format!("{method} requires post")))
        };
        let config = |merged: Option<MergeOutcome>| {
            merged.ok_or_else(|| TaskError::InvalidPayload(format!("{method} requires site")))
        };
        let content = ContentManager::new(engine, self.config.content.batch_failure);

        let summary = match method {
            TaskMethod::UpdateConfig => TaskSummary::Config {
                config: config(merged)?,
            },
            TaskMethod::GenerateDeploy => {
                let config = config(merged)?;
                tracing::info!("Generating static files");
                let items = engine.generate().await?;
                TaskSummary::Generate { config, items }
            }
            TaskMethod::CreatePost => {
                TaskSummary::Content(content.create(batch()?, Layout::Post, false).await?)
            }
            TaskMethod::UpdatePost => {
                TaskSummary::Content(content.create(batch()?, Layout::Post, true).await?)
            }
            TaskMethod::DeletePost => {
                TaskSummary::Content(content.delete(batch()?, Layout::Post).await?)
            }
            TaskMethod::CreateDraft => {
                TaskSummary::Content(content.create(batch()?, Layout::Draft, false).await?)
            }
            TaskMethod::UpdateDraft => {
                TaskSummary::Content(content.create(batch()?, Layout::Draft, true).await?)
            }
            TaskMethod::PublishDraft => {
                TaskSummary::Content(content.publish(batch()?, false).await?)
            }
            TaskMethod::MoveToDraft => TaskSummary::Content(content.move_to_draft(batch()?).await?),
        };

        tracing::info!("Task {method} finished");
        Ok(summary)
    }
}
