use std::path::PathBuf;

use thiserror::Error;

use super::process::ProcessError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("task failed: {0}")]
    Task(#[from] TaskError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Failure kinds of a single task run.
///
/// Validation variants (`UnsupportedTask`, `InvalidPayload`, `WorkspaceMissing`)
/// are raised before anything in the workspace is touched.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("can not get task from backend: {0}")]
    TaskFetch(String),

    #[error("unsupported task method: {0}")]
    UnsupportedTask(String),

    #[error("invalid task payload: {0}")]
    InvalidPayload(String),

    #[error("work dir does not exist: {}", .0.display())]
    WorkspaceMissing(PathBuf),

    #[error("can not write site config {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("generation engine error: {0}")]
    GenerationEngine(String),

    #[error("content path unresolved for '{title}': {}", .path.display())]
    ContentPathUnresolved { title: String, path: PathBuf },

    #[error("content file error {}: {source}", .path.display())]
    Content {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} content items failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("backend error: {0}")]
    Backend(String),
}

impl TaskError {
    pub fn engine(err: impl std::fmt::Display) -> Self {
        Self::GenerationEngine(err.to_string())
    }

    pub fn content(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Content {
            path: path.into(),
            source,
        }
    }

    /// Whether the error should be reported back to the backend as ERRORED.
    pub fn should_report(&self) -> bool {
        !matches!(self, Self::TaskFetch(_))
    }
}
