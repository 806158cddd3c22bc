//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `sitegen_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load, load_default, user_site_fields, validate_backend, BackendConfig, BatchFailureMode,
    ConfigMerger, EngineConfig, HealthConfig, LoggingConfig, MergeOutcome, RunnerConfig,
    SiteConfig, WorkerConfig,
};
pub use crate::content::{
    BatchReport, ContentBatch, ContentEntry, ContentItem, ContentManager, FrontMatter,
    ItemOutcome, Layout, PostData, RenameIntent,
};
pub use crate::engine::{
    engine_default_config, EngineAdapter, EngineContext, EngineLifecycle, EngineProvider,
    EngineSelector, GenerationEngine, SiteLayout, TracingLifecycle,
};
pub use crate::error::{CliError, ProcessError, ProcessErrorKind, TaskError};
pub use crate::runner::{CommandRunner, PackageManager, ProcessOutcome, ShellRunner};
pub use crate::task::{
    DispatchOutcome, Dispatcher, DispatcherArgs, Task, TaskMethod, TaskReport, TaskReporter,
    TaskSource, TaskStatus, TaskSummary,
};
