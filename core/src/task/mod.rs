//! Task model, backend collaborator seams and the one-task dispatcher.
mod dispatcher;
mod model;
mod source;

pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherArgs, TaskSummary};
pub use model::{SiteInfo, SiteTask, Task, TaskBody, TaskInfo, TaskMethod, ThemeInfo, UserInfo};
pub use source::{TaskReport, TaskReporter, TaskSource, TaskStatus};
