//! Process runner: runs shell commands inside a workspace, streams their output
//! line by line into the log and resolves on the exit code.
mod io_pump;
mod package_manager;
mod shell;
mod traits;
pub mod types;

pub use io_pump::{LineStream, LineTap};
pub use package_manager::PackageManager;
pub use shell::ShellRunner;
pub use traits::CommandRunner;
pub use types::ProcessOutcome;
