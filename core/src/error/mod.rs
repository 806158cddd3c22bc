#[allow(clippy::module_inception)]
pub mod error;
pub mod process;

pub use error::{CliError, TaskError};
pub use process::{ProcessError, ProcessErrorKind};
