use std::path::Path;

use async_trait::async_trait;

use crate::error::ProcessError;

use super::types::ProcessOutcome;

/// Runs one command to completion. Implementations must only resolve `Ok`
/// for an exit code of `0`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    fn name(&self) -> &str;
    async fn exec(&self, command: &str, cwd: &Path) -> Result<ProcessOutcome, ProcessError>;
}
