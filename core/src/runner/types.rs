#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProcessOutcome {
    pub command: String,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout_tail: String,
    pub stderr_tail: String,
}
