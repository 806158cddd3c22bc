use serde::{Deserialize, Serialize};

/// Worker settings, built once at process start and passed explicitly to every
/// component that needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub site: SiteDefaultsConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_app_name() -> String {
    "sitegen-worker".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            backend: BackendConfig::default(),
            workspace: WorkspaceConfig::default(),
            site: SiteDefaultsConfig::default(),
            engine: EngineConfig::default(),
            content: ContentConfig::default(),
            runner: RunnerConfig::default(),
            health: HealthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the task backend, e.g. `https://api.example.com`.
    #[serde(default)]
    pub url: String,

    /// Route under `url` serving tasks for this worker kind.
    #[serde(default = "default_task_path")]
    pub task_path: String,

    #[serde(default)]
    pub secret: String,

    /// Worker identity sent with every request.
    #[serde(default)]
    pub hostname: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_task_path() -> String {
    "task/hexo".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            task_path: default_task_path(),
            secret: String::new(),
            hostname: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkspaceConfig {
    /// Root under which task workspaces are provisioned. OS temp dir if unset.
    #[serde(default)]
    pub tmp_root: Option<String>,
}

impl WorkspaceConfig {
    pub fn tmp_root(&self) -> std::path::PathBuf {
        match self
            .tmp_root
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(p) => std::path::PathBuf::from(shellexpand::tilde(p).as_ref()),
            None => std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteDefaultsConfig {
    /// Platform default site configuration file. The bundled copy is used if unset.
    #[serde(default)]
    pub default_config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Run the package manager install step before engine init.
    #[serde(default = "default_true")]
    pub install_dependencies: bool,

    /// Try the engine installed in the workspace before the bundled one.
    #[serde(default = "default_true")]
    pub prefer_local: bool,

    /// Script name the workspace `package.json` exposes for the engine CLI.
    #[serde(default = "default_engine_script")]
    pub script: String,

    #[serde(default)]
    pub debug: bool,
}

fn default_true() -> bool {
    true
}

fn default_engine_script() -> String {
    "hexo".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            install_dependencies: true,
            prefer_local: true,
            script: default_engine_script(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFailureMode {
    /// Every item settles on its own; failures are logged and summarized.
    #[default]
    Isolate,
    /// Any failed item tears down the shared engine and fails the task.
    Escalate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContentConfig {
    #[serde(default)]
    pub batch_failure: BatchFailureMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Bytes of stdout/stderr tail kept per command.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    #[serde(default = "default_line_channel_capacity")]
    pub line_channel_capacity: usize,
}

fn default_capture_bytes() -> usize {
    65_536
}

fn default_line_channel_capacity() -> usize {
    1024
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            capture_bytes: default_capture_bytes(),
            line_channel_capacity: default_line_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Seconds between HEALTH_CHECK reports; 0 disables them.
    #[serde(default = "default_health_interval")]
    pub interval_secs: u64,
}

fn default_health_interval() -> u64 {
    10
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_health_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "sitegen_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}
