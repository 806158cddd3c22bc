use std::path::{Path, PathBuf};

use super::types::WorkerConfig;

const CONFIG_FILE_NAME: &str = "worker.toml";

/// Get the default worker data directory: ~/.sitegen
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".sitegen"))
}

pub fn load_default() -> anyhow::Result<WorkerConfig> {
    // Priority 1: ./worker.toml (current directory)
    let local_config = PathBuf::from(CONFIG_FILE_NAME);

    // Priority 2: ~/.sitegen/worker.toml
    let home_config = get_data_dir().ok().map(|d| d.join(CONFIG_FILE_NAME));

    let path = if local_config.exists() {
        Some(local_config)
    } else {
        home_config.filter(|p| p.exists())
    };

    load(path.as_deref())
}

/// Load from `path` (or built-in defaults when `None`), then apply `.env` and
/// environment overrides.
pub fn load(path: Option<&Path>) -> anyhow::Result<WorkerConfig> {
    let mut cfg: WorkerConfig = match path {
        Some(p) => {
            let s = std::fs::read_to_string(p)
                .map_err(|e| anyhow::anyhow!("read {} failed: {e}", p.display()))?;
            toml::from_str::<WorkerConfig>(&s)?
        }
        None => WorkerConfig::default(),
    };

    // A missing .env file is fine; values already in the environment win.
    let _ = dotenvy::dotenv();

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment variable overrides (highest priority after CLI flags).
pub fn apply_env_overrides<F>(cfg: &mut WorkerConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("WORKER_APP_NAME") {
        cfg.app_name = v;
    }
    if let Some(v) = non_empty("WORKER_BACKEND_URL") {
        cfg.backend.url = v;
    }
    if let Some(v) = non_empty("WORKER_SECRET") {
        cfg.backend.secret = v;
    }
    if let Some(v) = non_empty("HOSTNAME") {
        cfg.backend.hostname = v;
    }
    if let Some(v) = non_empty("WORKER_TMP_ROOT") {
        cfg.workspace.tmp_root = Some(v);
    }
    if let Some(v) = non_empty("WORKER_DEFAULT_SITE_CONFIG") {
        cfg.site.default_config_path = Some(v);
    }
}

/// Values the backend client can not run without.
pub fn validate_backend(cfg: &WorkerConfig) -> Result<(), String> {
    if cfg.backend.secret.trim().is_empty() {
        return Err("Can not find WORKER_SECRET env".to_string());
    }
    if cfg.backend.hostname.trim().is_empty() {
        return Err("Can not find HOSTNAME env".to_string());
    }
    if cfg.backend.url.trim().is_empty() {
        return Err("Can not find WORKER_BACKEND_URL env".to_string());
    }
    Ok(())
}
