//! The site configuration file living at the workspace root.
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::SiteDefaultsConfig;

/// Key/value site configuration. Key order is preserved so a parse → render
/// round trip keeps unknown keys where they were.
///
/// Keys are strings at every level: a non-string YAML key such as `1:` or
/// `true:` is read as its string form and written back quoted.
pub type SiteConfig = serde_json::Map<String, serde_json::Value>;

/// Accepted file names, in lookup order. The first one is used when creating.
pub const SITE_CONFIG_FILES: [&str; 2] = ["_config.yml", "_config.yaml"];

const PLATFORM_DEFAULTS_YAML: &str = include_str!("../../assets/default_site_config.yml");

pub async fn locate(workspace: &Path) -> Option<PathBuf> {
    for name in SITE_CONFIG_FILES {
        let path = workspace.join(name);
        if is_file(&path).await {
            return Some(path);
        }
    }
    None
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

pub fn default_path(workspace: &Path) -> PathBuf {
    workspace.join(SITE_CONFIG_FILES[0])
}

pub fn parse(text: &str) -> anyhow::Result<SiteConfig> {
    if text.trim().is_empty() {
        return Ok(SiteConfig::new());
    }
    let conf: SiteConfig = serde_yaml_bw::from_str(text)?;
    Ok(conf)
}

pub fn render(conf: &SiteConfig) -> anyhow::Result<String> {
    let yaml = serde_yaml_bw::to_string(conf)?;
    Ok(yaml)
}

/// Replace `path` with `contents` through a temp file in the same directory.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub async fn write_atomic_async(path: PathBuf, contents: String) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &contents))
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?
}

/// Platform defaults: the configured file if any, otherwise the bundled copy.
/// Anything unreadable degrades to an empty layer.
pub fn platform_defaults(cfg: &SiteDefaultsConfig) -> SiteConfig {
    let loaded = match cfg
        .default_config_path
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(p) => {
            let path = PathBuf::from(shellexpand::tilde(p).as_ref());
            std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|s| parse(&s))
        }
        None => parse(PLATFORM_DEFAULTS_YAML),
    };

    match loaded {
        Ok(conf) if !conf.is_empty() => conf,
        Ok(_) => {
            tracing::warn!("Can not find the default site config, will ignore it");
            SiteConfig::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Can not load the default site config, will ignore it");
            SiteConfig::new()
        }
    }
}
