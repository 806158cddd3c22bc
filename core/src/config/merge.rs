//! Reconciles the site configuration layers and persists the result.
//!
//! Precedence, lowest first: engine defaults, platform defaults, the file
//! already in the workspace, then fields derived from the task.
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::TaskError;
use crate::task::SiteTask;

use super::site::{self, SiteConfig};

pub const DEFAULT_SITE_URL: &str = "https://example.com";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
pub const DEFAULT_AVATAR: &str =
    "https://ipfs.fleek.co/ipfs/bafybeiccss3figrixd5qhhv6i6zhbz5chmyls6ja5kscu6drg7fnjcnxgm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum MergeOutcome {
    /// No file existed; defaults plus task fields were written fresh.
    Created { path: PathBuf },
    /// An existing file was merged and rewritten in place.
    Updated { path: PathBuf },
    /// An existing file could not be read, parsed or written. Nothing changed.
    Skipped { path: PathBuf, reason: String },
}

impl MergeOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created { path } | Self::Updated { path } | Self::Skipped { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    engine_defaults: SiteConfig,
    platform_defaults: SiteConfig,
}

impl ConfigMerger {
    pub fn new(engine_defaults: SiteConfig, platform_defaults: SiteConfig) -> Self {
        Self {
            engine_defaults,
            platform_defaults,
        }
    }

    /// Shallow key-wise merge. An existing file keeps its own key order; keys it
    /// lacks are appended from the default layers.
    pub fn merge(&self, existing: Option<&SiteConfig>, user: &SiteConfig) -> SiteConfig {
        let mut out = match existing {
            Some(existing) => {
                let mut out = existing.clone();
                fill_missing(&mut out, &self.platform_defaults);
                fill_missing(&mut out, &self.engine_defaults);
                out
            }
            None => {
                let mut out = self.engine_defaults.clone();
                overlay(&mut out, &self.platform_defaults);
                out
            }
        };
        overlay(&mut out, user);
        out
    }

    /// Merge `user` into the workspace site config and write it back to the path
    /// it was read from.
    ///
    /// A missing file is created, and failing to write it is fatal. An existing
    /// file that can not be updated is logged and left untouched.
    #[tracing::instrument(name = "config.merge", skip(self, user), fields(workspace = %workspace.display()))]
    pub async fn merge_and_persist(
        &self,
        workspace: &Path,
        user: &SiteConfig,
    ) -> Result<MergeOutcome, TaskError> {
        let Some(path) = site::locate(workspace).await else {
            let path = site::default_path(workspace);
            tracing::warn!(
                "Can not find the site config in {}, will create it",
                workspace.display()
            );
            let merged = self.merge(None, user);
            let text = site::render(&merged).map_err(|e| TaskError::ConfigWrite {
                path: path.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;
            if let Err(e) = site::write_atomic_async(path.clone(), text).await {
                tracing::error!(error = %e, "Can not write site config file, path: {}", path.display());
                return Err(TaskError::ConfigWrite { path, source: e });
            }
            tracing::info!("Write {} successfully", path.display());
            return Ok(MergeOutcome::Created { path });
        };

        tracing::debug!("Found the site config in {}, will update it", workspace.display());
        match self.update_existing(&path, user).await {
            Ok(()) => {
                tracing::info!("Update {} successfully", path.display());
                Ok(MergeOutcome::Updated { path })
            }
            Err(e) => {
                tracing::error!(error = %e, "Can not update site config file, path: {}", path.display());
                Ok(MergeOutcome::Skipped {
                    path,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn update_existing(&self, path: &Path, user: &SiteConfig) -> anyhow::Result<()> {
        let raw = tokio::fs::read_to_string(path).await?;
        let existing = site::parse(&raw)?;
        let merged = self.merge(Some(&existing), user);
        let text = site::render(&merged)?;
        site::write_atomic_async(path.to_path_buf(), text).await?;
        Ok(())
    }
}

/// Insert keys from `layer` that `target` does not have.
fn fill_missing(target: &mut SiteConfig, layer: &SiteConfig) {
    for (k, v) in layer {
        if !target.contains_key(k) {
            target.insert(k.clone(), v.clone());
        }
    }
}

/// Every key from `layer` wins; existing keys keep their position.
fn overlay(target: &mut SiteConfig, layer: &SiteConfig) {
    for (k, v) in layer {
        target.insert(k.clone(), v.clone());
    }
}

/// Prefix `https://` unless the value already carries a scheme.
pub fn format_url(domain: &str) -> Option<String> {
    let domain = domain.trim();
    if domain.is_empty() {
        return None;
    }
    if domain.contains("://") {
        return Some(domain.to_string());
    }
    Some(format!("https://{domain}"))
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Fields derived from the task; these always win the merge.
pub fn user_site_fields(task: &SiteTask) -> SiteConfig {
    let SiteTask { site, user, theme } = task;

    let author = non_empty(site.author.as_deref())
        .or_else(|| non_empty(user.nickname.as_deref()))
        .or_else(|| non_empty(user.username.as_deref()))
        .unwrap_or_default();

    let url = site
        .domain
        .as_deref()
        .and_then(format_url)
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

    let keywords: Vec<Value> = site
        .keywords
        .iter()
        .flatten()
        .map(|k| Value::String(k.clone()))
        .collect();

    let mut conf = SiteConfig::new();
    conf.insert("title".into(), Value::String(site.title.clone()));
    conf.insert(
        "subtitle".into(),
        Value::String(site.subtitle.clone().unwrap_or_default()),
    );
    conf.insert(
        "description".into(),
        Value::String(site.description.clone().unwrap_or_default()),
    );
    conf.insert("author".into(), Value::String(author.to_string()));
    conf.insert(
        "avatar".into(),
        Value::String(non_empty(site.avatar.as_deref()).unwrap_or(DEFAULT_AVATAR).to_string()),
    );
    conf.insert("keywords".into(), Value::Array(keywords));
    conf.insert(
        "language".into(),
        Value::String(
            non_empty(site.language.as_deref())
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
        ),
    );
    conf.insert(
        "timezone".into(),
        Value::String(
            non_empty(site.timezone.as_deref())
                .unwrap_or(DEFAULT_TIMEZONE)
                .to_string(),
        ),
    );
    conf.insert("url".into(), Value::String(url));
    conf.insert(
        "theme".into(),
        Value::String(theme.theme_name.trim().to_lowercase()),
    );
    conf
}
