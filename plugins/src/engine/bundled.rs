use std::path::{Path, PathBuf};

use async_trait::async_trait;

use sitegen_core::api::{EngineContext, EngineProvider, GenerationEngine, SiteLayout};
use sitegen_core::engine::files;

use super::read_site_config;

/// Always available. Publishes the source tree as-is: assets are copied
/// verbatim and every content file becomes `<public>/<name>/index.md`.
#[derive(Debug, Default)]
pub struct BundledProvider;

#[async_trait]
impl EngineProvider for BundledProvider {
    fn name(&self) -> &str {
        "bundled"
    }

    async fn load(&self, ctx: &EngineContext) -> anyhow::Result<Box<dyn GenerationEngine>> {
        Ok(Box::new(BundledEngine::new(ctx.base_dir.clone())))
    }
}

pub struct BundledEngine {
    base_dir: PathBuf,
    site: Option<SiteLayout>,
}

impl BundledEngine {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            site: None,
        }
    }
}

#[async_trait]
impl GenerationEngine for BundledEngine {
    fn name(&self) -> &str {
        "bundled"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        let conf = read_site_config(&self.base_dir).await?;
        self.site = Some(SiteLayout::from_config(&self.base_dir, &conf));
        Ok(())
    }

    fn site(&self) -> Option<&SiteLayout> {
        self.site.as_ref()
    }

    #[tracing::instrument(name = "engine.bundled.generate", skip_all)]
    async fn generate(&self) -> anyhow::Result<()> {
        let site = self.require_site()?;
        let public = &site.public_dir;

        match tokio::fs::remove_dir_all(public).await {
            Ok(()) => tracing::debug!("cleaned {}", public.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(anyhow::anyhow!("clean {} failed: {e}", public.display())),
        }
        tokio::fs::create_dir_all(public).await?;

        let source = site.source_dir.clone();
        let assets = tokio::task::spawn_blocking(move || collect_assets(&source)).await??;
        for rel in &assets {
            copy_into(&site.source_dir.join(rel), &public.join(rel)).await?;
        }

        let items = files::discover(site).await?;
        for path in &items {
            let Some(stem) = path.file_stem() else {
                continue;
            };
            copy_into(path, &public.join(stem).join("index.md")).await?;
        }

        tracing::info!(
            target: "sitegen.engine",
            assets = assets.len(),
            items = items.len(),
            "generated {}",
            public.display()
        );
        Ok(())
    }

    async fn exit(&self, error: Option<&str>) -> anyhow::Result<()> {
        tracing::debug!(target: "sitegen.engine", error = ?error, "bundled engine exit");
        Ok(())
    }
}

/// Files under `source` relative to it, skipping anything inside an
/// underscore-prefixed entry (`_posts`, `_drafts`, partials).
fn collect_assets(source: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&source.to_string_lossy()));
    let mut out = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => {
                let Ok(rel) = path.strip_prefix(source) else {
                    continue;
                };
                let hidden = rel
                    .components()
                    .any(|c| c.as_os_str().to_string_lossy().starts_with('_'));
                if !hidden {
                    out.push(rel.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Glob error: {}", e),
        }
    }
    out.sort();
    Ok(out)
}

async fn copy_into(from: &Path, to: &Path) -> anyhow::Result<()> {
    if let Some(dir) = to.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| anyhow::anyhow!("copy {} failed: {e}", from.display()))?;
    Ok(())
}
