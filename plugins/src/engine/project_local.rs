use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use sitegen_core::api::{EngineContext, EngineProvider, GenerationEngine, SiteLayout};

use super::read_site_config;

/// Manifest of the engine package installed inside the workspace.
const LOCAL_MANIFEST: &str = "node_modules/hexo/package.json";

/// The engine the workspace installed itself, driven through its CLI script.
#[derive(Debug, Default)]
pub struct ProjectLocalProvider;

#[async_trait]
impl EngineProvider for ProjectLocalProvider {
    fn name(&self) -> &str {
        "project-local"
    }

    async fn load(&self, ctx: &EngineContext) -> anyhow::Result<Box<dyn GenerationEngine>> {
        let manifest = ctx.base_dir.join(LOCAL_MANIFEST);
        tracing::debug!("Try load engine module from: {}", manifest.display());
        let version = read_version(&manifest).await?;
        tracing::info!("Use local engine module {version}");
        Ok(Box::new(ProjectLocalEngine {
            ctx: ctx.clone(),
            version,
            site: None,
        }))
    }
}

async fn read_version(manifest: &Path) -> anyhow::Result<String> {
    let text = tokio::fs::read_to_string(manifest)
        .await
        .with_context(|| format!("no project-local engine at {}", manifest.display()))?;
    let pkg: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid manifest {}", manifest.display()))?;
    Ok(pkg
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string())
}

pub struct ProjectLocalEngine {
    ctx: EngineContext,
    version: String,
    site: Option<SiteLayout>,
}

impl ProjectLocalEngine {
    fn base_dir(&self) -> &PathBuf {
        &self.ctx.base_dir
    }
}

#[async_trait]
impl GenerationEngine for ProjectLocalEngine {
    fn name(&self) -> &str {
        "project-local"
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        let conf = read_site_config(self.base_dir()).await?;
        self.site = Some(SiteLayout::from_config(self.base_dir(), &conf));
        Ok(())
    }

    fn site(&self) -> Option<&SiteLayout> {
        self.site.as_ref()
    }

    /// `clean` then `generate` through the package manager, one after the other.
    async fn generate(&self) -> anyhow::Result<()> {
        self.require_site()?;
        for mut command in self.ctx.package_manager.generate_commands(&self.ctx.script) {
            if self.ctx.debug {
                command.push_str(" --debug");
            }
            let outcome = self.ctx.runner.exec(&command, self.base_dir()).await?;
            tracing::info!(
                target: "sitegen.engine",
                command = %outcome.command,
                duration_ms = outcome.duration_ms,
                "engine command finished"
            );
        }
        Ok(())
    }

    async fn exit(&self, error: Option<&str>) -> anyhow::Result<()> {
        tracing::debug!(target: "sitegen.engine", error = ?error, "project-local engine exit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use sitegen_core::api::{CommandRunner, PackageManager, ProcessError, ProcessOutcome};

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn exec(&self, command: &str, _cwd: &Path) -> Result<ProcessOutcome, ProcessError> {
            self.commands.lock().unwrap().push(command.to_string());
            if self.fail {
                return Err(ProcessError::non_zero(command, 2, None, String::new()));
            }
            Ok(ProcessOutcome {
                command: command.to_string(),
                exit_code: 0,
                duration_ms: 1,
                stdout_tail: String::new(),
                stderr_tail: String::new(),
            })
        }
    }

    fn ctx(base: &Path, runner: Arc<Recorder>, pm: PackageManager) -> EngineContext {
        EngineContext {
            base_dir: base.to_path_buf(),
            runner,
            package_manager: pm,
            script: "hexo".into(),
            debug: false,
        }
    }

    fn install_manifest(base: &Path) {
        let dir = base.join("node_modules/hexo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("package.json"), r#"{"name":"hexo","version":"7.3.0"}"#).unwrap();
    }

    #[tokio::test]
    async fn load_fails_without_local_install() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path(), Arc::new(Recorder::default()), PackageManager::Npm);

        let err = ProjectLocalProvider.load(&ctx).await.err().unwrap();
        assert!(err.to_string().contains("no project-local engine"));
    }

    #[tokio::test]
    async fn generate_runs_clean_then_generate() {
        let dir = tempfile::tempdir().unwrap();
        install_manifest(dir.path());
        let runner = Arc::new(Recorder::default());

        let mut engine = ProjectLocalProvider
            .load(&ctx(dir.path(), runner.clone(), PackageManager::Yarn))
            .await
            .unwrap();
        assert_eq!(engine.version(), "7.3.0");
        engine.init().await.unwrap();
        engine.generate().await.unwrap();

        assert_eq!(
            *runner.commands.lock().unwrap(),
            vec!["yarn run hexo clean", "yarn run hexo generate"]
        );
    }

    #[tokio::test]
    async fn failed_command_keeps_process_error() {
        let dir = tempfile::tempdir().unwrap();
        install_manifest(dir.path());
        let runner = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });

        let mut engine = ProjectLocalProvider
            .load(&ctx(dir.path(), runner.clone(), PackageManager::Npm))
            .await
            .unwrap();
        engine.init().await.unwrap();
        let err = engine.generate().await.unwrap_err();

        let process = err.downcast_ref::<ProcessError>().unwrap();
        assert_eq!(process.command, "npm run hexo clean");
        assert_eq!(runner.commands.lock().unwrap().len(), 1);
    }
}
