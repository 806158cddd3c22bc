#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use sitegen_core::api::{
    CommandRunner, ConfigMerger, Dispatcher, DispatcherArgs, EngineContext, EngineLifecycle,
    EngineProvider, EngineSelector, GenerationEngine, ProcessError, ProcessOutcome, SiteConfig,
    SiteLayout, TaskReport, TaskReporter, TaskSource, WorkerConfig,
};
use sitegen_core::config::site;

/// Ordered log shared by every fake so tests can assert on sequencing.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.all().iter().position(|e| e.starts_with(prefix))
    }
}

pub struct StaticSource(Mutex<Option<Value>>);

impl StaticSource {
    pub fn new(payload: Option<Value>) -> Self {
        Self(Mutex::new(payload))
    }
}

#[async_trait]
impl TaskSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> anyhow::Result<Option<Value>> {
        Ok(self.0.lock().unwrap().take())
    }
}

pub struct RecordingReporter {
    events: Events,
    pub reports: Mutex<Vec<TaskReport>>,
}

#[async_trait]
impl TaskReporter for RecordingReporter {
    async fn report(&self, report: &TaskReport) -> anyhow::Result<()> {
        self.events.push(format!("report:{}", report.status));
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

pub struct RecordingRunner {
    events: Events,
    fail_on: Option<String>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    fn name(&self) -> &str {
        "recording"
    }

    async fn exec(&self, command: &str, _cwd: &Path) -> Result<ProcessOutcome, ProcessError> {
        self.events.push(format!("exec:{command}"));
        if self.fail_on.as_deref() == Some(command) {
            return Err(ProcessError::non_zero(command, 1, None, "failed".into()));
        }
        Ok(ProcessOutcome {
            command: command.to_string(),
            exit_code: 0,
            duration_ms: 0,
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        })
    }
}

/// Engine over the workspace directory. Records whether the site config
/// already existed when it was initialized.
pub struct DirEngine {
    events: Events,
    base: PathBuf,
    site: Option<SiteLayout>,
    fail_generate: bool,
}

#[async_trait]
impl GenerationEngine for DirEngine {
    fn name(&self) -> &str {
        "dir"
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        let conf = match site::locate(&self.base).await {
            Some(path) => {
                self.events.push("init:with-config");
                site::parse(&std::fs::read_to_string(path)?)?
            }
            None => {
                self.events.push("init:no-config");
                SiteConfig::new()
            }
        };
        self.site = Some(SiteLayout::from_config(&self.base, &conf));
        Ok(())
    }

    fn site(&self) -> Option<&SiteLayout> {
        self.site.as_ref()
    }

    async fn generate(&self) -> anyhow::Result<()> {
        self.events.push("generate");
        if self.fail_generate {
            anyhow::bail!("render failed");
        }
        Ok(())
    }

    async fn exit(&self, error: Option<&str>) -> anyhow::Result<()> {
        self.events.push(format!("exit:{}", error.unwrap_or("-")));
        Ok(())
    }
}

pub struct DirProvider {
    events: Events,
    fail_generate: bool,
}

#[async_trait]
impl EngineProvider for DirProvider {
    fn name(&self) -> &str {
        "dir"
    }

    async fn load(&self, ctx: &EngineContext) -> anyhow::Result<Box<dyn GenerationEngine>> {
        Ok(Box::new(DirEngine {
            events: self.events.clone(),
            base: ctx.base_dir.clone(),
            site: None,
            fail_generate: self.fail_generate,
        }))
    }
}

pub struct Lifecycle(pub Events);

impl EngineLifecycle for Lifecycle {
    fn on_ready(&self, engine: &str, _version: &str) {
        self.0.push(format!("ready:{engine}"));
    }

    fn on_generate_started(&self, item_count: usize) {
        self.0.push(format!("generate-started:{item_count}"));
    }
}

/// `tmp_root/<workspace>/<repo>` provisioned on disk.
pub struct Workspace {
    pub root: tempfile::TempDir,
    pub dir: PathBuf,
}

pub const TASK_WORKSPACE: &str = "ws-1";
pub const REPO: &str = "blog";

pub fn workspace() -> Workspace {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join(TASK_WORKSPACE).join(REPO);
    std::fs::create_dir_all(&dir).unwrap();
    Workspace { root, dir }
}

impl Workspace {
    pub fn site(&self) -> SiteLayout {
        SiteLayout::from_config(&self.dir, &SiteConfig::new())
    }

    /// Every file under the tmp root with its contents.
    pub fn snapshot(&self) -> Vec<(PathBuf, String)> {
        let mut out = Vec::new();
        let mut stack = vec![self.root.path().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let text = std::fs::read_to_string(&path).unwrap_or_default();
                    out.push((path, text));
                }
            }
        }
        out.sort();
        out
    }
}

pub fn payload(method: &str, post: Option<Value>) -> Value {
    let mut v = json!({
        "task": { "taskId": 7, "taskMethod": method, "taskWorkspace": TASK_WORKSPACE },
        "git": { "storage": { "reponame": REPO } },
        "site": { "title": "My Blog", "domain": "blog.example.com", "language": "" },
        "user": { "username": "alice", "nickname": "Alice" },
        "theme": { "themeName": "Landscape" }
    });
    if let Some(post) = post {
        v["post"] = post;
    }
    v
}

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub reporter: Arc<RecordingReporter>,
    pub events: Events,
}

#[derive(Default)]
pub struct HarnessOptions {
    pub fail_generate: bool,
    pub fail_command: Option<String>,
    pub config: Option<WorkerConfig>,
}

pub fn harness(ws: &Workspace, payload: Option<Value>, opts: HarnessOptions) -> Harness {
    let events = Events::default();
    let reporter = Arc::new(RecordingReporter {
        events: events.clone(),
        reports: Mutex::new(Vec::new()),
    });

    let mut config = opts.config.unwrap_or_default();
    config.workspace.tmp_root = Some(ws.root.path().display().to_string());

    let dispatcher = Dispatcher::new(DispatcherArgs {
        config,
        source: Arc::new(StaticSource::new(payload)),
        reporter: reporter.clone(),
        runner: Arc::new(RecordingRunner {
            events: events.clone(),
            fail_on: opts.fail_command,
        }),
        selector: EngineSelector::new(vec![Box::new(DirProvider {
            events: events.clone(),
            fail_generate: opts.fail_generate,
        })]),
        merger: ConfigMerger::new(
            sitegen_core::api::engine_default_config(),
            site::parse("language: en\nper_page: 20\n").unwrap(),
        ),
    })
    .with_lifecycle(Arc::new(Lifecycle(events.clone())));

    Harness {
        dispatcher,
        reporter,
        events,
    }
}
