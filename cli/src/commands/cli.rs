use std::path::PathBuf;

use clap::Parser;

use sitegen_core::api::WorkerConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "sitegen-worker", version, about = "Run one site generation task")]
pub struct Args {
    /// Worker config file. Defaults to ./worker.toml, then ~/.sitegen/worker.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Root under which task workspaces are provisioned.
    #[arg(long)]
    pub tmp_root: Option<String>,

    #[arg(long)]
    pub backend_url: Option<String>,

    /// Log filter, e.g. "debug" or "sitegen_core=trace".
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run the task in this JSON file instead of fetching one; reports only go to the log.
    #[arg(long)]
    pub payload: Option<PathBuf>,
}

impl Args {
    /// Flags win over every other config source.
    pub fn apply(&self, cfg: &mut WorkerConfig) {
        if let Some(v) = non_empty(&self.tmp_root) {
            cfg.workspace.tmp_root = Some(v);
        }
        if let Some(v) = non_empty(&self.backend_url) {
            cfg.backend.url = v;
        }
        if let Some(v) = non_empty(&self.log_level) {
            cfg.logging.level = v;
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
