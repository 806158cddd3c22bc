//! Wiring: build collaborators from the worker config, run one task, report
//! failures back.
use std::path::Path;
use std::time::Duration;

use sitegen_core::api::{
    CliError, DispatchOutcome, Dispatcher, DispatcherArgs, TaskReport, WorkerConfig,
};
use sitegen_plugins::factory::{build_backend, build_merger, build_runner, build_selector};
use sitegen_plugins::health::spawn_health_pings;

#[tracing::instrument(name = "cli.run", skip_all, fields(offline = payload.is_some()))]
pub async fn run(cfg: WorkerConfig, payload: Option<&Path>) -> Result<DispatchOutcome, CliError> {
    let backend =
        build_backend(&cfg, payload).map_err(|e| CliError::Config(format!("{e:#}")))?;
    let reporter = backend.reporter.clone();

    let health = spawn_health_pings(
        reporter.clone(),
        Duration::from_secs(cfg.health.interval_secs),
    );

    let dispatcher = Dispatcher::new(DispatcherArgs {
        runner: build_runner(&cfg),
        selector: build_selector(&cfg),
        merger: build_merger(&cfg),
        source: backend.source,
        reporter: backend.reporter,
        config: cfg,
    });
    let result = dispatcher.run().await;

    if let Some(handle) = health {
        handle.abort();
    }

    match result {
        Ok(outcome) => {
            tracing::info!(
                task_id = %outcome.task_id,
                method = %outcome.task_method,
                "Task {} done",
                outcome.task_id
            );
            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(error = %e, "Task failed");
            if e.should_report() {
                if let Err(report_err) = reporter.report(&TaskReport::errored(&e)).await {
                    tracing::warn!(error = %report_err, "report ERRORED failed");
                }
            }
            Err(e.into())
        }
    }
}
