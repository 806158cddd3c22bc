//! Periodic HEALTH_CHECK reports while a task runs.
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sysinfo::System;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use sitegen_core::api::{TaskReport, TaskReporter};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    pub cpu_count: usize,
    /// Percent, averaged over all cores since the previous sample.
    pub cpu_usage: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_usage: f32,
}

/// Keeps one `System` so CPU usage is measured between consecutive samples.
pub struct HealthSampler {
    sys: System,
}

impl HealthSampler {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();
        Self { sys }
    }

    pub fn sample(&mut self) -> HealthSample {
        self.sys.refresh_cpu();
        self.sys.refresh_memory();

        let cpu_count = self.sys.cpus().len().max(1);
        let cpu_usage =
            self.sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / cpu_count as f32;
        let total = self.sys.total_memory();
        let used = self.sys.used_memory();
        HealthSample {
            cpu_count,
            cpu_usage,
            memory_used_mb: used / (1024 * 1024),
            memory_total_mb: total / (1024 * 1024),
            memory_usage: used as f32 / total.max(1) as f32 * 100.0,
        }
    }
}

impl Default for HealthSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Report a health sample every `interval` until the handle is aborted.
/// A zero interval disables the pings.
pub fn spawn_health_pings(
    reporter: Arc<dyn TaskReporter>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut sampler = HealthSampler::new();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; CPU usage needs a full interval.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let sample = sampler.sample();
            tracing::debug!(
                target: "sitegen.health",
                cpu = sample.cpu_usage,
                memory = sample.memory_usage,
                "Health check"
            );
            let data = serde_json::to_value(&sample).unwrap_or(serde_json::Value::Null);
            if let Err(e) = reporter.report(&TaskReport::health(data)).await {
                tracing::warn!(target: "sitegen.health", error = %e, "health report failed");
            }
        }
    }))
}
