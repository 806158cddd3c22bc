use std::future::Future;
use std::path::PathBuf;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

use crate::config::BatchFailureMode;
use crate::error::TaskError;

use super::model::{ContentBatch, ContentEntry};

/// What happened to one content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ItemOutcome {
    Written { path: PathBuf },
    Removed { path: PathBuf },
    Moved { from: PathBuf, to: PathBuf },
    Skipped { reason: String },
    Failed { error: String },
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub index: usize,
    pub title: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Per-item results of one content operation, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub operation: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn new(operation: &str, mut items: Vec<ItemReport>) -> Self {
        items.sort_by_key(|r| r.index);
        let failed = items.iter().filter(|r| r.outcome.is_failure()).count();
        Self {
            operation: operation.to_string(),
            total: items.len(),
            succeeded: items.len() - failed,
            failed,
            items,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|r| r.outcome.is_failure())
    }
}

/// Run `op` for every entry.
///
/// A single item (not sent as a list) propagates its error. A sequence runs
/// all items concurrently and waits for every one to settle; failures are
/// collected into the report. With [`BatchFailureMode::Escalate`] any failure
/// turns into [`TaskError::BatchFailed`] once all items settled.
pub async fn run_batch<'a, F, Fut>(
    operation: &str,
    batch: &'a ContentBatch,
    mode: BatchFailureMode,
    op: F,
) -> Result<BatchReport, TaskError>
where
    F: Fn(usize, &'a ContentEntry) -> Fut,
    Fut: Future<Output = Result<ItemOutcome, TaskError>>,
{
    if !batch.is_sequence {
        let entry = batch
            .entries
            .first()
            .ok_or_else(|| TaskError::InvalidPayload("content item is missing".into()))?;
        tracing::info!(operation, "{operation} single content item");
        let outcome = op(0, entry).await?;
        return Ok(BatchReport::new(
            operation,
            vec![ItemReport {
                index: 0,
                title: entry.item.title.clone(),
                outcome,
            }],
        ));
    }

    let total = batch.len();
    let mut pending = FuturesUnordered::new();
    for (index, entry) in batch.entries.iter().enumerate() {
        tracing::info!(operation, "{operation} content item queue {}/{}", index + 1, total);
        let fut = op(index, entry);
        pending.push(async move { (index, entry, fut.await) });
    }

    let mut items = Vec::with_capacity(total);
    while let Some((index, entry, result)) = pending.next().await {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    operation,
                    index,
                    title = %entry.item.title,
                    error = %e,
                    "content item failed"
                );
                ItemOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        items.push(ItemReport {
            index,
            title: entry.item.title.clone(),
            outcome,
        });
    }

    let report = BatchReport::new(operation, items);
    if report.failed > 0 {
        tracing::warn!(
            operation,
            failed = report.failed,
            total = report.total,
            "{} of {} content items failed",
            report.failed,
            report.total
        );
        if mode == BatchFailureMode::Escalate {
            return Err(TaskError::BatchFailed {
                failed: report.failed,
                total: report.total,
            });
        }
    }
    Ok(report)
}
