use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use crate::config::BatchFailureMode;
use crate::engine::EngineAdapter;
use crate::error::TaskError;

use super::batch::{run_batch, BatchReport, ItemOutcome};
use super::front_matter::PostData;
use super::model::{ContentBatch, ContentEntry, ContentItem, Layout};

/// Content file operations for one task. Paths always come from the engine's
/// layout, resolved fresh for every item.
pub struct ContentManager<'a> {
    engine: &'a EngineAdapter,
    failure_mode: BatchFailureMode,
}

impl<'a> ContentManager<'a> {
    pub fn new(engine: &'a EngineAdapter, failure_mode: BatchFailureMode) -> Self {
        Self {
            engine,
            failure_mode,
        }
    }

    /// Create or update posts or drafts. With `replace` an existing file for
    /// the same title is overwritten instead of numbered.
    #[tracing::instrument(name = "content.create", skip_all, fields(layout = %layout, replace = replace, items = batch.len()))]
    pub async fn create(
        &self,
        batch: &ContentBatch,
        layout: Layout,
        replace: bool,
    ) -> Result<BatchReport, TaskError> {
        let report = run_batch("create", batch, self.failure_mode, move |_, entry| {
            self.create_one(entry, layout, replace)
        })
        .await;
        self.settle(report).await
    }

    /// Move drafts under the post layout.
    #[tracing::instrument(name = "content.publish", skip_all, fields(replace = replace, items = batch.len()))]
    pub async fn publish(&self, batch: &ContentBatch, replace: bool) -> Result<BatchReport, TaskError> {
        let report = run_batch("publish", batch, self.failure_mode, move |_, entry| {
            self.publish_one(entry, replace)
        })
        .await;
        self.settle(report).await
    }

    #[tracing::instrument(name = "content.move_to_draft", skip_all, fields(items = batch.len()))]
    pub async fn move_to_draft(&self, batch: &ContentBatch) -> Result<BatchReport, TaskError> {
        let report = run_batch("move_to_draft", batch, self.failure_mode, move |_, entry| {
            self.move_one(entry)
        })
        .await;
        self.settle(report).await
    }

    #[tracing::instrument(name = "content.delete", skip_all, fields(layout = %layout, items = batch.len()))]
    pub async fn delete(&self, batch: &ContentBatch, layout: Layout) -> Result<BatchReport, TaskError> {
        let report = run_batch("delete", batch, self.failure_mode, move |_, entry| {
            self.delete_one(entry, layout)
        })
        .await;
        self.settle(report).await
    }

    /// An escalated batch takes the shared engine down with it.
    async fn settle(&self, report: Result<BatchReport, TaskError>) -> Result<BatchReport, TaskError> {
        if let Err(e @ TaskError::BatchFailed { .. }) = &report {
            if let Err(exit_err) = self.engine.exit(Some(&e.to_string())).await {
                tracing::warn!(error = %exit_err, "engine exit after failed batch also failed");
            }
        }
        report
    }

    async fn create_one(
        &self,
        entry: &ContentEntry,
        layout: Layout,
        replace: bool,
    ) -> Result<ItemOutcome, TaskError> {
        let item = match &entry.rename {
            Some(rename) => {
                let new_title = rename.new_title.trim();
                if new_title.is_empty() {
                    return Err(TaskError::InvalidPayload(format!(
                        "rename of '{}' has an empty new title",
                        entry.item.title
                    )));
                }
                self.remove(&entry.item, layout).await?;
                entry.item.with_title(new_title)
            }
            None => entry.item.clone(),
        };

        if replace {
            tracing::info!("create replace mode on");
        }
        tracing::info!("Create {layout} file, title: {}", item.title);
        let path = self
            .engine
            .create(&PostData::create(&item, layout), replace)
            .await?;

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| TaskError::content(&path, e))?;
        file.write_all(format!("\n{}\n", item.source).as_bytes())
            .await
            .map_err(|e| TaskError::content(&path, e))?;
        file.flush().await.map_err(|e| TaskError::content(&path, e))?;
        tracing::info!("Successfully write source content to {}", path.display());

        Ok(ItemOutcome::Written { path })
    }

    async fn publish_one(&self, entry: &ContentEntry, replace: bool) -> Result<ItemOutcome, TaskError> {
        if replace {
            tracing::info!("publish replace mode on");
        }
        tracing::info!("Publish draft file, title: {}", entry.item.title);
        let path = self
            .engine
            .publish(&PostData::publish(&entry.item), replace)
            .await?;
        tracing::info!("Successfully publish draft file {}", path.display());
        Ok(ItemOutcome::Written { path })
    }

    async fn move_one(&self, entry: &ContentEntry) -> Result<ItemOutcome, TaskError> {
        let item = &entry.item;
        let site = self.engine.site()?;
        let from = self.engine.resolve_path(&item.title, Layout::Post, item.date())?;

        let to = match from.strip_prefix(site.post_dir()) {
            Ok(rel) => site.draft_dir().join(rel),
            Err(_) => return Ok(unresolved(item, from)),
        };
        if !tokio::fs::try_exists(&from)
            .await
            .map_err(|e| TaskError::content(&from, e))?
        {
            return Ok(unresolved(item, from));
        }

        if let Some(dir) = to.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| TaskError::content(dir, e))?;
        }
        tracing::info!(
            "Move title {} from path {} to {}",
            item.title,
            from.display(),
            to.display()
        );
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| TaskError::content(&from, e))?;
        Ok(ItemOutcome::Moved { from, to })
    }

    async fn delete_one(&self, entry: &ContentEntry, layout: Layout) -> Result<ItemOutcome, TaskError> {
        self.remove(&entry.item, layout).await
    }

    /// Remove the file for `item`. A file that is already gone is a skip.
    async fn remove(&self, item: &ContentItem, layout: Layout) -> Result<ItemOutcome, TaskError> {
        let path = self.engine.resolve_path(&item.title, layout, item.date())?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    "Remove {layout} file, title: {}, path: {}",
                    item.title,
                    path.display()
                );
                Ok(ItemOutcome::Removed { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(unresolved(item, path)),
            Err(e) => Err(TaskError::content(&path, e)),
        }
    }
}

fn unresolved(item: &ContentItem, path: PathBuf) -> ItemOutcome {
    let err = TaskError::ContentPathUnresolved {
        title: item.title.clone(),
        path,
    };
    tracing::warn!("{err}, nothing to do");
    ItemOutcome::Skipped {
        reason: err.to_string(),
    }
}
