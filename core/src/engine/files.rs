//! File primitives shared by engine implementations: materializing a new
//! content file, publishing a draft and discovering content.
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::io::AsyncWriteExt;

use crate::content::front_matter::{self, PostData};
use crate::content::Layout;

use super::layout::SiteLayout;

async fn write_all(file: &mut tokio::fs::File, path: &Path, text: &str) -> anyhow::Result<()> {
    file.write_all(text.as_bytes())
        .await
        .with_context(|| format!("write {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the front matter block for `post` at its resolved path and return
/// that path. The body is left to the caller.
pub async fn create_post(
    site: &SiteLayout,
    post: &PostData,
    replace: bool,
) -> anyhow::Result<PathBuf> {
    let block = front_matter::render_block(&post.front_matter.to_map()?)?;
    let (path, mut file) = site
        .reserve(&post.title, post.layout, post.date, replace)
        .await
        .with_context(|| format!("create {} file for '{}'", post.layout, post.title))?;
    write_all(&mut file, &path, &block).await?;
    Ok(path)
}

/// Move the draft for `post` under the post layout, overlaying the given
/// front matter onto the draft's own and keeping its body.
pub async fn publish_draft(
    site: &SiteLayout,
    post: &PostData,
    replace: bool,
) -> anyhow::Result<PathBuf> {
    let draft = site.canonical_path(&post.title, Layout::Draft, post.date);
    let text = match tokio::fs::read_to_string(&draft).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("draft '{}' does not exist at {}", post.title, draft.display())
        }
        Err(e) => return Err(e).with_context(|| format!("read {}", draft.display())),
    };

    let (mut fields, body) = front_matter::split(&text)?;
    for (k, v) in post.front_matter.to_map()? {
        fields.insert(k, v);
    }

    let mut out = front_matter::render_block(&fields)?;
    out.push_str(body);
    let (target, mut file) = site
        .reserve(&post.title, Layout::Post, post.date, replace)
        .await
        .with_context(|| format!("create post file for '{}'", post.title))?;
    write_all(&mut file, &target, &out).await?;
    tokio::fs::remove_file(&draft)
        .await
        .with_context(|| format!("remove {}", draft.display()))?;
    Ok(target)
}

/// Markdown files under the post directory, plus drafts when the site renders
/// them. Sorted for stable ordering.
pub async fn discover(site: &SiteLayout) -> anyhow::Result<Vec<PathBuf>> {
    let mut roots = vec![site.post_dir()];
    if site.render_drafts {
        roots.push(site.draft_dir());
    }

    let mut found = Vec::new();
    while let Some(dir) = roots.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e).with_context(|| format!("read {}", dir.display())),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                roots.push(path);
            } else if path.extension().is_some_and(|ext| ext == "md") {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}
