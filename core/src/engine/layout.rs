//! Where content files live inside a workspace and how titles become paths.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde_json::Value;
use tokio::fs::{File, OpenOptions};

use crate::config::SiteConfig;
use crate::content::Layout;

pub const POSTS_DIR: &str = "_posts";
pub const DRAFTS_DIR: &str = "_drafts";
const DRAFT_NAME: &str = ":title.md";

/// Directory layout and naming rules read from the site configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub public_dir: PathBuf,
    pub new_post_name: String,
    pub filename_case: u8,
    pub render_drafts: bool,
}

fn str_or<'a>(conf: &'a SiteConfig, key: &str, default: &'a str) -> &'a str {
    conf.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

impl SiteLayout {
    pub fn from_config(base_dir: &Path, conf: &SiteConfig) -> Self {
        let filename_case = conf
            .get("filename_case")
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .unwrap_or(0);
        Self {
            base_dir: base_dir.to_path_buf(),
            source_dir: base_dir.join(str_or(conf, "source_dir", "source")),
            public_dir: base_dir.join(str_or(conf, "public_dir", "public")),
            new_post_name: str_or(conf, "new_post_name", ":title.md").to_string(),
            filename_case,
            render_drafts: conf
                .get("render_drafts")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    pub fn post_dir(&self) -> PathBuf {
        self.source_dir.join(POSTS_DIR)
    }

    pub fn draft_dir(&self) -> PathBuf {
        self.source_dir.join(DRAFTS_DIR)
    }

    pub fn slug(&self, title: &str) -> String {
        slugize(title, self.filename_case)
    }

    /// Canonical path for `title` under `layout`, ignoring what is on disk.
    pub fn canonical_path(&self, title: &str, layout: Layout, date: DateTime<Utc>) -> PathBuf {
        let slug = self.slug(title);
        match layout {
            Layout::Post => self.post_dir().join(expand_name(&self.new_post_name, &slug, date)),
            Layout::Draft => self.draft_dir().join(expand_name(DRAFT_NAME, &slug, date)),
        }
    }

    /// Create the file a new item for `title` is written to and return it
    /// opened for writing. Without `replace`, an occupied canonical path is
    /// suffixed `-1`, `-2`, ... and each candidate is claimed with
    /// `create_new`, so concurrent callers never share a path.
    pub async fn reserve(
        &self,
        title: &str,
        layout: Layout,
        date: DateTime<Utc>,
        replace: bool,
    ) -> std::io::Result<(PathBuf, File)> {
        let target = self.canonical_path(title, layout, date);
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        if replace {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&target)
                .await?;
            return Ok((target, file));
        }

        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = target
            .extension()
            .map(|s| format!(".{}", s.to_string_lossy()))
            .unwrap_or_default();
        let dir = target.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut candidate = target;
        let mut n = 0usize;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    n += 1;
                    candidate = dir.join(format!("{stem}-{n}{ext}"));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[\s\x00-\x1f\x7f~`!@#$%^&*()\-_+=\[\]{}|\\;:"'<>,.?/]+"#)
            .expect("SLUG_SEPARATORS is valid")
    })
}

/// Collapse punctuation and whitespace into `-`. `case` 1 lowers, 2 uppers.
pub fn slugize(title: &str, case: u8) -> String {
    let slug = separators().replace_all(title.trim(), "-");
    let slug = slug.trim_matches('-');
    match case {
        1 => slug.to_lowercase(),
        2 => slug.to_uppercase(),
        _ => slug.to_string(),
    }
}

fn expand_name(pattern: &str, slug: &str, date: DateTime<Utc>) -> String {
    pattern
        .replace(":i_month", &date.month().to_string())
        .replace(":i_day", &date.day().to_string())
        .replace(":year", &format!("{:04}", date.year()))
        .replace(":month", &format!("{:02}", date.month()))
        .replace(":day", &format!("{:02}", date.day()))
        .replace(":title", slug)
}
