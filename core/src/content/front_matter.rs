use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SiteConfig;

use super::model::{ContentItem, Layout};

const DELIMITER: &str = "---";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata header written above a content item's body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub updated: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl FrontMatter {
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            cover: item.cover.clone(),
            license: item.license.clone(),
            ..Self::reduced(item)
        }
    }

    /// Fields a publish rewrites; cover and license stay as the draft has them.
    pub fn reduced(item: &ContentItem) -> Self {
        Self {
            title: item.title.clone(),
            date: format_date(item.date()),
            updated: item.updated_at.map(format_date).unwrap_or_default(),
            tags: item.unique_tags(),
            categories: item.categories.clone(),
            excerpt: item.summary.clone().unwrap_or_default(),
            cover: None,
            license: None,
        }
    }

    pub fn to_map(&self) -> anyhow::Result<SiteConfig> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => anyhow::bail!("front matter serialized to {other}"),
        }
    }
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// What the engine needs to materialize one content file.
#[derive(Debug, Clone, PartialEq)]
pub struct PostData {
    pub layout: Layout,
    pub title: String,
    pub date: DateTime<Utc>,
    pub front_matter: FrontMatter,
}

impl PostData {
    pub fn create(item: &ContentItem, layout: Layout) -> Self {
        Self {
            layout,
            title: item.title.clone(),
            date: item.date(),
            front_matter: FrontMatter::from_item(item),
        }
    }

    pub fn publish(item: &ContentItem) -> Self {
        Self {
            layout: Layout::Post,
            title: item.title.clone(),
            date: item.date(),
            front_matter: FrontMatter::reduced(item),
        }
    }
}

/// Render `fields` as a `---` delimited YAML block ending in a newline.
pub fn render_block(fields: &SiteConfig) -> anyhow::Result<String> {
    let yaml = serde_yaml_bw::to_string(fields)?;
    let yaml = yaml.strip_prefix("---\n").unwrap_or(&yaml);
    let mut out = String::with_capacity(yaml.len() + 8);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    Ok(out)
}

/// Split a content file into its front matter fields and the body after the
/// closing delimiter. Files without a header yield empty fields.
pub fn split(text: &str) -> anyhow::Result<(SiteConfig, &str)> {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return Ok((SiteConfig::new(), text));
    };

    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let fields = if header.trim().is_empty() {
                SiteConfig::new()
            } else {
                serde_yaml_bw::from_str(header)?
            };
            return Ok((fields, body));
        }
        offset += line.len();
    }
    anyhow::bail!("front matter is not terminated")
}
