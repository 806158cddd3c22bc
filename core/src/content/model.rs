use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::null_as_default;

/// Where a content item lives: published post or unpublished draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Post,
    Draft,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Draft => "draft",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub cover: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            summary: None,
            cover: None,
            license: None,
            tags: Vec::new(),
            categories: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// created → updated → now
    pub fn date(&self) -> DateTime<Utc> {
        self.created_at.or(self.updated_at).unwrap_or_else(Utc::now)
    }

    /// Tags without duplicates, first occurrence wins.
    pub fn unique_tags(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tags
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }

    pub fn with_title(&self, title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..self.clone()
        }
    }
}

/// Request to move an existing item to a new title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameIntent {
    pub new_title: String,
}

/// One unit of content work: the item plus an optional rename kept apart from
/// the item's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(flatten)]
    pub item: ContentItem,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameIntent>,
}

impl ContentEntry {
    pub fn new(item: ContentItem) -> Self {
        Self { item, rename: None }
    }
}

/// Items carried by one task. `is_sequence` is false when the backend sent a
/// single object rather than a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBatch {
    pub entries: Vec<ContentEntry>,
    pub is_sequence: bool,
}

impl ContentBatch {
    pub fn single(entry: ContentEntry) -> Self {
        Self {
            entries: vec![entry],
            is_sequence: false,
        }
    }

    pub fn sequence(entries: Vec<ContentEntry>) -> Self {
        Self {
            entries,
            is_sequence: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
