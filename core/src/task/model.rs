use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::content::{ContentBatch, ContentEntry};
use crate::error::TaskError;
use crate::util::null_as_default;

/// Closed set of task kinds this worker accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskMethod {
    #[serde(rename = "HEXO_UPDATE_CONFIG")]
    UpdateConfig,
    #[serde(rename = "HEXO_GENERATE_DEPLOY")]
    GenerateDeploy,
    #[serde(rename = "HEXO_CREATE_POST")]
    CreatePost,
    #[serde(rename = "HEXO_UPDATE_POST")]
    UpdatePost,
    #[serde(rename = "HEXO_DELETE_POST")]
    DeletePost,
    #[serde(rename = "HEXO_CREATE_DRAFT")]
    CreateDraft,
    #[serde(rename = "HEXO_UPDATE_DRAFT")]
    UpdateDraft,
    #[serde(rename = "HEXO_PUBLISH_DRAFT")]
    PublishDraft,
    #[serde(rename = "HEXO_MOVE_TO_DRAFT")]
    MoveToDraft,
}

impl TaskMethod {
    pub const ALL: [TaskMethod; 9] = [
        Self::UpdateConfig,
        Self::GenerateDeploy,
        Self::CreatePost,
        Self::UpdatePost,
        Self::DeletePost,
        Self::CreateDraft,
        Self::UpdateDraft,
        Self::PublishDraft,
        Self::MoveToDraft,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateConfig => "HEXO_UPDATE_CONFIG",
            Self::GenerateDeploy => "HEXO_GENERATE_DEPLOY",
            Self::CreatePost => "HEXO_CREATE_POST",
            Self::UpdatePost => "HEXO_UPDATE_POST",
            Self::DeletePost => "HEXO_DELETE_POST",
            Self::CreateDraft => "HEXO_CREATE_DRAFT",
            Self::UpdateDraft => "HEXO_UPDATE_DRAFT",
            Self::PublishDraft => "HEXO_PUBLISH_DRAFT",
            Self::MoveToDraft => "HEXO_MOVE_TO_DRAFT",
        }
    }

    /// Tasks carrying site metadata; these merge the site config before init.
    pub fn is_config_task(self) -> bool {
        matches!(self, Self::UpdateConfig | Self::GenerateDeploy)
    }
}

impl FromStr for TaskMethod {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| TaskError::UnsupportedTask(s.to_string()))
    }
}

impl std::fmt::Display for TaskMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    #[serde(deserialize_with = "de_task_id")]
    pub task_id: String,
    pub task_method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_workspace: String,
}

fn de_task_id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(i64),
        Str(String),
    }

    Ok(match Id::deserialize(d)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub theme_name: String,
}

/// Site metadata carried by config-bearing tasks.
#[derive(Debug, Clone, Default)]
pub struct SiteTask {
    pub site: SiteInfo,
    pub user: UserInfo,
    pub theme: ThemeInfo,
}

#[derive(Debug, Clone)]
pub enum TaskBody {
    Site(SiteTask),
    Content(ContentBatch),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    task: TaskInfo,
}

#[derive(Debug, Deserialize)]
struct StorageInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    reponame: String,
}

#[derive(Debug, Deserialize)]
struct GitInfo {
    storage: StorageInfo,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    git: Option<GitInfo>,
    #[serde(default)]
    site: Option<SiteInfo>,
    #[serde(default)]
    user: Option<UserInfo>,
    #[serde(default)]
    theme: Option<ThemeInfo>,
    #[serde(default)]
    post: Option<serde_json::Value>,
}

/// A validated unit of work. Immutable once built.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub method: TaskMethod,
    pub workspace: String,
    pub repo_name: String,
    pub body: TaskBody,
}

impl Task {
    /// Decode and validate a backend payload. The method is checked against the
    /// allow-list before the method-specific fields are looked at.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TaskError> {
        let envelope: Envelope = serde_json::from_value(value.clone())
            .map_err(|e| TaskError::InvalidPayload(format!("task: {e}")))?;
        let method: TaskMethod = envelope.task.task_method.parse()?;

        let body: Body = serde_json::from_value(value)
            .map_err(|e| TaskError::InvalidPayload(e.to_string()))?;

        let repo_name = body
            .git
            .map(|g| g.storage.reponame)
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| TaskError::InvalidPayload("git.storage.reponame is missing".into()))?;

        let task_body = if method.is_config_task() {
            let site = body
                .site
                .ok_or_else(|| TaskError::InvalidPayload(format!("{method} requires site")))?;
            let theme = body
                .theme
                .ok_or_else(|| TaskError::InvalidPayload(format!("{method} requires theme")))?;
            TaskBody::Site(SiteTask {
                site,
                user: body.user.unwrap_or_default(),
                theme,
            })
        } else {
            let post = body
                .post
                .ok_or_else(|| TaskError::InvalidPayload(format!("{method} requires post")))?;
            TaskBody::Content(decode_post(post)?)
        };

        Ok(Self {
            id: envelope.task.task_id,
            method,
            workspace: envelope.task.task_workspace,
            repo_name,
            body: task_body,
        })
    }

    pub fn site(&self) -> Option<&SiteTask> {
        match &self.body {
            TaskBody::Site(s) => Some(s),
            TaskBody::Content(_) => None,
        }
    }

    pub fn content(&self) -> Option<&ContentBatch> {
        match &self.body {
            TaskBody::Content(c) => Some(c),
            TaskBody::Site(_) => None,
        }
    }
}

/// A list is a sequence, anything else a single entry. Decoded by shape so
/// a bad field reports its own error.
fn decode_post(post: serde_json::Value) -> Result<ContentBatch, TaskError> {
    let invalid = |e: serde_json::Error| TaskError::InvalidPayload(format!("post: {e}"));
    if post.is_array() {
        let entries: Vec<ContentEntry> = serde_json::from_value(post).map_err(invalid)?;
        Ok(ContentBatch::sequence(entries))
    } else {
        let entry: ContentEntry = serde_json::from_value(post).map_err(invalid)?;
        Ok(ContentBatch::single(entry))
    }
}
