//! Normalized Readeck schema shared by the client, tools and renderers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Label {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Highlight {
    pub id: String,
    pub bookmark_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
}

impl Bookmark {
    pub fn label_names(&self) -> Vec<String> {
        label_names(&self.labels)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BookmarkSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchivedMode {
    #[default]
    Exclude,
    Include,
    Only,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    Relevance,
    #[default]
    UpdatedDesc,
    CreatedDesc,
    PublishedDesc,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::UpdatedDesc => "updated_desc",
            Self::CreatedDesc => "created_desc",
            Self::PublishedDesc => "published_desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub labels: Vec<String>,
    pub archived: ArchivedMode,
    pub favorites: Option<bool>,
    pub sort: SortMode,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeOptions {
    pub content: bool,
    pub highlights: bool,
    pub labels: bool,
}

impl Default for IncludeOptions {
    fn default() -> Self {
        Self {
            content: false,
            highlights: true,
            labels: true,
        }
    }
}

/// One upstream highlight page request; `bookmark_id: None` asks for the global feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightQuery {
    pub bookmark_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SearchResult {
    pub items: Vec<BookmarkSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct LabelListResult {
    pub labels: Vec<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct HighlightListResult {
    pub highlights: Vec<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ArchiveResult {
    pub id: String,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SetLabelsResult {
    pub id: String,
    pub labels: Vec<String>,
}

pub fn label_names(labels: &[Label]) -> Vec<String> {
    labels
        .iter()
        .filter(|label| !label.name.trim().is_empty())
        .map(|label| label.name.clone())
        .collect()
}

/// Trims, drops blanks and de-duplicates case-insensitively, keeping the first spelling.
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.to_lowercase()))
        .map(str::to_string)
        .collect()
}
