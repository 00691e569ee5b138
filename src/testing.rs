//! In-memory `BookmarkProvider` used by pipeline, resource and router tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    context::RequestContext,
    readeck::{
        client::ClientError,
        types::{
            normalize_labels, ArchiveResult, Bookmark, BookmarkSummary, Highlight,
            HighlightListResult, HighlightQuery, IncludeOptions, Label, LabelListResult,
            SearchOptions, SearchResult, SetLabelsResult,
        },
        BookmarkProvider,
    },
};

#[derive(Default)]
pub struct MockProvider {
    pub bookmarks: Mutex<Vec<Bookmark>>,
    pub highlights: Vec<Highlight>,
    pub labels: Vec<Label>,
    pub highlight_calls: Mutex<Vec<HighlightQuery>>,
}

impl MockProvider {
    pub fn with_bookmarks(bookmarks: Vec<Bookmark>) -> Self {
        Self {
            bookmarks: Mutex::new(bookmarks),
            ..Self::default()
        }
    }

    pub fn with_highlights(mut self, highlights: Vec<Highlight>) -> Self {
        self.highlights = highlights;
        self
    }

    pub fn with_labels(mut self, labels: Vec<Label>) -> Self {
        self.labels = labels;
        self
    }

    pub fn highlight_calls(&self) -> Vec<HighlightQuery> {
        self.highlight_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn find(&self, id: &str) -> Result<Bookmark, ClientError> {
        self.bookmarks
            .lock()
            .ok()
            .and_then(|bookmarks| bookmarks.iter().find(|b| b.id == id).cloned())
            .ok_or_else(|| not_found(id))
    }
}

pub fn not_found(id: &str) -> ClientError {
    ClientError::Http {
        status: 404,
        endpoint: format!("/bookmarks/{id}"),
        request_id: Some("mock-request".to_string()),
        message: "upstream returned status 404".to_string(),
    }
}

pub fn bookmark(id: &str, title: &str) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        url: format!("https://example.com/{id}"),
        title: title.to_string(),
        ..Bookmark::default()
    }
}

pub fn highlight(id: &str, bookmark_id: &str, text: &str, created_at: &str) -> Highlight {
    Highlight {
        id: id.to_string(),
        bookmark_id: bookmark_id.to_string(),
        text: text.to_string(),
        created_at: Some(created_at.to_string()),
        ..Highlight::default()
    }
}

#[async_trait]
impl BookmarkProvider for MockProvider {
    async fn search(
        &self,
        _ctx: &RequestContext,
        options: SearchOptions,
    ) -> Result<SearchResult, ClientError> {
        let bookmarks = self.bookmarks.lock().map(|b| b.clone()).unwrap_or_default();
        let items = bookmarks
            .into_iter()
            .filter(|bookmark| {
                options
                    .query
                    .as_deref()
                    .map_or(true, |query| bookmark.title.contains(query))
            })
            .take(options.limit.unwrap_or(20))
            .map(|bookmark| BookmarkSummary {
                labels: bookmark.label_names(),
                id: bookmark.id,
                title: bookmark.title,
                url: bookmark.url,
                is_archived: bookmark.is_archived,
                ..BookmarkSummary::default()
            })
            .collect();

        Ok(SearchResult {
            items,
            next_cursor: None,
        })
    }

    async fn get_bookmark(
        &self,
        ctx: &RequestContext,
        id: &str,
        include: IncludeOptions,
    ) -> Result<Bookmark, ClientError> {
        let mut bookmark = self.find(id)?;
        if include.highlights {
            let query = HighlightQuery {
                bookmark_id: Some(id.to_string()),
                limit: Some(200),
                ..HighlightQuery::default()
            };
            bookmark.highlights = self.list_highlights(ctx, &query).await?.highlights;
        } else {
            bookmark.highlights.clear();
        }
        if !include.content {
            bookmark.content_text = None;
            bookmark.content_html = None;
        }
        if !include.labels {
            bookmark.labels.clear();
        }
        Ok(bookmark)
    }

    async fn set_archived(
        &self,
        _ctx: &RequestContext,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveResult, ClientError> {
        let mut bookmarks = self
            .bookmarks
            .lock()
            .map_err(|_| ClientError::Transport("mock poisoned".to_string()))?;
        let bookmark = bookmarks
            .iter_mut()
            .find(|bookmark| bookmark.id == id)
            .ok_or_else(|| not_found(id))?;
        bookmark.is_archived = archived;

        Ok(ArchiveResult {
            id: bookmark.id.clone(),
            is_archived: bookmark.is_archived,
            updated_at: bookmark.updated_at.clone(),
        })
    }

    async fn list_labels(
        &self,
        _ctx: &RequestContext,
        limit: Option<usize>,
        _cursor: Option<&str>,
    ) -> Result<LabelListResult, ClientError> {
        Ok(LabelListResult {
            labels: self
                .labels
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            next_cursor: None,
        })
    }

    async fn set_labels(
        &self,
        _ctx: &RequestContext,
        id: &str,
        labels: &[String],
    ) -> Result<SetLabelsResult, ClientError> {
        let normalized = normalize_labels(labels);
        if normalized.is_empty() {
            return Err(ClientError::InvalidInput("labels is required".to_string()));
        }
        self.find(id)?;
        Ok(SetLabelsResult {
            id: id.to_string(),
            labels: normalized,
        })
    }

    async fn list_highlights(
        &self,
        _ctx: &RequestContext,
        query: &HighlightQuery,
    ) -> Result<HighlightListResult, ClientError> {
        if let Ok(mut calls) = self.highlight_calls.lock() {
            calls.push(query.clone());
        }

        let scoped = self
            .highlights
            .iter()
            .filter(|highlight| {
                query
                    .bookmark_id
                    .as_deref()
                    .map_or(true, |id| highlight.bookmark_id == id)
            })
            .cloned()
            .collect::<Vec<_>>();

        let limit = query.limit.unwrap_or(200);
        let page = scoped
            .iter()
            .skip(query.offset)
            .take(limit)
            .cloned()
            .collect::<Vec<_>>();
        let consumed = query.offset + page.len();
        let next_cursor = (consumed < scoped.len()).then(|| consumed.to_string());

        Ok(HighlightListResult {
            highlights: page,
            next_cursor,
        })
    }
}
