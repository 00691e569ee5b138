use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::{header, Method, Url};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    mapping::{
        extract_items_and_cursor, first_non_empty_string, keys, map_bookmark, map_highlight,
        map_label, snippet_from, JsonObject,
    },
    types::{
        label_names, normalize_labels, ArchiveResult, ArchivedMode, Bookmark, BookmarkSummary,
        HighlightListResult, HighlightQuery, IncludeOptions, LabelListResult, SearchOptions,
        SearchResult, SetLabelsResult, SortMode,
    },
    BookmarkProvider,
};
use crate::context::RequestContext;

pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
pub const MAX_RETRIES: u32 = 3;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_LIST_LIMIT: usize = 200;
pub const MAX_LIST_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Http {
        status: u16,
        endpoint: String,
        request_id: Option<String>,
        message: String,
    },
    #[error("{0}")]
    InvalidInput(String),
    #[error("upstream request cancelled")]
    Cancelled,
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn is_fallback_status(&self) -> bool {
        matches!(self.status(), Some(404 | 405))
    }
}

/// One way of changing a bookmark's archive state; tried in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveRoute {
    /// `PATCH /bookmarks/{id}` with both `is_archived` and `archived`.
    Patch,
    /// `POST` / `DELETE` on `/bookmarks/{id}/archive`.
    Subresource,
    /// `PATCH /bookmarks/{id}` with `archived` only.
    PatchField,
}

impl ArchiveRoute {
    pub const DEFAULT_ORDER: [ArchiveRoute; 3] = [Self::Patch, Self::Subresource, Self::PatchField];
}

impl FromStr for ArchiveRoute {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "patch" => Ok(Self::Patch),
            "subresource" => Ok(Self::Subresource),
            "patch_field" => Ok(Self::PatchField),
            other => Err(format!("unknown archive route: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct ClientSettings {
    pub api_base: String,
    pub api_token: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub max_page_size: usize,
    pub retry_base_delay: Duration,
    pub archive_routes: Vec<ArchiveRoute>,
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_base", &self.api_base)
            .field("api_token", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .field("max_page_size", &self.max_page_size)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("archive_routes", &self.archive_routes)
            .finish()
    }
}

/// Path below the API base, kept as raw segments so ids are percent-encoded on join.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    fn new(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|segment| segment.to_string()).collect(),
        }
    }

    fn bookmark(id: &str, suffix: Option<&str>) -> Self {
        let mut endpoint = Self::new(&["bookmarks", id]);
        if let Some(suffix) = suffix {
            endpoint.segments.push(suffix.to_string());
        }
        endpoint
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

type Query = Vec<(&'static str, String)>;

#[derive(Debug)]
struct UpstreamResponse {
    status: u16,
    request_id: Option<String>,
    body: Vec<u8>,
    retries: u32,
}

struct Attempt {
    method: Method,
    endpoint: Endpoint,
    query: Query,
    body: Option<Value>,
}

impl Attempt {
    fn new(method: Method, endpoint: Endpoint) -> Self {
        Self {
            method,
            endpoint,
            query: Query::new(),
            body: None,
        }
    }

    fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

pub struct ReadeckClient {
    api_base: Url,
    token: String,
    user_agent: String,
    http: reqwest::Client,
    max_page_size: usize,
    retry_base_delay: Duration,
    archive_routes: Vec<ArchiveRoute>,
}

impl fmt::Debug for ReadeckClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadeckClient")
            .field("api_base", &self.api_base.as_str())
            .field("token", &"[REDACTED]")
            .field("max_page_size", &self.max_page_size)
            .finish_non_exhaustive()
    }
}

impl ReadeckClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let api_base = Url::parse(settings.api_base.trim_end_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(settings.api_base));
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let archive_routes = if settings.archive_routes.is_empty() {
            ArchiveRoute::DEFAULT_ORDER.to_vec()
        } else {
            settings.archive_routes
        };

        Ok(Self {
            api_base,
            token: settings.api_token,
            user_agent: settings.user_agent,
            http,
            max_page_size: settings.max_page_size.max(1),
            retry_base_delay: settings.retry_base_delay,
            archive_routes,
        })
    }

    fn url_for(&self, endpoint: &Endpoint, query: &Query) -> Result<Url, ClientError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments.iter());

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    /// Sends one logical request. Only GET is retried, on 429 and 5xx, with a
    /// doubling backoff that is abandoned as soon as the caller cancels.
    async fn send(
        &self,
        ctx: &RequestContext,
        method: Method,
        endpoint: &Endpoint,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse, ClientError> {
        let url = self.url_for(endpoint, query)?;
        let payload = body.map(serde_json::to_vec).transpose()?;
        let retriable = method == Method::GET;

        let mut retries = 0;
        loop {
            let mut response = self
                .send_once(ctx, &method, endpoint, url.clone(), payload.as_deref(), retries)
                .await?;

            if retriable && is_retriable_status(response.status) && retries < MAX_RETRIES {
                retries += 1;
                let backoff = retry_backoff(self.retry_base_delay, retries);
                warn!(
                    request_id = %ctx.request_id,
                    method = %method,
                    endpoint = %endpoint,
                    status = response.status,
                    retry = retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying upstream request"
                );

                tokio::select! {
                    _ = ctx.cancelled() => return Err(ClientError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
                continue;
            }

            if response.status >= 400 {
                return Err(ClientError::Http {
                    status: response.status,
                    endpoint: endpoint.to_string(),
                    request_id: response.request_id,
                    message: format!("upstream returned status {}", response.status),
                });
            }

            response.retries = retries;
            return Ok(response);
        }
    }

    async fn send_once(
        &self,
        ctx: &RequestContext,
        method: &Method,
        endpoint: &Endpoint,
        url: Url,
        payload: Option<&[u8]>,
        retries: u32,
    ) -> Result<UpstreamResponse, ClientError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.user_agent);
        if let Some(payload) = payload {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(payload.to_vec());
        }

        let started_at = Instant::now();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let request_id = response
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, request_id, body.to_vec()))
        };

        let outcome = tokio::select! {
            _ = ctx.cancelled() => return Err(ClientError::Cancelled),
            outcome = exchange => outcome,
        };
        let latency_ms = started_at.elapsed().as_millis() as u64;

        match outcome {
            Ok((status, request_id, body)) => {
                info!(
                    request_id = %ctx.request_id,
                    method = %method,
                    endpoint = %endpoint,
                    status,
                    latency_ms,
                    retries,
                    bytes = body.len(),
                    "upstream request"
                );
                Ok(UpstreamResponse {
                    status,
                    request_id,
                    body,
                    retries,
                })
            }
            Err(err) => {
                let err = err.without_url();
                warn!(
                    request_id = %ctx.request_id,
                    method = %method,
                    endpoint = %endpoint,
                    status = 0,
                    latency_ms,
                    retries,
                    error = %err,
                    "upstream request failed"
                );
                Err(ClientError::Transport(err.to_string()))
            }
        }
    }

    async fn request_object(
        &self,
        ctx: &RequestContext,
        method: Method,
        endpoint: &Endpoint,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<JsonObject, ClientError> {
        let allow_array = method == Method::GET;
        let response = self.send(ctx, method, endpoint, query, body).await?;
        decode_object(&response, endpoint, allow_array)
    }

    async fn get_object(
        &self,
        ctx: &RequestContext,
        endpoint: &Endpoint,
        query: &Query,
    ) -> Result<JsonObject, ClientError> {
        self.request_object(ctx, Method::GET, endpoint, query, None)
            .await
    }

    /// Tries each attempt in order, moving on only when the upstream answers 404 or 405.
    async fn probe(
        &self,
        ctx: &RequestContext,
        attempts: Vec<Attempt>,
    ) -> Result<JsonObject, ClientError> {
        let mut last_error = None;
        for attempt in attempts {
            match self
                .request_object(
                    ctx,
                    attempt.method.clone(),
                    &attempt.endpoint,
                    &attempt.query,
                    attempt.body.as_ref(),
                )
                .await
            {
                Err(err) if err.is_fallback_status() => {
                    debug!(
                        request_id = %ctx.request_id,
                        method = %attempt.method,
                        endpoint = %attempt.endpoint,
                        status = err.status().unwrap_or_default(),
                        "endpoint unavailable, trying fallback"
                    );
                    last_error = Some(err);
                }
                outcome => return outcome,
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::InvalidInput("no upstream endpoint candidates".to_string())))
    }

    fn archive_attempts(&self, id: &str, archived: bool) -> Vec<Attempt> {
        self.archive_routes
            .iter()
            .map(|route| match route {
                ArchiveRoute::Patch => Attempt::new(Method::PATCH, Endpoint::bookmark(id, None))
                    .with_body(json!({ "is_archived": archived, "archived": archived })),
                ArchiveRoute::Subresource if archived => {
                    Attempt::new(Method::POST, Endpoint::bookmark(id, Some("archive")))
                        .with_body(json!({ "archived": true }))
                }
                ArchiveRoute::Subresource => {
                    Attempt::new(Method::DELETE, Endpoint::bookmark(id, Some("archive")))
                }
                ArchiveRoute::PatchField => {
                    Attempt::new(Method::PATCH, Endpoint::bookmark(id, None))
                        .with_body(json!({ "archived": archived }))
                }
            })
            .collect()
    }

    async fn fetch_content(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<(Option<String>, Option<String>), ClientError> {
        for suffix in ["content", "article", "text"] {
            let endpoint = Endpoint::bookmark(id, Some(suffix));
            let obj = match self.get_object(ctx, &endpoint, &Query::new()).await {
                Ok(obj) => obj,
                Err(err) if err.is_fallback_status() => continue,
                Err(err) => return Err(err),
            };

            let text = first_non_empty_string(&obj, keys::FETCHED_TEXT);
            let html = first_non_empty_string(&obj, keys::CONTENT_HTML);
            if text.is_some() || html.is_some() {
                return Ok((text, html));
            }
        }

        Ok((None, None))
    }

    fn normalize_search_options(&self, mut options: SearchOptions) -> SearchOptions {
        let limit = options
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_SEARCH_LIMIT);
        options.limit = Some(limit.min(self.max_page_size));
        options.labels = normalize_labels(&options.labels);
        options
    }
}

#[async_trait]
impl BookmarkProvider for ReadeckClient {
    async fn search(
        &self,
        ctx: &RequestContext,
        options: SearchOptions,
    ) -> Result<SearchResult, ClientError> {
        let options = self.normalize_search_options(options);
        let query = build_search_query(&options);

        let obj = self
            .get_object(ctx, &Endpoint::new(&["bookmarks"]), &query)
            .await?;
        let (raw_items, next_cursor) = extract_items_and_cursor(&obj);

        let mut items = raw_items
            .iter()
            .map(|raw| (map_bookmark(raw), raw))
            .filter(|(bookmark, _)| matches_filters(bookmark, &options))
            .map(|(bookmark, raw)| BookmarkSummary {
                labels: bookmark.label_names(),
                snippet: snippet_from(raw),
                id: bookmark.id,
                title: bookmark.title,
                url: bookmark.url,
                is_archived: bookmark.is_archived,
                created_at: bookmark.created_at,
                updated_at: bookmark.updated_at,
                published_at: bookmark.published_at,
            })
            .collect::<Vec<_>>();

        sort_summaries(&mut items, options.sort);
        items.truncate(options.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));

        Ok(SearchResult { items, next_cursor })
    }

    async fn get_bookmark(
        &self,
        ctx: &RequestContext,
        id: &str,
        include: IncludeOptions,
    ) -> Result<Bookmark, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::InvalidInput("id is required".to_string()));
        }

        let obj = self
            .get_object(ctx, &Endpoint::bookmark(id, None), &Query::new())
            .await?;
        let mut bookmark = map_bookmark(&obj);
        if bookmark.id.is_empty() {
            bookmark.id = id.to_string();
        }

        if include.content {
            match self.fetch_content(ctx, id).await {
                Ok((text, html)) => {
                    bookmark.content_text = text.or(bookmark.content_text);
                    bookmark.content_html = html.or(bookmark.content_html);
                }
                Err(err) => {
                    warn!(request_id = %ctx.request_id, bookmark_id = %id, error = %err, "content fetch failed");
                }
            }
        }

        if include.highlights {
            let query = HighlightQuery {
                bookmark_id: Some(id.to_string()),
                limit: Some(DEFAULT_LIST_LIMIT),
                ..HighlightQuery::default()
            };
            match self.list_highlights(ctx, &query).await {
                Ok(page) => bookmark.highlights = page.highlights,
                Err(err) => {
                    warn!(request_id = %ctx.request_id, bookmark_id = %id, error = %err, "highlight fetch failed");
                }
            }
        } else {
            bookmark.highlights.clear();
        }

        if !include.labels {
            bookmark.labels.clear();
        }

        Ok(bookmark)
    }

    async fn set_archived(
        &self,
        ctx: &RequestContext,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveResult, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::InvalidInput("id is required".to_string()));
        }

        match self.probe(ctx, self.archive_attempts(id, archived)).await {
            Ok(_) => {}
            Err(err) if matches!(err.status(), Some(409 | 422)) => {
                debug!(
                    request_id = %ctx.request_id,
                    bookmark_id = %id,
                    archived,
                    "archive state already applied"
                );
            }
            Err(err) => return Err(err),
        }

        let include = IncludeOptions {
            content: false,
            highlights: false,
            labels: true,
        };
        let bookmark = self.get_bookmark(ctx, id, include).await?;

        Ok(ArchiveResult {
            id: bookmark.id,
            is_archived: bookmark.is_archived,
            updated_at: bookmark.updated_at,
        })
    }

    async fn list_labels(
        &self,
        ctx: &RequestContext,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<LabelListResult, ClientError> {
        let query = page_query(limit, 0, cursor);
        let obj = self
            .probe(
                ctx,
                vec![
                    Attempt::new(Method::GET, Endpoint::new(&["labels"])).with_query(query.clone()),
                    Attempt::new(Method::GET, Endpoint::new(&["bookmarks", "labels"]))
                        .with_query(query),
                ],
            )
            .await?;

        let (raw_items, next_cursor) = extract_items_and_cursor(&obj);
        let labels = raw_items
            .iter()
            .map(map_label)
            .filter(|label| !label.name.trim().is_empty())
            .collect();

        Ok(LabelListResult {
            labels,
            next_cursor,
        })
    }

    async fn set_labels(
        &self,
        ctx: &RequestContext,
        id: &str,
        labels: &[String],
    ) -> Result<SetLabelsResult, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::InvalidInput("id is required".to_string()));
        }
        let normalized = normalize_labels(labels);
        if normalized.is_empty() {
            return Err(ClientError::InvalidInput("labels is required".to_string()));
        }

        let body = json!({ "labels": normalized });
        let obj = self
            .probe(
                ctx,
                vec![
                    Attempt::new(Method::PATCH, Endpoint::bookmark(id, None)).with_body(body.clone()),
                    Attempt::new(Method::PUT, Endpoint::bookmark(id, Some("labels"))).with_body(body),
                ],
            )
            .await?;

        let bookmark = map_bookmark(&obj);
        let labels = if bookmark.labels.is_empty() {
            normalized
        } else {
            label_names(&bookmark.labels)
        };
        let id = if bookmark.id.is_empty() {
            id.to_string()
        } else {
            bookmark.id
        };

        Ok(SetLabelsResult { id, labels })
    }

    async fn list_highlights(
        &self,
        ctx: &RequestContext,
        query: &HighlightQuery,
    ) -> Result<HighlightListResult, ClientError> {
        let scope = query
            .bookmark_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let params = page_query(query.limit, query.offset, None);

        let attempts = match scope {
            Some(id) => {
                let mut scoped = params.clone();
                scoped.push(("bookmark_id", id.to_string()));
                vec![
                    Attempt::new(Method::GET, Endpoint::bookmark(id, Some("highlights")))
                        .with_query(params.clone()),
                    Attempt::new(Method::GET, Endpoint::bookmark(id, Some("annotations")))
                        .with_query(params),
                    Attempt::new(Method::GET, Endpoint::new(&["bookmarks", "annotations"]))
                        .with_query(scoped.clone()),
                    Attempt::new(Method::GET, Endpoint::new(&["highlights"])).with_query(scoped),
                ]
            }
            None => vec![
                Attempt::new(Method::GET, Endpoint::new(&["bookmarks", "annotations"]))
                    .with_query(params.clone()),
                Attempt::new(Method::GET, Endpoint::new(&["highlights"])).with_query(params),
            ],
        };

        let obj = self.probe(ctx, attempts).await?;
        let (raw_items, next_cursor) = extract_items_and_cursor(&obj);

        let highlights = raw_items
            .iter()
            .map(map_highlight)
            .filter(|highlight| !highlight.id.is_empty())
            .filter_map(|mut highlight| match scope {
                Some(id) if highlight.bookmark_id.is_empty() => {
                    highlight.bookmark_id = id.to_string();
                    Some(highlight)
                }
                Some(id) if highlight.bookmark_id != id => None,
                _ => Some(highlight),
            })
            .collect();

        Ok(HighlightListResult {
            highlights,
            next_cursor,
        })
    }
}

fn decode_object(
    response: &UpstreamResponse,
    endpoint: &Endpoint,
    allow_array: bool,
) -> Result<JsonObject, ClientError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(Value::Array(items)) if allow_array => {
            Ok(Map::from_iter([("items".to_string(), Value::Array(items))]))
        }
        _ => Err(ClientError::Http {
            status: response.status,
            endpoint: endpoint.to_string(),
            request_id: response.request_id.clone(),
            message: "decode response: unsupported JSON shape".to_string(),
        }),
    }
}

fn is_retriable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// `retry` is 1-based: the first retry waits `base`, then doubles.
pub fn retry_backoff(base: Duration, retry: u32) -> Duration {
    base * 2u32.saturating_pow(retry.saturating_sub(1))
}

fn page_query(limit: Option<usize>, offset: usize, cursor: Option<&str>) -> Query {
    let limit = limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .min(MAX_LIST_LIMIT);

    let mut query: Query = vec![("limit", limit.to_string())];
    if offset > 0 {
        query.push(("offset", offset.to_string()));
    }
    if let Some(cursor) = cursor.map(str::trim).filter(|cursor| !cursor.is_empty()) {
        query.push(("cursor", cursor.to_string()));
    }
    query
}

fn build_search_query(options: &SearchOptions) -> Query {
    let mut query = Query::new();

    let search = [options.query.as_deref(), options.text.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !search.is_empty() {
        query.push(("q", search));
    }
    if let Some(title) = options.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query.push(("title", title.to_string()));
    }
    if !options.labels.is_empty() {
        query.push(("labels", options.labels.join(",")));
    }
    if let Some(favorite) = options.favorites {
        query.push(("favorite", favorite.to_string()));
    }
    query.push(("sort", options.sort.as_str().to_string()));
    if let Some(limit) = options.limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(cursor) = options.cursor.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        query.push(("cursor", cursor.to_string()));
    }
    query
}

fn matches_filters(bookmark: &Bookmark, options: &SearchOptions) -> bool {
    match options.archived {
        ArchivedMode::Exclude if bookmark.is_archived => return false,
        ArchivedMode::Only if !bookmark.is_archived => return false,
        _ => {}
    }

    if options
        .favorites
        .is_some_and(|favorite| favorite != bookmark.is_favorite)
    {
        return false;
    }

    if let Some(title) = options.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        if !bookmark.title.to_lowercase().contains(&title.to_lowercase()) {
            return false;
        }
    }

    let have = bookmark
        .labels
        .iter()
        .map(|label| label.name.trim().to_lowercase())
        .collect::<std::collections::HashSet<_>>();
    options
        .labels
        .iter()
        .all(|wanted| have.contains(&wanted.to_lowercase()))
}

fn sort_summaries(items: &mut [BookmarkSummary], mode: SortMode) {
    match mode {
        SortMode::Relevance => {}
        SortMode::UpdatedDesc => items.sort_by(|left, right| right.updated_at.cmp(&left.updated_at)),
        SortMode::CreatedDesc => items.sort_by(|left, right| right.created_at.cmp(&left.created_at)),
        SortMode::PublishedDesc => {
            items.sort_by(|left, right| right.published_at.cmp(&left.published_at))
        }
    }
}
