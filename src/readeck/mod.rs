//! Readeck upstream integration
//!
//! `client` speaks HTTP to the Readeck API, `mapping` normalizes its loosely
//! shaped payloads into the structures in `types`.

pub mod client;
pub mod mapping;
pub mod types;

use async_trait::async_trait;

use crate::context::RequestContext;
use client::ClientError;
use types::{
    ArchiveResult, Bookmark, HighlightListResult, HighlightQuery, IncludeOptions, LabelListResult,
    SearchOptions, SearchResult, SetLabelsResult,
};

pub use client::ReadeckClient;

#[async_trait]
pub trait BookmarkProvider: Send + Sync {
    async fn search(
        &self,
        ctx: &RequestContext,
        options: SearchOptions,
    ) -> Result<SearchResult, ClientError>;

    async fn get_bookmark(
        &self,
        ctx: &RequestContext,
        id: &str,
        include: IncludeOptions,
    ) -> Result<Bookmark, ClientError>;

    async fn set_archived(
        &self,
        ctx: &RequestContext,
        id: &str,
        archived: bool,
    ) -> Result<ArchiveResult, ClientError>;

    async fn list_labels(
        &self,
        ctx: &RequestContext,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<LabelListResult, ClientError>;

    async fn set_labels(
        &self,
        ctx: &RequestContext,
        id: &str,
        labels: &[String],
    ) -> Result<SetLabelsResult, ClientError>;

    async fn list_highlights(
        &self,
        ctx: &RequestContext,
        query: &HighlightQuery,
    ) -> Result<HighlightListResult, ClientError>;
}
