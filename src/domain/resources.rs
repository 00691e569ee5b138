//! Model Context Protocol bookmark resources
//!
//! Exposes every bookmark as a family of read-only documents under
//! `readeck://bookmark/{id}` URIs.

use rust_mcp_sdk::schema::{ReadResourceContent, ReadResourceResult, Resource, TextResourceContents};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::{render, utils::pretty_json};
use crate::mcp::rpc::{json_rpc_result, protocol_error_to_json_rpc};
use crate::{
    context::RequestContext,
    errors::ProtocolError,
    readeck::types::IncludeOptions,
    AppState,
};

pub const BOOKMARK_URI_PREFIX: &str = "readeck://bookmark/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Metadata,
    ContentMarkdown,
    ContentText,
    HighlightsJson,
    HighlightsMarkdown,
}

impl ResourceKind {
    pub const ALL: [Self; 5] = [
        Self::Metadata,
        Self::ContentMarkdown,
        Self::ContentText,
        Self::HighlightsJson,
        Self::HighlightsMarkdown,
    ];

    fn suffix(self) -> &'static str {
        match self {
            Self::Metadata => "",
            Self::ContentMarkdown => "/content.md",
            Self::ContentText => "/content.txt",
            Self::HighlightsJson => "/highlights.json",
            Self::HighlightsMarkdown => "/highlights.md",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Metadata | Self::HighlightsJson => "application/json",
            Self::ContentMarkdown | Self::HighlightsMarkdown => "text/markdown",
            Self::ContentText => "text/plain",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Metadata => "Bookmark metadata",
            Self::ContentMarkdown => "Bookmark content markdown",
            Self::ContentText => "Bookmark content text",
            Self::HighlightsJson => "Bookmark highlights JSON",
            Self::HighlightsMarkdown => "Bookmark highlights markdown",
        }
    }

    fn uri_template(self) -> String {
        format!("{BOOKMARK_URI_PREFIX}{{id}}{}", self.suffix())
    }

    fn include(self) -> IncludeOptions {
        IncludeOptions {
            content: matches!(self, Self::ContentMarkdown | Self::ContentText),
            highlights: matches!(self, Self::HighlightsJson | Self::HighlightsMarkdown),
            labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTarget {
    pub bookmark_id: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    uri: Option<String>,
}

pub fn build_resources_list() -> Vec<Resource> {
    ResourceKind::ALL
        .into_iter()
        .map(|kind| Resource {
            annotations: None,
            description: None,
            icons: vec![],
            meta: None,
            mime_type: Some(kind.mime_type().to_string()),
            name: kind.name().to_string(),
            size: None,
            title: None,
            uri: kind.uri_template(),
        })
        .collect()
}

pub fn build_resource_templates() -> Value {
    let templates = ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            json!({
                "uriTemplate": kind.uri_template(),
                "name": kind.name(),
                "mimeType": kind.mime_type(),
            })
        })
        .collect::<Vec<_>>();

    json!({ "resourceTemplates": templates })
}

/// Splits `readeck://bookmark/{id}[/<document>]`; unknown documents are rejected.
pub fn parse_resource_uri(uri: &str) -> Option<ResourceTarget> {
    let rest = uri.trim().strip_prefix(BOOKMARK_URI_PREFIX)?;
    let (bookmark_id, document) = match rest.split_once('/') {
        Some((id, document)) => (id, document),
        None => (rest, ""),
    };
    if bookmark_id.trim().is_empty() {
        return None;
    }

    let kind = match document {
        "" => ResourceKind::Metadata,
        "content.md" => ResourceKind::ContentMarkdown,
        "content.txt" => ResourceKind::ContentText,
        "highlights.json" => ResourceKind::HighlightsJson,
        "highlights.md" => ResourceKind::HighlightsMarkdown,
        _ => return None,
    };

    Some(ResourceTarget {
        bookmark_id: bookmark_id.trim().to_string(),
        kind,
    })
}

pub async fn handle_resources_read(
    state: &AppState,
    ctx: &RequestContext,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let uri = params
        .and_then(|params| serde_json::from_value::<ReadParams>(params).ok())
        .and_then(|params| params.uri)
        .map(|uri| uri.trim().to_string())
        .filter(|uri| !uri.is_empty());
    let Some(uri) = uri else {
        return protocol_error_to_json_rpc(
            id,
            ProtocolError::invalid_params("missing_uri", "uri is required"),
        );
    };
    let Some(target) = parse_resource_uri(&uri) else {
        return protocol_error_to_json_rpc(
            id,
            ProtocolError::invalid_params("invalid_uri", "invalid resource uri"),
        );
    };

    let bookmark = match state
        .provider
        .get_bookmark(ctx, &target.bookmark_id, target.kind.include())
        .await
    {
        Ok(bookmark) => bookmark,
        Err(err) => {
            warn!(
                request_id = %ctx.request_id,
                uri = %uri,
                error = %err,
                "resource read failed"
            );
            return protocol_error_to_json_rpc(id, ProtocolError::from(err));
        }
    };

    let text = match target.kind {
        ResourceKind::Metadata => {
            let mut metadata = bookmark;
            metadata.content_text = None;
            metadata.content_html = None;
            metadata.highlights.clear();
            pretty_json(&metadata)
        }
        ResourceKind::ContentMarkdown => render::bookmark_markdown(&bookmark, false),
        ResourceKind::ContentText => render::bookmark_text(&bookmark),
        ResourceKind::HighlightsJson => pretty_json(&json!({ "highlights": bookmark.highlights })),
        ResourceKind::HighlightsMarkdown => render::highlights_markdown(&bookmark.highlights),
    };

    json_rpc_result(
        id,
        serde_json::to_value(ReadResourceResult {
            contents: vec![ReadResourceContent::from(TextResourceContents {
                meta: None,
                mime_type: Some(target.kind.mime_type().to_string()),
                text,
                uri,
            })],
            meta: None,
        })
        .expect("bookmark resource result serialization"),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        context::Transport,
        testing::{bookmark, highlight, MockProvider},
    };

    fn state() -> AppState {
        let mut article = bookmark("b1", "Resource article");
        article.content_text = Some("Body text".to_string());
        let provider = MockProvider::with_bookmarks(vec![article]).with_highlights(vec![highlight(
            "h1",
            "b1",
            "Quoted line",
            "2026-01-01T00:00:00Z",
        )]);
        AppState::new(Arc::new(provider))
    }

    async fn read(uri: &str) -> Value {
        let ctx = RequestContext::detached(Transport::Stdio);
        handle_resources_read(&state(), &ctx, Some(json!(1)), Some(json!({ "uri": uri }))).await
    }

    #[test]
    fn parses_every_document_kind() {
        let cases = [
            ("readeck://bookmark/b1", ResourceKind::Metadata),
            ("readeck://bookmark/b1/content.md", ResourceKind::ContentMarkdown),
            ("readeck://bookmark/b1/content.txt", ResourceKind::ContentText),
            ("readeck://bookmark/b1/highlights.json", ResourceKind::HighlightsJson),
            ("readeck://bookmark/b1/highlights.md", ResourceKind::HighlightsMarkdown),
        ];
        for (uri, kind) in cases {
            let target = parse_resource_uri(uri).expect("valid uri");
            assert_eq!(target.bookmark_id, "b1");
            assert_eq!(target.kind, kind);
        }
    }

    #[test]
    fn rejects_foreign_or_malformed_uris() {
        for uri in [
            "https://example.com/b1",
            "readeck://bookmark/",
            "readeck://label/b1",
            "readeck://bookmark/b1/content.pdf",
        ] {
            assert!(parse_resource_uri(uri).is_none(), "{uri}");
        }
    }

    #[test]
    fn templates_cover_all_documents() {
        let templates = build_resource_templates();
        let list = templates["resourceTemplates"].as_array().expect("array");
        assert_eq!(list.len(), 5);
        assert_eq!(list[0]["uriTemplate"], json!("readeck://bookmark/{id}"));
        assert_eq!(list[3]["uriTemplate"], json!("readeck://bookmark/{id}/highlights.json"));
        assert_eq!(build_resources_list()[2].mime_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn metadata_omits_content_and_highlights() {
        let response = read("readeck://bookmark/b1").await;
        let contents = &response["result"]["contents"][0];
        assert_eq!(contents["mimeType"], json!("application/json"));
        let metadata: Value =
            serde_json::from_str(contents["text"].as_str().unwrap_or_default()).expect("json");
        assert_eq!(metadata["id"], json!("b1"));
        assert!(metadata.get("content_text").is_none());
        assert!(metadata.get("highlights").is_none());
    }

    #[tokio::test]
    async fn markdown_and_highlight_documents_render() {
        let response = read("readeck://bookmark/b1/content.md").await;
        let text = response["result"]["contents"][0]["text"].as_str().unwrap_or_default().to_string();
        assert!(text.starts_with("---\ntitle: \"Resource article\""));
        assert!(text.contains("Body text"));
        assert!(!text.contains("## Highlights"));

        let response = read("readeck://bookmark/b1/highlights.md").await;
        assert_eq!(
            response["result"]["contents"][0]["text"],
            json!("> Quoted line\n- Highlight ID: `h1`\n")
        );

        let response = read("readeck://bookmark/b1/highlights.json").await;
        let text = response["result"]["contents"][0]["text"].as_str().unwrap_or_default().to_string();
        let parsed: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(parsed["highlights"][0]["id"], json!("h1"));
    }

    #[tokio::test]
    async fn invalid_requests_are_invalid_params() {
        let ctx = RequestContext::detached(Transport::Stdio);
        let missing = handle_resources_read(&state(), &ctx, Some(json!(1)), Some(json!({}))).await;
        assert_eq!(missing["error"]["code"], json!(-32602));
        assert_eq!(missing["error"]["message"], json!("uri is required"));

        let invalid = read("readeck://bookmark/b1/other").await;
        assert_eq!(invalid["error"]["code"], json!(-32602));
        assert_eq!(invalid["error"]["message"], json!("invalid resource uri"));
        assert_eq!(invalid["error"]["data"]["code"], json!("invalid_uri"));
    }

    #[tokio::test]
    async fn upstream_failures_carry_error_data() {
        let response = read("readeck://bookmark/missing").await;
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(response["error"]["data"]["error"]["code"], json!("not_found"));
        assert_eq!(
            response["error"]["data"]["error"]["details"]["http_status"],
            json!(404)
        );
    }
}
