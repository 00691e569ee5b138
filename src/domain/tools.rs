//! Interactive tools exposed via Model Context Protocol
//!
//! Every tool decodes its arguments, runs one operation against the
//! `BookmarkProvider` and reports failures inside a successful RPC response
//! with `isError` set, so the agent sees the error taxonomy.

use chrono::{DateTime, Utc};
use rust_mcp_sdk::{
    macros,
    schema::{CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::domain::{
    citation::{self, CitationStyle},
    highlights::{list_highlights, HighlightDateFilter},
    utils::{decode_arguments, non_blank, parse_choice, pretty_json, require_id},
};
use crate::mcp::rpc::{json_rpc_error, json_rpc_result, INVALID_PARAMS};
use crate::{
    context::RequestContext,
    errors::{ToolError, ToolErrorCode},
    readeck::{
        types::{ArchivedMode, IncludeOptions, SearchOptions, SortMode},
        BookmarkProvider,
    },
    AppState,
};

const ARCHIVED_CHOICES: [&str; 3] = ["exclude", "include", "only"];
const SORT_CHOICES: [&str; 4] = ["relevance", "updated_desc", "created_desc", "published_desc"];

#[macros::mcp_tool(name = "readeck.search", description = "Search and filter bookmarks.")]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckSearchTool {
    /// Full-text query.
    pub query: Option<String>,
    /// Case-insensitive title substring.
    pub title: Option<String>,
    pub text: Option<String>,
    /// Every label must be present on a match.
    pub labels: Option<Vec<String>>,
    /// One of: exclude, include, only.
    pub archived: Option<String>,
    pub favorites: Option<bool>,
    /// One of: relevance, updated_desc, created_desc, published_desc.
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetInclude {
    pub content: Option<bool>,
    pub highlights: Option<bool>,
    pub labels: Option<bool>,
}

#[macros::mcp_tool(
    name = "readeck.get",
    description = "Fetch one bookmark with optional content and highlights."
)]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckGetTool {
    #[serde(default)]
    pub id: String,
    /// Defaults: content false, highlights true, labels true.
    pub include: Option<GetInclude>,
}

#[macros::mcp_tool(name = "readeck.archive", description = "Archive or unarchive a bookmark.")]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckArchiveTool {
    #[serde(default)]
    pub id: String,
    /// Target state, defaults to true.
    pub archived: Option<bool>,
}

#[macros::mcp_tool(name = "readeck.labels.list", description = "List all labels.")]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckLabelsListTool {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[macros::mcp_tool(name = "readeck.labels.set", description = "Replace labels on a bookmark.")]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckLabelsSetTool {
    #[serde(default)]
    pub id: String,
    /// Full replacement set; duplicates are dropped case-insensitively.
    #[serde(default)]
    pub labels: Vec<String>,
}

#[macros::mcp_tool(
    name = "readeck.highlights.list",
    description = "List annotations/highlights globally or per bookmark, with optional date filtering."
)]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckHighlightsListTool {
    pub bookmark_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<i64>,
    /// Single UTC day, YYYY-MM-DD.
    pub date: Option<String>,
    /// Inclusive range start, YYYY-MM-DD.
    pub date_from: Option<String>,
    /// Exclusive range end, YYYY-MM-DD.
    pub date_to: Option<String>,
}

#[macros::mcp_tool(
    name = "readeck.cite",
    description = "Generate citations for a bookmark in multiple styles."
)]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ReadeckCiteTool {
    #[serde(default)]
    pub bookmark_id: String,
    pub highlight_id: Option<String>,
    pub quote: Option<String>,
    /// One of: apa, mla, chicago, bibtex, csl-json, markdown.
    pub style: Option<String>,
    /// RFC3339 access time, defaults to now.
    pub accessed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![
        ReadeckSearchTool::tool(),
        ReadeckGetTool::tool(),
        ReadeckArchiveTool::tool(),
        ReadeckLabelsListTool::tool(),
        ReadeckLabelsSetTool::tool(),
        ReadeckHighlightsListTool::tool(),
        ReadeckCiteTool::tool(),
    ]
}

pub async fn handle_tools_call(
    state: &AppState,
    ctx: &RequestContext,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params.filter(Value::is_object) else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: ToolCallParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };
    if tool_call.name.trim().is_empty() {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    }

    let result = call_tool(
        state.provider.as_ref(),
        ctx,
        tool_call.name.trim(),
        tool_call.arguments,
    )
    .await;

    json_rpc_result(
        id,
        serde_json::to_value(result).expect("tool call result serialization"),
    )
}

/// Runs a tool and wraps the outcome as an MCP tool result.
pub async fn call_tool(
    provider: &dyn BookmarkProvider,
    ctx: &RequestContext,
    name: &str,
    arguments: Option<Value>,
) -> CallToolResult {
    match execute_tool(provider, ctx, name, arguments).await {
        Ok(value) => tool_success(value),
        Err(err) => {
            warn!(
                request_id = %ctx.request_id,
                tool = name,
                code = err.code.as_str(),
                error = %err.message,
                "tool call failed"
            );
            tool_failure(err)
        }
    }
}

pub async fn execute_tool(
    provider: &dyn BookmarkProvider,
    ctx: &RequestContext,
    name: &str,
    arguments: Option<Value>,
) -> Result<Value, ToolError> {
    match name {
        "readeck.search" => {
            let args: ReadeckSearchTool = decode_arguments(arguments)?;
            let options = SearchOptions {
                query: non_blank(args.query),
                title: non_blank(args.title),
                text: non_blank(args.text),
                labels: args.labels.unwrap_or_default(),
                archived: parse_choice::<ArchivedMode>(args.archived, "archived", &ARCHIVED_CHOICES)?,
                favorites: args.favorites,
                sort: parse_choice::<SortMode>(args.sort, "sort", &SORT_CHOICES)?,
                limit: args.limit.map(|limit| limit as usize),
                cursor: non_blank(args.cursor),
            };
            structured(provider.search(ctx, options).await?)
        }
        "readeck.get" => {
            let args: ReadeckGetTool = decode_arguments(arguments)?;
            let id = require_id(&args.id, "id")?;
            let defaults = IncludeOptions::default();
            let include = args.include.unwrap_or_default();
            let include = IncludeOptions {
                content: include.content.unwrap_or(defaults.content),
                highlights: include.highlights.unwrap_or(defaults.highlights),
                labels: include.labels.unwrap_or(defaults.labels),
            };
            let bookmark = provider.get_bookmark(ctx, &id, include).await?;
            Ok(json!({ "bookmark": bookmark }))
        }
        "readeck.archive" => {
            let args: ReadeckArchiveTool = decode_arguments(arguments)?;
            let id = require_id(&args.id, "id")?;
            let archived = args.archived.unwrap_or(true);
            structured(provider.set_archived(ctx, &id, archived).await?)
        }
        "readeck.labels.list" => {
            let args: ReadeckLabelsListTool = decode_arguments(arguments)?;
            let cursor = non_blank(args.cursor);
            let limit = args.limit.map(|limit| limit as usize);
            structured(provider.list_labels(ctx, limit, cursor.as_deref()).await?)
        }
        "readeck.labels.set" => {
            let args: ReadeckLabelsSetTool = decode_arguments(arguments)?;
            let id = require_id(&args.id, "id")?;
            if args.labels.iter().all(|label| label.trim().is_empty()) {
                return Err(ToolError::invalid_input("labels is required"));
            }
            structured(provider.set_labels(ctx, &id, &args.labels).await?)
        }
        "readeck.highlights.list" => {
            let args: ReadeckHighlightsListTool = decode_arguments(arguments)?;
            let offset = match args.offset {
                Some(offset) if offset < 0 => {
                    return Err(ToolError::invalid_input("offset must be >= 0"))
                }
                Some(offset) => offset as usize,
                None => 0,
            };
            let filter = HighlightDateFilter::parse(
                args.date.as_deref(),
                args.date_from.as_deref(),
                args.date_to.as_deref(),
            )?;
            let bookmark_id = non_blank(args.bookmark_id);
            let limit = args.limit.map(|limit| limit as usize);
            let result =
                list_highlights(provider, ctx, bookmark_id.as_deref(), limit, offset, filter)
                    .await?;
            structured(result)
        }
        "readeck.cite" => {
            let args: ReadeckCiteTool = decode_arguments(arguments)?;
            let bookmark_id = require_id(&args.bookmark_id, "bookmark_id")?;
            let style = args
                .style
                .as_deref()
                .unwrap_or_default()
                .parse::<CitationStyle>()
                .map_err(ToolError::invalid_input)?;
            let accessed_at = match non_blank(args.accessed_at) {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .map_err(|_| ToolError::invalid_input("accessed_at must be RFC3339"))?,
                None => Utc::now(),
            };

            let include = IncludeOptions {
                content: false,
                highlights: true,
                labels: true,
            };
            let bookmark = provider.get_bookmark(ctx, &bookmark_id, include).await?;

            let highlight = match non_blank(args.highlight_id) {
                Some(highlight_id) => Some(
                    bookmark
                        .highlights
                        .iter()
                        .find(|highlight| highlight.id == highlight_id)
                        .ok_or_else(|| {
                            ToolError::invalid_input("highlight_id not found for bookmark")
                        })?,
                ),
                None => None,
            };

            let quote = non_blank(args.quote);
            let citation =
                citation::generate(&bookmark, highlight, quote.as_deref(), style, accessed_at);
            Ok(json!({ "citation": citation }))
        }
        other => Err(ToolError::invalid_input(format!("unknown tool: {other}"))),
    }
}

fn structured<T: Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|err| ToolError {
        code: ToolErrorCode::UpstreamError,
        message: format!("encode result: {err}"),
        details: None,
    })
}

pub fn tool_success(value: Value) -> CallToolResult {
    let text = pretty_json(&value);
    let structured_content = match value {
        Value::Object(map) => map,
        other => Map::from_iter([("result".to_string(), other)]),
    };

    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: Some(structured_content),
    }
}

pub fn tool_failure(err: ToolError) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(
            err.message.clone(),
            None,
            None,
        ))],
        is_error: Some(true),
        meta: None,
        structured_content: Some(Map::from_iter([("error".to_string(), json!(err))])),
    }
}
