//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC envelopes from either transport, routes requests by method
//! name, negotiates the protocol version on `initialize`, and audits every
//! dispatched call with redacted params.

use std::time::Instant;

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ListResourcesResult, ListToolsResult, ServerCapabilities,
    ServerCapabilitiesPrompts, ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::domain::{
    prompts::{build_prompts_list, handle_prompts_get},
    resources::{build_resource_templates, build_resources_list, handle_resources_read},
    tools::{build_tools_list, handle_tools_call},
};
use crate::mcp::rpc::{
    is_json_rpc_error, json_rpc_error, json_rpc_result, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use crate::{
    context::{correlation_id_string, RequestContext, Transport},
    AppState,
};

pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

const SERVER_INSTRUCTIONS: &str = "Search, read, label and cite Readeck bookmarks. \
Bookmark documents are available as readeck://bookmark/{id} resources.";

/// Decodes one raw frame or body and dispatches it; `None` means nothing is sent back.
pub async fn handle_json_rpc_bytes(
    state: &AppState,
    transport: Transport,
    payload: &[u8],
    cancel: &CancellationToken,
) -> Option<Value> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(value) => handle_json_rpc_value(state, transport, value, cancel).await,
        Err(_) => Some(json_rpc_error(None, PARSE_ERROR, "Parse error")),
    }
}

pub async fn handle_json_rpc_value(
    state: &AppState,
    transport: Transport,
    payload: Value,
    cancel: &CancellationToken,
) -> Option<Value> {
    let Value::Object(envelope) = payload else {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    };

    let request_id = envelope.get("id").cloned().filter(|id| !id.is_null());
    let method = envelope
        .get("method")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .map(str::to_string);

    let Some(method) = method else {
        if envelope.get("method").is_none()
            && (envelope.contains_key("result") || envelope.contains_key("error"))
        {
            debug!(transport = transport.as_str(), "ignoring client response envelope");
            return None;
        }
        return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"));
    };
    let params = envelope.get("params").cloned();

    let Some(id) = request_id else {
        handle_notification(transport, &method, params.as_ref());
        return None;
    };

    let ctx = RequestContext::new(correlation_id_string(&id), transport, cancel.child_token());
    let span = info_span!(
        "mcp_request",
        request_id = %ctx.request_id,
        method = %method,
        transport = ctx.transport.as_str()
    );

    Some(
        handle_json_rpc_request(state, &ctx, Some(id), &method, params)
            .instrument(span)
            .await,
    )
}

fn handle_notification(transport: Transport, method: &str, params: Option<&Value>) {
    match method {
        "notifications/initialized" | "initialized" => {
            info!(transport = transport.as_str(), "client initialized");
        }
        "notifications/cancelled" => {
            let cancelled_id = params
                .and_then(|params| params.get("requestId"))
                .map(correlation_id_string)
                .unwrap_or_default();
            info!(
                transport = transport.as_str(),
                cancelled_request_id = %cancelled_id,
                "client cancelled request"
            );
        }
        other => debug!(transport = transport.as_str(), method = other, "ignoring notification"),
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    ctx: &RequestContext,
    id: Option<Value>,
    method: &str,
    params: Option<Value>,
) -> Value {
    let audit_params = redact_audit_params(params.as_ref());
    let started = Instant::now();
    info!(params = %audit_params, "mcp request started");

    let response = match method {
        "initialize" => {
            let initialize_result = InitializeResult {
                server_info: Implementation {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    title: Some("Readeck".to_string()),
                    description: None,
                    icons: vec![],
                    website_url: None,
                },
                capabilities: ServerCapabilities {
                    tools: Some(ServerCapabilitiesTools {
                        list_changed: Some(false),
                    }),
                    resources: Some(ServerCapabilitiesResources {
                        subscribe: Some(false),
                        list_changed: Some(false),
                    }),
                    prompts: Some(ServerCapabilitiesPrompts {
                        list_changed: Some(false),
                    }),
                    ..Default::default()
                },
                protocol_version: negotiate_protocol_version(params.as_ref()),
                instructions: Some(SERVER_INSTRUCTIONS.to_string()),
                meta: None,
            };

            json_rpc_result(
                id,
                serde_json::to_value(initialize_result).expect("initialize result serialization"),
            )
        }
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => json_rpc_result(
            id,
            serde_json::to_value(ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: build_tools_list(),
            })
            .expect("tools list result serialization"),
        ),
        "tools/call" => handle_tools_call(state, ctx, id, params).await,
        "resources/list" => json_rpc_result(
            id,
            serde_json::to_value(ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: build_resources_list(),
            })
            .expect("resources list result serialization"),
        ),
        "resources/templates/list" => json_rpc_result(id, build_resource_templates()),
        "resources/read" => handle_resources_read(state, ctx, id, params).await,
        "prompts/list" => json_rpc_result(id, build_prompts_list()),
        "prompts/get" => handle_prompts_get(id, params),
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        params = %audit_params,
        duration_ms = started.elapsed().as_millis() as u64,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

/// Echoes a supported offered version; anything else gets the latest one.
pub fn negotiate_protocol_version(params: Option<&Value>) -> String {
    params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| SUPPORTED_PROTOCOL_VERSIONS.contains(version))
        .unwrap_or(LATEST_PROTOCOL_VERSION)
        .to_string()
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}
