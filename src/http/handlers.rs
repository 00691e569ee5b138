//! Axum HTTP handlers for the web server
//!
//! Provides the primary Model Context Protocol endpoint, and general metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::mcp::{
    framing::{accepts_rpc_response, decode_http_body},
    server::handle_json_rpc_value,
};
use crate::{context::Transport, errors::AppError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: String,
    pub transports: [&'static str; 1],
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: state.mcp_path.to_string(),
        transports: ["http"],
    })
}

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    if !accepts_rpc_response(accept) {
        return AppError::not_acceptable(
            "not_acceptable",
            "Accept must allow application/json",
        )
        .into_response();
    }

    let payload = match decode_http_body(&body) {
        Ok(value) => value,
        Err(error_response) => return (StatusCode::OK, Json(error_response)).into_response(),
    };

    match handle_json_rpc_value(&state, Transport::Http, payload, &state.shutdown).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
