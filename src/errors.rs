use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::readeck::client::ClientError;

/// Rejections raised by the HTTP layer before a request reaches the dispatcher.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("forbidden: {message}")]
    Forbidden {
        code: &'static str,
        message: &'static str,
    },
    #[error("not acceptable: {message}")]
    NotAcceptable {
        code: &'static str,
        message: &'static str,
    },
}

/// Failures of a dispatched request that surface as a JSON-RPC `error`.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid params: {message}")]
    InvalidParams { code: &'static str, message: String },
    #[error("upstream failure: {0}")]
    Upstream(ToolError),
}

impl ProtocolError {
    pub fn invalid_params(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            code,
            message: message.into(),
        }
    }
}

impl From<ClientError> for ProtocolError {
    fn from(err: ClientError) -> Self {
        Self::Upstream(ToolError::from(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn forbidden(code: &'static str, message: &'static str) -> Self {
        Self::Forbidden { code, message }
    }

    pub fn not_acceptable(code: &'static str, message: &'static str) -> Self {
        Self::NotAcceptable { code, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.to_string())
            }
            Self::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message.to_string()),
            Self::NotAcceptable { code, message } => {
                (StatusCode::NOT_ACCEPTABLE, code, message.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details: json!({}),
            }),
        )
            .into_response()
    }
}

/// Failure kinds a tool call can report back to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorCode {
    InvalidInput,
    Unauthorized,
    NotFound,
    RateLimited,
    UpstreamError,
}

impl ToolErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::UpstreamError => "upstream_error",
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::UpstreamError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamDetails {
    pub http_status: u16,
    pub endpoint: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ToolError {
    pub code: ToolErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<UpstreamDetails>,
}

impl ToolError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: ToolErrorCode::InvalidInput,
            message: message.into(),
            details: None,
        }
    }
}

impl From<ClientError> for ToolError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidInput(message) => Self::invalid_input(message),
            ClientError::Http {
                status,
                endpoint,
                request_id,
                message,
            } => Self {
                code: ToolErrorCode::from_status(status),
                message,
                details: Some(UpstreamDetails {
                    http_status: status,
                    endpoint,
                    request_id,
                }),
            },
            other => Self {
                code: ToolErrorCode::UpstreamError,
                message: other.to_string(),
                details: None,
            },
        }
    }
}
