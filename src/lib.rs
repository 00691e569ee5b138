use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;

pub mod auth;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod readeck;
#[cfg(test)]
pub mod testing;

use readeck::BookmarkProvider;

pub const MAX_BODY_BYTES: usize = 1 << 20;
pub const DEFAULT_MCP_PATH: &str = "/mcp";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn BookmarkProvider>,
    pub http_auth_token: Option<Arc<str>>,
    pub allowed_origins: Arc<[String]>,
    pub mcp_path: Arc<str>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(provider: Arc<dyn BookmarkProvider>) -> Self {
        Self {
            provider,
            http_auth_token: None,
            allowed_origins: Arc::from(Vec::new()),
            mcp_path: Arc::from(DEFAULT_MCP_PATH),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_http_auth_token(mut self, token: Option<String>) -> Self {
        self.http_auth_token = token.map(Arc::<str>::from);
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Arc::from(origins);
        self
    }

    pub fn with_mcp_path(mut self, path: &str) -> Self {
        self.mcp_path = Arc::from(path);
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(&state.mcp_path, post(http::handlers::mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::enforce_origin_allowlist,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
