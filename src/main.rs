use std::sync::Arc;

use readeck_mcp::{
    build_app,
    config::Config,
    context::Transport,
    logging,
    mcp::stdio::{run_stdio, FrameWriter},
    readeck::ReadeckClient,
    AppState,
};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let client = ReadeckClient::new(config.client_settings())?;
    let shutdown = CancellationToken::new();

    let state = AppState::new(Arc::new(client))
        .with_http_auth_token(config.http_auth_token.clone())
        .with_allowed_origins(config.allowed_origins.clone())
        .with_mcp_path(&config.http_path)
        .with_shutdown(shutdown.clone());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for shutdown signal");
                return;
            }
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    info!(
        transport = config.transport.as_str(),
        api_base = %config.api_base,
        "server starting"
    );

    match config.transport {
        Transport::Stdio => {
            let writer = FrameWriter::new(tokio::io::stdout());
            run_stdio(&state, BufReader::new(tokio::io::stdin()), &writer, &shutdown).await?;
        }
        Transport::Http => {
            if config.http_auth_token.is_none() {
                warn!("MCP_HTTP_AUTH_TOKEN is not set; the HTTP endpoint is unauthenticated");
            }

            let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
            info!(
                http_addr = %config.http_addr,
                http_path = %config.http_path,
                "http transport listening"
            );

            let app = build_app(state);
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await?;
        }
    }

    Ok(())
}
