//! Stdio transport: sequential `Content-Length` framed request loop.

use tokio::{
    io::{AsyncBufRead, AsyncWrite},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::mcp::{
    framing::{read_frame, write_frame, FramingError},
    server::handle_json_rpc_bytes,
};
use crate::{context::Transport, AppState};

/// Serializes every response frame through one writer.
pub struct FrameWriter<W> {
    inner: Mutex<W>,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    pub async fn send(&self, payload: &[u8]) -> Result<(), FramingError> {
        let mut writer = self.inner.lock().await;
        write_frame(&mut *writer, payload).await
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

/// Reads frames until EOF or shutdown; each frame is answered before the next read.
/// A framing error ends the session.
pub async fn run_stdio<R, W>(
    state: &AppState,
    mut reader: R,
    writer: &FrameWriter<W>,
    shutdown: &CancellationToken,
) -> Result<(), FramingError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("stdio transport ready");

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("stdio transport shutting down");
                return Ok(());
            }
            frame = read_frame(&mut reader) => frame,
        };

        let payload = match frame {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                info!("stdin closed");
                return Ok(());
            }
            Err(err) => {
                error!(error = %err, "stdio framing failed");
                return Err(err);
            }
        };

        let Some(response) =
            handle_json_rpc_bytes(state, Transport::Stdio, &payload, shutdown).await
        else {
            continue;
        };

        let encoded = serde_json::to_vec(&response).expect("jsonrpc response serialization");
        writer.send(&encoded).await?;
    }
}
