//! Message framing for both transports
//!
//! Stdio carries `Content-Length` delimited frames; HTTP carries exactly one
//! JSON document per request body.

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::mcp::rpc::{json_rpc_error, INVALID_REQUEST, PARSE_ERROR};

pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("missing content-length header")]
    MissingContentLength,
    #[error("invalid content-length header: {0}")]
    InvalidContentLength(String),
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge(usize),
    #[error("stream ended inside a frame")]
    UnexpectedEof,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads one frame. `Ok(None)` means the stream closed cleanly between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    let mut saw_header = false;
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if saw_header {
                return Err(FramingError::UnexpectedEof);
            }
            return Ok(None);
        }
        saw_header = true;

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("content-length") {
            let value = value.trim();
            let length = value
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or(FramingError::MissingContentLength)?;
    if length > MAX_FRAME_BYTES {
        return Err(FramingError::FrameTooLarge(length));
    }

    let mut payload = vec![0; length];
    reader.read_exact(&mut payload).await.map_err(|err| match err.kind() {
        std::io::ErrorKind::UnexpectedEof => FramingError::UnexpectedEof,
        _ => FramingError::Io(err),
    })?;
    Ok(Some(payload))
}

pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Decodes an HTTP body into a single envelope, or the error response to send instead.
pub fn decode_http_body(body: &[u8]) -> Result<Value, Value> {
    let trimmed = body.trim_ascii();
    if trimmed.is_empty() {
        return Err(json_rpc_error(None, PARSE_ERROR, "Parse error"));
    }
    if trimmed.starts_with(b"[") {
        return Err(json_rpc_error(
            None,
            INVALID_REQUEST,
            "batch requests are not supported",
        ));
    }

    serde_json::from_slice(trimmed).map_err(|_| json_rpc_error(None, PARSE_ERROR, "Parse error"))
}

/// A missing or empty `Accept` header is treated as accepting anything.
pub fn accepts_rpc_response(accept: Option<&str>) -> bool {
    let Some(accept) = accept.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    accept.split(',').any(|entry| {
        let media_type = entry.split(';').next().unwrap_or_default().trim();
        matches!(
            media_type.to_ascii_lowercase().as_str(),
            "application/json" | "text/event-stream" | "*/*" | "application/*"
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::BufReader;

    use super::*;

    #[tokio::test]
    async fn reads_consecutive_frames_and_ignores_other_headers() {
        let input = b"Content-Length: 2\r\nContent-Type: application/json\r\n\r\n{}content-length: 4\n\nnull";
        let mut reader = BufReader::new(&input[..]);

        let first = read_frame(&mut reader).await.expect("first frame");
        assert_eq!(first.as_deref(), Some(&b"{}"[..]));

        let second = read_frame(&mut reader).await.expect("second frame");
        assert_eq!(second.as_deref(), Some(&b"null"[..]));

        let end = read_frame(&mut reader).await.expect("clean end");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn missing_or_invalid_length_fails() {
        let mut reader = BufReader::new(&b"X-Other: 1\r\n\r\n{}"[..]);
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::MissingContentLength)
        ));

        let mut reader = BufReader::new(&b"Content-Length: abc\r\n\r\n{}"[..]);
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::InvalidContentLength(_))
        ));
    }

    #[tokio::test]
    async fn oversized_and_truncated_frames_fail() {
        let header = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_BYTES + 1);
        let mut reader = BufReader::new(header.as_bytes());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::FrameTooLarge(_))
        ));

        let mut reader = BufReader::new(&b"Content-Length: 10\r\n\r\n{}"[..]);
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::UnexpectedEof)
        ));
    }

    #[tokio::test]
    async fn write_frame_prefixes_length() {
        let mut out = Vec::new();
        write_frame(&mut out, br#"{"a":1}"#).await.expect("write");
        assert_eq!(out, b"Content-Length: 7\r\n\r\n{\"a\":1}");
    }

    #[test]
    fn http_body_rejects_empty_batch_and_garbage() {
        let empty = decode_http_body(b"  ").expect_err("empty body");
        assert_eq!(empty["error"]["code"], json!(-32700));

        let batch = decode_http_body(br#" [{"jsonrpc":"2.0","id":1,"method":"ping"}]"#)
            .expect_err("batch body");
        assert_eq!(batch["error"]["code"], json!(-32600));
        assert_eq!(batch["error"]["message"], json!("batch requests are not supported"));

        let garbage = decode_http_body(b"{not json").expect_err("garbage");
        assert_eq!(garbage["error"]["code"], json!(-32700));

        let invalid_utf8 = decode_http_body(
            b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"params\":{\"x\":\"\xFF\"}}",
        )
        .expect_err("invalid utf-8");
        assert_eq!(invalid_utf8["error"]["code"], json!(-32700));

        let ok = decode_http_body(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).expect("valid");
        assert_eq!(ok["method"], json!("ping"));
    }

    #[test]
    fn accept_header_negotiation() {
        assert!(accepts_rpc_response(None));
        assert!(accepts_rpc_response(Some("")));
        assert!(accepts_rpc_response(Some("application/json, text/event-stream")));
        assert!(accepts_rpc_response(Some("text/event-stream;q=0.9")));
        assert!(accepts_rpc_response(Some("*/*")));
        assert!(!accepts_rpc_response(Some("text/html")));
    }
}
