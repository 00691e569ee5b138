//! Per-call execution context
//!
//! Carries the correlation id and cancellation signal of one dispatched request
//! down into the upstream client, so concurrent requests never share log state.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub transport: Transport,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, transport: Transport, cancel: CancellationToken) -> Self {
        Self {
            request_id: request_id.into(),
            transport,
            cancel,
        }
    }

    /// Context for work that is not tied to an RPC id (tests, notifications).
    pub fn detached(transport: Transport) -> Self {
        Self::new(String::new(), transport, CancellationToken::new())
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// Renders a JSON-RPC id for log fields: strings bare, numbers in their JSON form.
pub fn correlation_id_string(id: &Value) -> String {
    match id {
        Value::String(value) => value.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn correlation_id_renders_strings_and_numbers() {
        assert_eq!(correlation_id_string(&json!("abc-1")), "abc-1");
        assert_eq!(correlation_id_string(&json!(42)), "42");
        assert_eq!(correlation_id_string(&json!(1.5)), "1.5");
        assert_eq!(correlation_id_string(&Value::Null), "");
    }

    #[tokio::test]
    async fn cancel_token_propagates_to_context() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new("7", Transport::Http, token.child_token());
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), ctx.cancelled())
            .await
            .expect("context observes cancellation");
    }
}
