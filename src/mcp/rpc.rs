//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps `ProtocolError`s onto JSON-RPC error payloads and builds result
//! envelopes that echo the caller's id verbatim.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::ProtocolError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const SERVER_ERROR: i32 = -32000;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn protocol_error_to_json_rpc(id: Option<Value>, err: ProtocolError) -> Value {
    match err {
        ProtocolError::InvalidParams { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            &message,
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        ProtocolError::Upstream(error) => json_rpc_error_with_data(
            id,
            SERVER_ERROR,
            &error.message,
            Some(json!({ "error": error })),
        ),
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let error = RpcError {
        code: i64::from(code),
        data,
        message: message.to_string(),
    };

    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let response = JsonrpcErrorResponse::new(error, Some(request_id));
        return serde_json::to_value(response).expect("jsonrpc error response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "error": error
    })
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Only ids the SDK can represent losslessly; anything else is echoed as raw JSON.
pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ToolError;

    #[test]
    fn result_echoes_string_and_integer_ids() {
        let response = json_rpc_result(Some(json!("abc")), json!({"ok": true}));
        assert_eq!(response["id"], json!("abc"));
        assert_eq!(response["result"]["ok"], json!(true));

        let response = json_rpc_result(Some(json!(7)), json!({}));
        assert_eq!(response["id"], json!(7));
        assert_eq!(response["jsonrpc"], json!("2.0"));
    }

    #[test]
    fn fractional_ids_are_echoed_verbatim() {
        let response = json_rpc_error(Some(json!(1.5)), METHOD_NOT_FOUND, "Method not found");
        assert_eq!(response["id"], json!(1.5));
        assert_eq!(response["error"]["code"], json!(-32601));
    }

    #[test]
    fn missing_id_serializes_as_null() {
        let response = json_rpc_error(None, PARSE_ERROR, "Parse error");
        assert_eq!(response["id"], Value::Null);
        assert!(response.as_object().expect("object").contains_key("id"));
        assert_eq!(response["error"]["code"], json!(-32700));
    }

    #[test]
    fn upstream_errors_embed_taxonomy_error() {
        let err = ProtocolError::Upstream(ToolError::invalid_input("bad"));
        let response = protocol_error_to_json_rpc(Some(json!(3)), err);
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(response["error"]["data"]["error"]["code"], json!("invalid_input"));
    }
}
