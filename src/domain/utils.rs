//! Domain-specific shared validations and formatting utilities

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::ToolError;

/// Decodes tool arguments; absent or `null` arguments decode as an empty object.
pub fn decode_arguments<T>(arguments: Option<Value>) -> Result<T, ToolError>
where
    T: DeserializeOwned,
{
    let value = match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value @ Value::Object(_)) => value,
        Some(_) => return Err(ToolError::invalid_input("arguments must be an object")),
    };

    serde_json::from_value(value)
        .map_err(|err| ToolError::invalid_input(format!("invalid arguments: {err}")))
}

/// Trimmed value, or `None` when missing or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn require_id(value: &str, field: &str) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Parses a snake_case choice through the target's serde representation.
pub fn parse_choice<T>(value: Option<String>, field: &str, allowed: &[&str]) -> Result<T, ToolError>
where
    T: DeserializeOwned + Default,
{
    let Some(value) = non_blank(value) else {
        return Ok(T::default());
    };

    serde_json::from_value(Value::String(value.to_ascii_lowercase())).map_err(|_| {
        ToolError::invalid_input(format!("{field} must be one of: {}", allowed.join(", ")))
    })
}

pub fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
