//! Prompt templates that point an agent at bookmark resources.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::errors::ProtocolError;
use crate::mcp::rpc::{
    json_rpc_error, json_rpc_result, protocol_error_to_json_rpc, INVALID_PARAMS,
};

pub const SUMMARIZE_PROMPT: &str = "readeck.prompt.summarize";
pub const FLASHCARDS_PROMPT: &str = "readeck.prompt.flashcards";

const DEFAULT_FOCUS: &str = "key_ideas";
const DEFAULT_NUM_CARDS: u64 = 10;
const DEFAULT_CARD_TYPE: &str = "qa";

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

pub fn build_prompts_list() -> Value {
    json!({
        "prompts": [
            {
                "name": SUMMARIZE_PROMPT,
                "description": "Summarize a bookmark with optional focus mode.",
                "arguments": [
                    { "name": "bookmark_id", "required": true },
                    { "name": "focus", "required": false }
                ]
            },
            {
                "name": FLASHCARDS_PROMPT,
                "description": "Create flashcards from bookmark content/highlights.",
                "arguments": [
                    { "name": "bookmark_id", "required": true },
                    { "name": "num_cards", "required": false },
                    { "name": "card_type", "required": false },
                    { "name": "use_highlights", "required": false }
                ]
            }
        ]
    })
}

pub fn handle_prompts_get(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(params) = params
        .filter(Value::is_object)
        .and_then(|params| serde_json::from_value::<GetPromptParams>(params).ok())
    else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let Some(bookmark_id) = string_argument(&params.arguments, "bookmark_id") else {
        return protocol_error_to_json_rpc(
            id,
            ProtocolError::invalid_params("missing_bookmark_id", "bookmark_id is required"),
        );
    };

    match params.name.trim() {
        SUMMARIZE_PROMPT => {
            let focus = string_argument(&params.arguments, "focus")
                .unwrap_or_else(|| DEFAULT_FOCUS.to_string());
            let text = format!(
                "Summarize this article with focus on {focus}. Read:\n\
                 - readeck://bookmark/{bookmark_id}/content.md\n\
                 - readeck://bookmark/{bookmark_id}/highlights.md"
            );
            json_rpc_result(id, prompt_result("Summarize bookmark", text))
        }
        FLASHCARDS_PROMPT => {
            let num_cards = count_argument(&params.arguments, "num_cards").unwrap_or(DEFAULT_NUM_CARDS);
            let card_type = string_argument(&params.arguments, "card_type")
                .unwrap_or_else(|| DEFAULT_CARD_TYPE.to_string());
            let use_highlights = bool_argument(&params.arguments, "use_highlights").unwrap_or(true);

            let mut text = format!(
                "Generate {num_cards} {card_type} flashcards from this article. Read:\n\
                 - readeck://bookmark/{bookmark_id}/content.md"
            );
            if use_highlights {
                text.push_str(&format!("\n- readeck://bookmark/{bookmark_id}/highlights.md"));
            }
            json_rpc_result(id, prompt_result("Flashcards from bookmark", text))
        }
        _ => protocol_error_to_json_rpc(
            id,
            ProtocolError::invalid_params("unknown_prompt", "unknown prompt"),
        ),
    }
}

fn prompt_result(description: &str, text: String) -> Value {
    json!({
        "description": description,
        "messages": [
            {
                "role": "user",
                "content": { "type": "text", "text": text }
            }
        ]
    })
}

fn string_argument(arguments: &Map<String, Value>, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Prompt arguments are usually strings, so numeric text is accepted too.
fn count_argument(arguments: &Map<String, Value>, key: &str) -> Option<u64> {
    match arguments.get(key)? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .filter(|count| *count > 0)
}

fn bool_argument(arguments: &Map<String, Value>, key: &str) -> Option<bool> {
    match arguments.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
