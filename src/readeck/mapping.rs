//! Upstream JSON to normalized schema
//!
//! Readeck payloads drift between API generations, so every normalized field is
//! resolved through an ordered list of candidate keys. New upstream shapes are
//! supported by appending a key to the matching table below.

use serde_json::{Map, Value};

use super::types::{Bookmark, Highlight, Label};

pub type JsonObject = Map<String, Value>;

pub mod keys {
    pub const ID: &[&str] = &["id", "uid"];
    pub const URL: &[&str] = &["url", "link"];
    pub const TITLE: &[&str] = &["title"];
    pub const SITE_NAME: &[&str] = &["site_name", "site", "domain"];
    pub const AUTHOR: &[&str] = &["author", "byline"];
    pub const PUBLISHED_AT: &[&str] = &["published_at", "published"];
    pub const CREATED_AT: &[&str] = &["created_at", "created"];
    pub const UPDATED_AT: &[&str] = &["updated_at", "updated"];
    pub const ARCHIVED: &[&str] = &["is_archived", "archived"];
    pub const FAVORITE: &[&str] = &["is_favorite", "favorite"];
    pub const LABELS: &[&str] = &["labels", "tags"];
    pub const HIGHLIGHTS: &[&str] = &["highlights"];
    pub const CONTENT_TEXT: &[&str] = &["content_text", "text", "content"];
    pub const CONTENT_HTML: &[&str] = &["content_html", "html"];
    pub const FETCHED_TEXT: &[&str] = &["content_text", "text", "content", "article"];
    pub const SNIPPET: &[&str] = &["snippet", "excerpt", "summary", "description", "content_text"];

    pub const LABEL_NAME: &[&str] = &["name", "label", "title"];
    pub const LABEL_COLOR: &[&str] = &["color", "hex"];

    pub const HIGHLIGHT_BOOKMARK: &[&str] = &["bookmark_id", "article_id"];
    pub const HIGHLIGHT_TEXT: &[&str] = &["text", "quote"];
    pub const HIGHLIGHT_NOTE: &[&str] = &["note", "comment"];
    pub const HIGHLIGHT_COLOR: &[&str] = &["color"];
    pub const HIGHLIGHT_LOCATION: &[&str] = &["location"];

    pub const LIST_ITEMS: &[&str] = &["items", "results", "bookmarks", "labels", "highlights", "data"];
    pub const NEXT_CURSOR: &[&str] = &["next_cursor", "next", "cursor"];
}

const SNIPPET_MAX_CHARS: usize = 280;

pub fn map_bookmark(obj: &JsonObject) -> Bookmark {
    let url = first_non_empty_string(obj, keys::URL).unwrap_or_default();
    let title = first_non_empty_string(obj, keys::TITLE).unwrap_or_else(|| url.clone());

    Bookmark {
        id: first_non_empty_string(obj, keys::ID).unwrap_or_default(),
        url,
        title,
        site_name: first_non_empty_string(obj, keys::SITE_NAME),
        author: first_non_empty_string(obj, keys::AUTHOR),
        published_at: first_timestamp(obj, keys::PUBLISHED_AT),
        created_at: first_timestamp(obj, keys::CREATED_AT),
        updated_at: first_timestamp(obj, keys::UPDATED_AT),
        is_archived: first_bool(obj, keys::ARCHIVED),
        is_favorite: first_bool(obj, keys::FAVORITE),
        labels: extract_labels(obj, keys::LABELS),
        content_text: first_non_empty_string(obj, keys::CONTENT_TEXT),
        content_html: first_non_empty_string(obj, keys::CONTENT_HTML),
        highlights: extract_highlights(obj, keys::HIGHLIGHTS),
    }
}

pub fn map_label(obj: &JsonObject) -> Label {
    Label {
        id: first_non_empty_string(obj, keys::ID),
        name: first_non_empty_string(obj, keys::LABEL_NAME)
            .map(|name| name.trim().to_string())
            .unwrap_or_default(),
        color: first_non_empty_string(obj, keys::LABEL_COLOR),
    }
}

pub fn map_highlight(obj: &JsonObject) -> Highlight {
    let location = keys::HIGHLIGHT_LOCATION
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| value.is_object() || value.is_array())
        .cloned();

    Highlight {
        id: first_non_empty_string(obj, keys::ID).unwrap_or_default(),
        bookmark_id: first_non_empty_string(obj, keys::HIGHLIGHT_BOOKMARK).unwrap_or_default(),
        text: first_non_empty_string(obj, keys::HIGHLIGHT_TEXT).unwrap_or_default(),
        note: first_non_empty_string(obj, keys::HIGHLIGHT_NOTE),
        color: first_non_empty_string(obj, keys::HIGHLIGHT_COLOR),
        created_at: first_timestamp(obj, keys::CREATED_AT),
        location,
    }
}

/// Labels may arrive as objects or bare strings; a key yielding nothing usable falls through.
pub fn extract_labels(obj: &JsonObject, candidates: &[&str]) -> Vec<Label> {
    for key in candidates {
        let Some(Value::Array(items)) = obj.get(*key) else {
            continue;
        };

        let labels = items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map_label(map)),
                Value::String(name) => Some(Label {
                    name: name.trim().to_string(),
                    ..Label::default()
                }),
                _ => None,
            })
            .filter(|label| !label.name.is_empty())
            .collect::<Vec<_>>();

        if !labels.is_empty() {
            return labels;
        }
    }

    Vec::new()
}

pub fn extract_highlights(obj: &JsonObject, candidates: &[&str]) -> Vec<Highlight> {
    for key in candidates {
        let Some(Value::Array(items)) = obj.get(*key) else {
            continue;
        };

        let highlights = items
            .iter()
            .filter_map(Value::as_object)
            .map(map_highlight)
            .filter(|highlight| !highlight.id.is_empty())
            .collect::<Vec<_>>();

        if !highlights.is_empty() {
            return highlights;
        }
    }

    Vec::new()
}

/// Splits a list envelope into its records and continuation token.
pub fn extract_items_and_cursor(obj: &JsonObject) -> (Vec<JsonObject>, Option<String>) {
    let next = first_non_empty_string(obj, keys::NEXT_CURSOR);

    let items = keys::LIST_ITEMS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect::<Vec<_>>()
        })
        .find(|items| !items.is_empty());

    let items = match items {
        Some(items) => items,
        None if obj.contains_key("id") => vec![obj.clone()],
        None => Vec::new(),
    };

    (items, next)
}

pub fn snippet_from(obj: &JsonObject) -> Option<String> {
    let raw = first_non_empty_string(obj, keys::SNIPPET)?;
    let folded = raw.replace(['\r', '\n'], " ");
    let folded = folded.trim();
    if folded.is_empty() {
        return None;
    }

    if folded.chars().count() > SNIPPET_MAX_CHARS {
        let cut = folded.chars().take(SNIPPET_MAX_CHARS).collect::<String>();
        return Some(format!("{cut}..."));
    }

    Some(folded.to_string())
}

/// First present non-blank string, or an integral number rendered as digits.
pub fn first_non_empty_string(obj: &JsonObject, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| match obj.get(*key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.clone()),
        Value::Number(number) => Some(
            number
                .as_i64()
                .map(|value| value.to_string())
                .or_else(|| number.as_u64().map(|value| value.to_string()))
                .unwrap_or_else(|| format!("{:.0}", number.as_f64().unwrap_or_default())),
        ),
        _ => None,
    })
}

/// Timestamps stay free-form; only whitespace is trimmed.
pub fn first_timestamp(obj: &JsonObject, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| match obj.get(*key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    })
}

pub fn first_bool(obj: &JsonObject, candidates: &[&str]) -> bool {
    candidates
        .iter()
        .find_map(|key| obj.get(*key).and_then(coerce_bool))
        .unwrap_or(false)
}

pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|value| value != 0.0),
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().expect("json object")
    }

    #[test]
    fn bookmark_title_defaults_to_url() {
        let bookmark = map_bookmark(&object(json!({
            "uid": "abc",
            "link": "https://example.com/post",
            "tags": ["rust", " ", "async"],
            "archived": "yes"
        })));

        assert_eq!(bookmark.id, "abc");
        assert_eq!(bookmark.title, "https://example.com/post");
        assert!(bookmark.is_archived);
        assert_eq!(bookmark.label_names(), vec!["rust", "async"]);
    }

    #[test]
    fn bookmark_fields_prefer_earlier_keys() {
        let bookmark = map_bookmark(&object(json!({
            "id": 42,
            "url": "https://example.com",
            "title": "Example",
            "site": "example.com",
            "site_name": "Example Site",
            "is_archived": false,
            "archived": true,
            "created_at": "  2026-02-01T10:00:00Z ",
            "labels": [{"name": "one", "color": "#fff"}, {"label": "two"}],
            "is_favorite": 1
        })));

        assert_eq!(bookmark.id, "42");
        assert_eq!(bookmark.site_name.as_deref(), Some("Example Site"));
        assert!(!bookmark.is_archived);
        assert!(bookmark.is_favorite);
        assert_eq!(bookmark.created_at.as_deref(), Some("2026-02-01T10:00:00Z"));
        assert_eq!(bookmark.labels[0].color.as_deref(), Some("#fff"));
        assert_eq!(bookmark.label_names(), vec!["one", "two"]);
    }

    #[test]
    fn empty_labels_key_falls_through_to_tags() {
        let bookmark = map_bookmark(&object(json!({
            "id": "1",
            "labels": [],
            "tags": ["fallback"]
        })));
        assert_eq!(bookmark.label_names(), vec!["fallback"]);
    }

    #[test]
    fn unrecognized_bool_token_falls_through() {
        let obj = object(json!({"is_archived": "maybe", "archived": "no"}));
        assert!(!first_bool(&obj, keys::ARCHIVED));
        let obj = object(json!({"is_archived": "maybe", "archived": 2}));
        assert!(first_bool(&obj, keys::ARCHIVED));
    }

    #[test]
    fn highlights_without_identity_are_dropped() {
        let bookmark = map_bookmark(&object(json!({
            "id": "b1",
            "highlights": [
                {"id": "h1", "quote": "kept", "location": {"start": 1}},
                {"text": "dropped"}
            ]
        })));

        assert_eq!(bookmark.highlights.len(), 1);
        assert_eq!(bookmark.highlights[0].text, "kept");
        assert_eq!(bookmark.highlights[0].location, Some(json!({"start": 1})));
    }

    #[test]
    fn list_envelopes_normalize_to_same_items() {
        let (from_results, _) = extract_items_and_cursor(&object(json!({"results": [{"id": "1"}]})));
        let (from_bookmarks, _) =
            extract_items_and_cursor(&object(json!({"bookmarks": [{"id": "1"}]})));

        assert_eq!(from_results.len(), 1);
        assert_eq!(from_results, from_bookmarks);
        assert_eq!(map_bookmark(&from_results[0]).id, "1");
    }

    #[test]
    fn single_object_with_identity_becomes_one_item_list() {
        let (items, next) =
            extract_items_and_cursor(&object(json!({"id": "solo", "next": "c2"})));
        assert_eq!(items.len(), 1);
        assert_eq!(next.as_deref(), Some("c2"));

        let (items, next) = extract_items_and_cursor(&object(json!({"total": 0})));
        assert!(items.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn snippet_is_folded_and_truncated() {
        let long = "x".repeat(300);
        let snippet = snippet_from(&object(json!({"excerpt": long}))).expect("snippet");
        assert_eq!(snippet.chars().count(), SNIPPET_MAX_CHARS + 3);
        assert!(snippet.ends_with("..."));

        let snippet = snippet_from(&object(json!({"summary": "line one\nline two"})));
        assert_eq!(snippet.as_deref(), Some("line one line two"));
    }
}
