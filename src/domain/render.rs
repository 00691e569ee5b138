//! Markdown and plain-text renderings of bookmarks and highlights.

use std::sync::OnceLock;

use regex::Regex;

use crate::readeck::types::{Bookmark, Highlight};

const TEXT_WIDTH: usize = 10_000;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

/// YAML front matter followed by the article body and, optionally, its highlights.
pub fn bookmark_markdown(bookmark: &Bookmark, include_highlights: bool) -> String {
    let mut out = String::from("---\n");
    let fields = [
        ("title", Some(bookmark.title.as_str())),
        ("url", Some(bookmark.url.as_str())),
        ("author", bookmark.author.as_deref()),
        ("site_name", bookmark.site_name.as_deref()),
        ("published_at", bookmark.published_at.as_deref()),
        ("created_at", bookmark.created_at.as_deref()),
        ("updated_at", bookmark.updated_at.as_deref()),
        ("readeck_id", Some(bookmark.id.as_str())),
    ];
    for (key, value) in fields {
        out.push_str(&format!("{key}: {}\n", quote_yaml(value.unwrap_or_default())));
    }
    out.push_str(&format!("archived: {}\n", bookmark.is_archived));

    let labels = bookmark.label_names();
    if labels.is_empty() {
        out.push_str("labels: []\n");
    } else {
        out.push_str("labels:\n");
        for label in &labels {
            out.push_str(&format!("  - {}\n", quote_yaml(label)));
        }
    }
    out.push_str("---\n\n");

    let text = bookmark_text(bookmark);
    if text.is_empty() {
        out.push_str("(content unavailable)");
    } else {
        out.push_str(&text);
    }
    out.push('\n');

    if include_highlights && !bookmark.highlights.is_empty() {
        out.push_str("\n## Highlights\n\n");
        out.push_str(&highlights_markdown(&bookmark.highlights));
    }

    out
}

/// Plain article text: stored text wins over converted HTML.
pub fn bookmark_text(bookmark: &Bookmark) -> String {
    if let Some(text) = bookmark
        .content_text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
    {
        return normalize_whitespace(text);
    }

    bookmark
        .content_html
        .as_deref()
        .filter(|html| !html.trim().is_empty())
        .map(html_to_text)
        .unwrap_or_default()
}

/// Quote blocks with note and id lines; highlights without text are skipped.
pub fn highlights_markdown(highlights: &[Highlight]) -> String {
    highlights
        .iter()
        .filter(|highlight| !highlight.text.trim().is_empty())
        .map(|highlight| {
            let mut block = format!("> {}\n", highlight.text.trim());
            if let Some(note) = highlight
                .note
                .as_deref()
                .map(str::trim)
                .filter(|note| !note.is_empty())
            {
                block.push_str(&format!("- Note: {note}\n"));
            }
            block.push_str(&format!("- Highlight ID: `{}`\n", highlight.id));
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .unwrap_or_else(|_| html_tag().replace_all(html, " ").into_owned());
    normalize_whitespace(&text)
}

/// Collapses runs of whitespace within lines while keeping line structure.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.trim().replace("\r\n", "\n").replace('\r', "\n");
    text.lines()
        .map(|line| whitespace_run().replace_all(line.trim(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn quote_yaml(value: &str) -> String {
    let flattened = value.replace('\n', " ");
    serde_json::to_string(flattened.trim()).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readeck::types::Label;

    fn sample() -> Bookmark {
        Bookmark {
            id: "b1".to_string(),
            url: "https://example.com/post".to_string(),
            title: "A \"quoted\" title".to_string(),
            author: Some("Ada Lovelace".to_string()),
            is_archived: true,
            labels: vec![
                Label {
                    name: "rust".to_string(),
                    ..Label::default()
                },
                Label {
                    name: " ".to_string(),
                    ..Label::default()
                },
            ],
            content_text: Some("  First   line \r\n\r\n second\tline  ".to_string()),
            ..Bookmark::default()
        }
    }

    #[test]
    fn markdown_has_front_matter_and_body() {
        let markdown = bookmark_markdown(&sample(), false);

        assert!(markdown.starts_with("---\ntitle: \"A \\\"quoted\\\" title\"\n"));
        assert!(markdown.contains("author: \"Ada Lovelace\"\n"));
        assert!(markdown.contains("site_name: \"\"\n"));
        assert!(markdown.contains("readeck_id: \"b1\"\n"));
        assert!(markdown.contains("archived: true\n"));
        assert!(markdown.contains("labels:\n  - \"rust\"\n---\n\n"));
        assert!(markdown.ends_with("First line\n\nsecond line\n"));
    }

    #[test]
    fn markdown_marks_missing_content() {
        let bookmark = Bookmark {
            id: "b2".to_string(),
            ..Bookmark::default()
        };
        let markdown = bookmark_markdown(&bookmark, true);
        assert!(markdown.contains("labels: []\n"));
        assert!(markdown.ends_with("(content unavailable)\n"));
    }

    #[test]
    fn markdown_appends_highlights_when_requested() {
        let mut bookmark = sample();
        bookmark.highlights = vec![Highlight {
            id: "h1".to_string(),
            text: "Important bit".to_string(),
            ..Highlight::default()
        }];

        assert!(!bookmark_markdown(&bookmark, false).contains("## Highlights"));
        assert!(bookmark_markdown(&bookmark, true)
            .ends_with("## Highlights\n\n> Important bit\n- Highlight ID: `h1`\n"));
    }

    #[test]
    fn text_falls_back_to_html_conversion() {
        let bookmark = Bookmark {
            content_html: Some("<p>Hello <b>world</b></p>".to_string()),
            ..Bookmark::default()
        };
        let text = bookmark_text(&bookmark);
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn highlights_markdown_skips_blank_and_includes_notes() {
        let highlights = vec![
            Highlight {
                id: "h1".to_string(),
                text: " first ".to_string(),
                note: Some("remember".to_string()),
                ..Highlight::default()
            },
            Highlight {
                id: "h2".to_string(),
                text: "   ".to_string(),
                ..Highlight::default()
            },
            Highlight {
                id: "h3".to_string(),
                text: "second".to_string(),
                ..Highlight::default()
            },
        ];

        assert_eq!(
            highlights_markdown(&highlights),
            "> first\n- Note: remember\n- Highlight ID: `h1`\n\n> second\n- Highlight ID: `h3`\n"
        );
    }
}
