//! Citation rendering for bookmarks in common reference styles.

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::readeck::types::{Bookmark, Highlight};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CitationStyle {
    #[serde(rename = "apa")]
    Apa,
    #[serde(rename = "mla")]
    Mla,
    #[serde(rename = "chicago")]
    Chicago,
    #[serde(rename = "bibtex")]
    Bibtex,
    #[serde(rename = "csl-json")]
    CslJson,
    #[default]
    #[serde(rename = "markdown")]
    Markdown,
}

impl FromStr for CitationStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "markdown" => Ok(Self::Markdown),
            "apa" => Ok(Self::Apa),
            "mla" => Ok(Self::Mla),
            "chicago" => Ok(Self::Chicago),
            "bibtex" => Ok(Self::Bibtex),
            "csl-json" | "csl_json" | "csljson" => Ok(Self::CslJson),
            _ => Err(
                "style must be one of: apa, mla, chicago, bibtex, csl-json, markdown".to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub url: String,
    pub accessed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub style: CitationStyle,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csl_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bibtex: Option<String>,
    pub metadata: CitationMetadata,
}

pub fn generate(
    bookmark: &Bookmark,
    highlight: Option<&Highlight>,
    quote: Option<&str>,
    style: CitationStyle,
    accessed_at: DateTime<Utc>,
) -> Citation {
    let metadata = CitationMetadata {
        title: title_of(bookmark),
        author: non_blank(bookmark.author.as_deref()),
        site_name: non_blank(bookmark.site_name.as_deref()),
        published_at: non_blank(bookmark.published_at.as_deref()),
        url: bookmark.url.clone(),
        accessed_at: accessed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    let mut citation = Citation {
        style,
        text: String::new(),
        csl_json: None,
        bibtex: None,
        metadata,
    };

    match style {
        CitationStyle::CslJson => {
            let csl = csl_json(bookmark, accessed_at);
            citation.text = serde_json::to_string_pretty(&csl).unwrap_or_else(|_| "{}".to_string());
            citation.csl_json = Some(csl);
        }
        CitationStyle::Bibtex => {
            let bib = bibtex(bookmark, accessed_at);
            citation.text = bib.clone();
            citation.bibtex = Some(bib);
        }
        CitationStyle::Apa => citation.text = apa(bookmark, accessed_at),
        CitationStyle::Mla => citation.text = mla(bookmark, accessed_at),
        CitationStyle::Chicago => citation.text = chicago(bookmark, accessed_at),
        CitationStyle::Markdown => citation.text = markdown(bookmark, highlight, quote, accessed_at),
    }

    citation
}

fn markdown(
    bookmark: &Bookmark,
    highlight: Option<&Highlight>,
    quote: Option<&str>,
    accessed_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    if let Some(author) = author_or_site(bookmark) {
        out.push_str(&format!("{author}. "));
    }
    out.push_str(&format!("[{}]({})", title_of(bookmark), bookmark.url));
    out.push_str(&format!(" ({})", published_or_nd(bookmark)));
    out.push_str(&format!(". Accessed {}.\n\n{}\n", accessed_at.format("%Y-%m-%d"), bookmark.url));

    let selected = quote
        .map(str::trim)
        .filter(|quote| !quote.is_empty())
        .or_else(|| {
            highlight
                .map(|highlight| highlight.text.trim())
                .filter(|text| !text.is_empty())
        });
    if let Some(selected) = selected {
        out.push_str(&format!("\n> {selected}\n"));
    }

    out
}

fn apa(bookmark: &Bookmark, accessed_at: DateTime<Utc>) -> String {
    let title = title_of(bookmark);
    let date = published_or_nd(bookmark);
    match author_or_site(bookmark) {
        Some(author) => format!("{author}. ({date}). {title}. {}", bookmark.url),
        None => format!(
            "{title}. ({date}). Retrieved {}, from {}",
            accessed_at.format("%Y-%m-%d"),
            bookmark.url
        ),
    }
}

fn mla(bookmark: &Bookmark, accessed_at: DateTime<Utc>) -> String {
    let title = title_of(bookmark);
    let site = non_blank(bookmark.site_name.as_deref()).unwrap_or_default();
    let date = published_or_nd(bookmark);
    let accessed = accessed_at.format("%-d %b %Y");
    match author_or_site(bookmark) {
        Some(author) => format!(
            "{author}. \"{title}.\" {site}, {date}, {}. Accessed {accessed}.",
            bookmark.url
        ),
        None => format!("\"{title}.\" {site}, {date}, {}. Accessed {accessed}.", bookmark.url),
    }
}

fn chicago(bookmark: &Bookmark, accessed_at: DateTime<Utc>) -> String {
    let title = title_of(bookmark);
    let date = published_or_nd(bookmark);
    let accessed = accessed_at.format("%B %-d, %Y");
    match author_or_site(bookmark) {
        Some(author) => format!(
            "{author}. \"{title}.\" {date}. Accessed {accessed}. {}.",
            bookmark.url
        ),
        None => format!("\"{title}.\" Accessed {accessed}. {}.", bookmark.url),
    }
}

fn csl_json(bookmark: &Bookmark, accessed_at: DateTime<Utc>) -> Value {
    let mut csl = Map::new();
    csl.insert("type".to_string(), json!("webpage"));
    csl.insert("title".to_string(), json!(title_of(bookmark)));
    csl.insert("URL".to_string(), json!(bookmark.url));
    csl.insert("accessed".to_string(), date_parts(accessed_at));

    if let Some(author) = non_blank(bookmark.author.as_deref()) {
        csl.insert("author".to_string(), json!([csl_name(&author)]));
    } else if let Some(site) = non_blank(bookmark.site_name.as_deref()) {
        csl.insert("author".to_string(), json!([{ "literal": site }]));
    }
    if let Some(issued) = bookmark.published_at.as_deref().and_then(parse_date) {
        csl.insert("issued".to_string(), date_parts(issued));
    }

    Value::Object(csl)
}

fn bibtex(bookmark: &Bookmark, accessed_at: DateTime<Utc>) -> String {
    let year = bookmark
        .published_at
        .as_deref()
        .and_then(parse_date)
        .map(|date| date.year().to_string());

    let key_base = non_blank(bookmark.site_name.as_deref())
        .unwrap_or_else(|| "source".to_string())
        .to_lowercase()
        .replace(' ', "");
    let digest = format!("{:x}", Sha256::digest(bookmark.url.as_bytes()));
    let key = format!(
        "{key_base}{}{}",
        year.as_deref().unwrap_or("n.d."),
        &digest[..6]
    );

    let mut out = format!("@online{{{key},\n");
    out.push_str(&format!("  title = {{{}}},\n", escape_bibtex(&title_of(bookmark))));
    if let Some(author) = non_blank(bookmark.author.as_deref()) {
        out.push_str(&format!("  author = {{{}}},\n", escape_bibtex(&author)));
    }
    if let Some(year) = &year {
        out.push_str(&format!("  year = {{{year}}},\n"));
    }
    out.push_str(&format!("  url = {{{}}},\n", escape_bibtex(&bookmark.url)));
    out.push_str(&format!("  urldate = {{{}}},\n", accessed_at.format("%Y-%m-%d")));
    out.push_str("}\n");
    out
}

/// Splits "Given Names Family" into CSL name parts; one word stays literal.
fn csl_name(author: &str) -> Value {
    let parts = author.split_whitespace().collect::<Vec<_>>();
    match parts.as_slice() {
        [] => json!({ "literal": "" }),
        [single] => json!({ "literal": single }),
        [given @ .., family] => json!({ "given": given.join(" "), "family": family }),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn date_parts(date: DateTime<Utc>) -> Value {
    json!({ "date-parts": [[date.year(), date.month(), date.day()]] })
}

fn title_of(bookmark: &Bookmark) -> String {
    non_blank(Some(bookmark.title.as_str())).unwrap_or_else(|| bookmark.url.trim().to_string())
}

fn author_or_site(bookmark: &Bookmark) -> Option<String> {
    non_blank(bookmark.author.as_deref()).or_else(|| non_blank(bookmark.site_name.as_deref()))
}

fn published_or_nd(bookmark: &Bookmark) -> String {
    non_blank(bookmark.published_at.as_deref()).unwrap_or_else(|| "n.d.".to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn escape_bibtex(value: &str) -> String {
    value.replace('{', "\\{").replace('}', "\\}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accessed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).single().expect("valid date")
    }

    fn article() -> Bookmark {
        Bookmark {
            id: "b1".to_string(),
            url: "https://blog.example.com/post".to_string(),
            title: "Ownership {Explained}".to_string(),
            author: Some("Grace Brewster Hopper".to_string()),
            site_name: Some("Example Blog".to_string()),
            published_at: Some("2024-05-01T08:00:00Z".to_string()),
            ..Bookmark::default()
        }
    }

    #[test]
    fn apa_uses_author_or_falls_back_to_retrieval_form() {
        let text = generate(&article(), None, None, CitationStyle::Apa, accessed()).text;
        assert_eq!(
            text,
            "Grace Brewster Hopper. (2024-05-01T08:00:00Z). Ownership {Explained}. https://blog.example.com/post"
        );

        let anonymous = Bookmark {
            url: "https://x.example".to_string(),
            ..Bookmark::default()
        };
        let text = generate(&anonymous, None, None, CitationStyle::Apa, accessed()).text;
        assert_eq!(
            text,
            "https://x.example. (n.d.). Retrieved 2026-03-07, from https://x.example"
        );
    }

    #[test]
    fn mla_and_chicago_fall_back_to_site_name() {
        let mut bookmark = article();
        bookmark.author = None;
        bookmark.published_at = None;

        let mla = generate(&bookmark, None, None, CitationStyle::Mla, accessed()).text;
        assert_eq!(
            mla,
            "Example Blog. \"Ownership {Explained}.\" Example Blog, n.d., https://blog.example.com/post. Accessed 7 Mar 2026."
        );

        let chicago = generate(&bookmark, None, None, CitationStyle::Chicago, accessed()).text;
        assert_eq!(
            chicago,
            "Example Blog. \"Ownership {Explained}.\" n.d.. Accessed March 7, 2026. https://blog.example.com/post."
        );
    }

    #[test]
    fn bibtex_key_is_stable_and_braces_escaped() {
        let first = generate(&article(), None, None, CitationStyle::Bibtex, accessed());
        let second = generate(&article(), None, None, CitationStyle::Bibtex, accessed());
        assert_eq!(first.bibtex, second.bibtex);

        let bib = first.bibtex.expect("bibtex present");
        assert!(bib.starts_with("@online{exampleblog2024"));
        assert!(bib.contains("  title = {Ownership \\{Explained\\}},\n"));
        assert!(bib.contains("  year = {2024},\n"));
        assert!(bib.contains("  urldate = {2026-03-07},\n"));
        assert!(bib.ends_with("}\n"));
        assert_eq!(first.text, bib);
    }

    #[test]
    fn csl_json_splits_author_and_dates() {
        let citation = generate(&article(), None, None, CitationStyle::CslJson, accessed());
        let csl = citation.csl_json.expect("csl present");

        assert_eq!(csl["type"], json!("webpage"));
        assert_eq!(
            csl["author"],
            json!([{ "given": "Grace Brewster", "family": "Hopper" }])
        );
        assert_eq!(csl["issued"], json!({ "date-parts": [[2024, 5, 1]] }));
        assert_eq!(csl["accessed"], json!({ "date-parts": [[2026, 3, 7]] }));
        assert_eq!(serde_json::from_str::<Value>(&citation.text).expect("json text"), csl);
    }

    #[test]
    fn markdown_prefers_explicit_quote_over_highlight() {
        let highlight = Highlight {
            id: "h1".to_string(),
            text: "from highlight".to_string(),
            ..Highlight::default()
        };

        let with_highlight =
            generate(&article(), Some(&highlight), None, CitationStyle::Markdown, accessed()).text;
        assert!(with_highlight.ends_with("\n> from highlight\n"));

        let with_quote = generate(
            &article(),
            Some(&highlight),
            Some("  explicit quote "),
            CitationStyle::Markdown,
            accessed(),
        )
        .text;
        assert!(with_quote.starts_with(
            "Grace Brewster Hopper. [Ownership {Explained}](https://blog.example.com/post) (2024-05-01T08:00:00Z). Accessed 2026-03-07.\n\n"
        ));
        assert!(with_quote.ends_with("\n> explicit quote\n"));
    }

    #[test]
    fn style_parsing() {
        assert_eq!("".parse::<CitationStyle>(), Ok(CitationStyle::Markdown));
        assert_eq!("CSL-JSON".parse::<CitationStyle>(), Ok(CitationStyle::CslJson));
        assert_eq!("bibtex".parse::<CitationStyle>(), Ok(CitationStyle::Bibtex));
        assert!("harvard".parse::<CitationStyle>().is_err());
    }
}
