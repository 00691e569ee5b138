//! Client-side date filtering for highlight listings
//!
//! The upstream API cannot filter highlights by creation date, so filtered
//! requests scan upstream pages sequentially and paginate over the matches.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::{
    context::RequestContext,
    errors::ToolError,
    readeck::{
        client::ClientError,
        types::{Highlight, HighlightListResult, HighlightQuery},
        BookmarkProvider,
    },
};

pub const DEFAULT_SCAN_LIMIT: usize = 200;
pub const MAX_SCAN_LIMIT: usize = 500;
const MIN_BATCH_SIZE: usize = 100;

/// Half-open `[start, end)` window over highlight creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightDateFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl HighlightDateFilter {
    /// `date` selects one UTC day; `date_from` / `date_to` bound a range with `date_to` exclusive.
    pub fn parse(
        date: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<Self, ToolError> {
        fn clean(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|value| !value.is_empty())
        }
        let (date, date_from, date_to) = (clean(date), clean(date_from), clean(date_to));

        if date.is_some() && (date_from.is_some() || date_to.is_some()) {
            return Err(ToolError::invalid_input(
                "date cannot be combined with date_from/date_to",
            ));
        }

        if let Some(date) = date {
            let start = parse_iso_date(date)
                .ok_or_else(|| ToolError::invalid_input("date must be YYYY-MM-DD"))?;
            return Ok(Self {
                start: Some(start),
                end: Some(start + chrono::Duration::days(1)),
            });
        }

        let start = date_from
            .map(|raw| {
                parse_iso_date(raw)
                    .ok_or_else(|| ToolError::invalid_input("date_from must be YYYY-MM-DD"))
            })
            .transpose()?;
        let end = date_to
            .map(|raw| {
                parse_iso_date(raw)
                    .ok_or_else(|| ToolError::invalid_input("date_to must be YYYY-MM-DD"))
            })
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Err(ToolError::invalid_input("date_from must be before date_to"));
            }
        }

        Ok(Self { start, end })
    }

    pub fn is_enabled(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn matches(&self, highlight: &Highlight) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let Some(created_at) = highlight
            .created_at
            .as_deref()
            .and_then(parse_highlight_timestamp)
        else {
            return false;
        };

        self.start.map_or(true, |start| created_at >= start)
            && self.end.map_or(true, |end| created_at < end)
    }
}

fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// RFC 3339 first, then `YYYY-MM-DD HH:MM:SS` and bare dates, both read as UTC.
pub fn parse_highlight_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&parsed));
    }
    parse_iso_date(raw)
}

/// Lists highlights, scanning upstream pages when a date filter is active.
pub async fn list_highlights(
    provider: &dyn BookmarkProvider,
    ctx: &RequestContext,
    bookmark_id: Option<&str>,
    limit: Option<usize>,
    offset: usize,
    filter: HighlightDateFilter,
) -> Result<HighlightListResult, ClientError> {
    if !filter.is_enabled() {
        let query = HighlightQuery {
            bookmark_id: bookmark_id.map(str::to_string),
            limit,
            offset,
        };
        return provider.list_highlights(ctx, &query).await;
    }

    let limit = limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_SCAN_LIMIT)
        .min(MAX_SCAN_LIMIT);
    let batch_size = limit.clamp(MIN_BATCH_SIZE, MAX_SCAN_LIMIT);

    let mut scan_offset = 0;
    let mut matched_seen = 0;
    let mut out = Vec::with_capacity(limit);
    let mut has_more = false;
    let mut pages = 0;

    'scan: loop {
        let query = HighlightQuery {
            bookmark_id: bookmark_id.map(str::to_string),
            limit: Some(batch_size),
            offset: scan_offset,
        };
        let page = provider.list_highlights(ctx, &query).await?;
        pages += 1;
        if page.highlights.is_empty() {
            break;
        }

        let page_len = page.highlights.len();
        for highlight in page.highlights {
            if !filter.matches(&highlight) {
                continue;
            }
            if matched_seen < offset {
                matched_seen += 1;
                continue;
            }
            if out.len() >= limit {
                has_more = true;
                break 'scan;
            }
            out.push(highlight);
            matched_seen += 1;
        }

        let next_offset = match page
            .next_cursor
            .as_deref()
            .and_then(|cursor| cursor.trim().parse::<usize>().ok())
        {
            Some(next) => next,
            None if page_len < batch_size => break,
            None => scan_offset + page_len,
        };
        if next_offset <= scan_offset {
            break;
        }
        scan_offset = next_offset;
    }

    debug!(
        request_id = %ctx.request_id,
        pages,
        matched = out.len(),
        has_more,
        "highlight date scan finished"
    );

    let next_cursor = has_more.then(|| (offset + out.len()).to_string());
    Ok(HighlightListResult {
        highlights: out,
        next_cursor,
    })
}
