//! Normalization of raw feed text before any line-oriented parsing

use crate::error::{Error, Result};

const BYTE_ORDER_MARK: char = '\u{feff}';

const HTML_MARKERS: [&str; 2] = ["<!doctype html", "<html"];
const CALENDAR_MARKER: &str = "begin:vcalendar";

/// Returns true when the payload looks like an HTML page rather than iCal data.
///
/// Calendars may legitimately carry HTML inside property values (e.g. `X-ALT-DESC;FMTTYPE=text/html`),
/// so a payload is only considered HTML when an HTML marker comes before `BEGIN:VCALENDAR`, or when there is no calendar at all.
pub fn looks_like_html(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    let html_at = HTML_MARKERS.iter()
        .filter_map(|marker| lower.find(marker))
        .min();

    match (html_at, lower.find(CALENDAR_MARKER)) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(html_at), Some(calendar_at)) => html_at < calendar_at,
    }
}

/// Make raw feed text safe for line-oriented parsing.
///
/// In this order:
/// * reject HTML payloads (an authentication wall or a proxy error page) with [`Error::Format`]
/// * remove a leading byte-order mark
/// * unfold continuation lines (RFC 5545 §3.1: a line break followed by a space or a tab is removed)
/// * normalize every remaining line break to `\n`
pub fn preprocess(raw: &str) -> Result<String> {
    if looks_like_html(raw) {
        let excerpt: String = raw.chars().take(200).collect();
        log::error!("Received HTML instead of iCal data. This might be an authentication page or an error page: {}...", excerpt);
        return Err(Error::Format);
    }

    let text = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw);
    Ok(normalize_line_breaks(&unfold(text)))
}

/// Remove every line break (CRLF, LF or CR) that is immediately followed by a space or a tab, along with that whitespace
pub fn unfold(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                let mut line_break = String::from(c);
                if c == '\r' && chars.peek() == Some(&'\n') {
                    line_break.push('\n');
                    chars.next();
                }

                match chars.peek() {
                    Some(' ') | Some('\t') => {
                        // Folded line: drop both the line break and the leading whitespace
                        chars.next();
                    },
                    _ => result.push_str(&line_break),
                }
            },
            other => result.push(other),
        }
    }

    result
}

/// Convert CRLF and lone CR line breaks to LF
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
