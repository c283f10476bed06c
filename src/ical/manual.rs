//! A tolerant, line-based extraction of `VEVENT` blocks
//!
//! Some feeds put unescaped characters in their `DESCRIPTION` values, that strict parsers choke on.
//! This strategy splits the text on event markers and reads every property by name instead.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::event::RawCalendarEvent;

/// A line that starts a new property (or a `BEGIN:`/`END:` marker)
static PROPERTY_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9-]*[;:]").expect("valid property line regex"));

/// Folds that survived preprocessing (e.g. when this strategy is fed raw text)
static RESIDUAL_FOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n[ \t]+").expect("valid fold regex"));

/// Extract every `VEVENT` block of a calendar.
///
/// Returns `None` when the text is not a calendar at all. Blocks that miss their `END:VEVENT` marker are skipped.
pub fn extract(text: &str) -> Option<Vec<RawCalendarEvent>> {
    if text.contains("BEGIN:VCALENDAR") == false {
        log::debug!("No BEGIN:VCALENDAR marker, skipping manual extraction");
        return None;
    }

    let blocks: Vec<&str> = text.split("BEGIN:VEVENT").collect();
    log::debug!("Found {} event blocks using string splitting", blocks.len() - 1);

    let mut events = Vec::new();
    // The first block is whatever comes before the first event
    for (index, block) in blocks.iter().enumerate().skip(1) {
        let event_data = match block.find("END:VEVENT") {
            Some(end) => &block[..end],
            None => {
                log::warn!("Event block {} has no END:VEVENT marker, ignoring it", index);
                continue;
            },
        };

        let uid = extract_property(event_data, "UID");
        let id = if uid.is_empty() { format!("manual-event-{}", index) } else { uid.clone() };

        events.push(RawCalendarEvent {
            id,
            uid,
            summary: extract_property(event_data, "SUMMARY"),
            description: extract_property(event_data, "DESCRIPTION"),
            start: extract_property(event_data, "DTSTART"),
            end: extract_property(event_data, "DTEND"),
            location: extract_property(event_data, "LOCATION"),
            error: false,
        });
    }

    Some(events)
}

/// Read the value of a property in the text of an event.
///
/// The property line is `NAME`, optional `;`-separated parameters, a colon, then the value.
/// The value goes on over the following lines until the next property line.
/// Returns an empty string when the property is missing.
pub fn extract_property(event_data: &str, name: &str) -> String {
    let mut lines = event_data.split('\n').peekable();

    while let Some(line) = lines.next() {
        let first_line = match value_of(line.trim_end_matches('\r'), name) {
            None => continue,
            Some(v) => v,
        };

        let mut value = String::from(first_line);
        while let Some(next) = lines.peek() {
            if PROPERTY_LINE_RE.is_match(next) {
                break;
            }
            value.push('\n');
            value.push_str(next.trim_end_matches('\r'));
            lines.next();
        }

        let unfolded = RESIDUAL_FOLD_RE.replace_all(value.trim(), "");
        return super::unescape_text(&unfolded);
    }

    log::trace!("{} not found in event data", name);
    String::new()
}

/// Returns the value part of `line` if it is a `name` property line
fn value_of<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if let Some(value) = rest.strip_prefix(':') {
        return Some(value);
    }
    if rest.starts_with(';') {
        // Skip the parameters, e.g. `DTSTART;TZID=Europe/Brussels:20240115T093000`
        return rest.find(':').map(|colon| &rest[colon + 1..]);
    }
    None
}
