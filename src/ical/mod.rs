//! This module handles conversion between iCal feeds and internal representations
//!
//! Feeds met in the wild are not always conformant, so parsing is a chain of two strategies:
//! a tolerant [line-based extraction](manual) is tried first, and a [standards-compliant grammar](parser) is used when it finds nothing.
//! Exporting user tasks as iCal is done by the [`builder`].

pub mod preprocess;
pub mod manual;
pub mod parser;
mod date;
pub use date::{parse_ical_date, try_parse_ical_date, to_iso_string, format_ical_date};
pub mod builder;
pub use builder::build_from;

use url::Url;

use crate::config::{ORG_NAME, PRODUCT_NAME};
use crate::description;
use crate::error::Result;
use crate::event::{ParsedEvent, RawCalendarEvent};
use crate::transport::{Fetcher, TransportResolver};

pub fn default_prod_id() -> String {
    format!("-//{}//{}//EN", ORG_NAME, PRODUCT_NAME)
}

/// Fetch a feed, and turn it into events with their description metadata
pub async fn parse_ical_feed<F: Fetcher>(resolver: &TransportResolver<F>, url: &Url) -> Result<Vec<ParsedEvent>> {
    let raw = resolver.fetch_text(url).await?;
    log::trace!("Raw iCal data: {}", raw);
    parse_ical_text(&raw)
}

/// Same as [`parse_ical_feed`], for text that has already been retrieved
pub fn parse_ical_text(raw: &str) -> Result<Vec<ParsedEvent>> {
    let text = preprocess::preprocess(raw)?;
    let events = extract_events(&text)?;

    Ok(events.into_iter()
        .map(|raw_event| {
            let fields = description::mine(&raw_event.description);
            ParsedEvent::new(raw_event, fields)
        })
        .collect())
}

/// Run the extraction strategies on preprocessed text. The first one that finds events wins.
pub fn extract_events(text: &str) -> Result<Vec<RawCalendarEvent>> {
    match manual::extract(text) {
        Some(events) if events.is_empty() == false => {
            log::info!("Successfully parsed {} events manually", events.len());
            return Ok(events);
        },
        _ => log::debug!("Manual extraction found no events, using the iCal grammar"),
    }

    parser::extract(text)
}

/// Resolve the backslash escapes of an iCal TEXT value (`\n`, `\N`, `\,`, `\;`, `\\` and `\"`).
/// Unknown escapes are kept as they are.
pub fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => result.push('\n'),
            Some(escaped @ ',') | Some(escaped @ ';') | Some(escaped @ '\\') | Some(escaped @ '"') => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            },
            None => result.push('\\'),
        }
    }

    result
}
