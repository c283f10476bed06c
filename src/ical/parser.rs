//! A module to parse iCal feeds with a standards-compliant grammar

use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::event::RawCalendarEvent;

/// Whitespace around line breaks inside a description
static DESCRIPTION_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\r?\n\s+").expect("valid description break regex"));

/// Parse every `VEVENT` of every `VCALENDAR` in `text`.
///
/// An event that cannot be processed is replaced by a [placeholder](RawCalendarEvent::error_placeholder), so that a single
/// broken event does not hide the whole feed. An error is returned only when the grammar rejects the document itself.
pub fn extract(text: &str) -> Result<Vec<RawCalendarEvent>> {
    let reader = ical::IcalParser::new(text.as_bytes());

    let mut events = Vec::new();
    let mut index = 0;
    for calendar in reader {
        let calendar = calendar.map_err(|err| Error::Parse(err.to_string()))?;

        for event in &calendar.events {
            match read_event(event, index) {
                Ok(raw) => events.push(raw),
                Err(err) => {
                    log::error!("Error processing event at index {}: {}", index, err);
                    events.push(RawCalendarEvent::error_placeholder(index));
                },
            }
            index += 1;
        }
    }

    if events.is_empty() {
        log::warn!("No events found in the iCal data");
    } else {
        log::debug!("Found {} events in the iCal data", events.len());
    }
    Ok(events)
}

fn read_event(event: &IcalEvent, index: usize) -> std::result::Result<RawCalendarEvent, String> {
    let props = &event.properties;

    let start = match property_value(props, "DTSTART") {
        None => return Err(String::from("missing DTSTART")),
        Some(s) => s.trim().to_string(),
    };
    if crate::ical::try_parse_ical_date(&start).is_none() {
        return Err(format!("unreadable DTSTART {:?}", start));
    }
    // Without DTEND, the event ends when it starts
    let end = property_value(props, "DTEND")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| start.clone());

    let uid = property_value(props, "UID").map(|s| s.trim().to_string()).unwrap_or_default();
    let id = if uid.is_empty() { format!("event-{}", index) } else { uid.clone() };

    Ok(RawCalendarEvent {
        id,
        uid,
        summary: text_value(props, "SUMMARY"),
        description: tidy_description(&text_value(props, "DESCRIPTION")),
        start,
        end,
        location: text_value(props, "LOCATION"),
        error: false,
    })
}

fn property_value<'a>(props: &'a [Property], name: &str) -> Option<&'a str> {
    props.iter()
        .find(|prop| prop.name.eq_ignore_ascii_case(name))
        .and_then(|prop| prop.value.as_deref())
}

/// The unescaped value of a TEXT property, or an empty string
fn text_value(props: &[Property], name: &str) -> String {
    property_value(props, name)
        .map(|value| crate::ical::unescape_text(value.trim()))
        .unwrap_or_default()
}

/// Collapse the whitespace that surrounds line breaks, so that labelled lines start at the beginning of a line
fn tidy_description(description: &str) -> String {
    DESCRIPTION_BREAK_RE.replace_all(description, "\n").into_owned()
}
