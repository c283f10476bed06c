//! Calendar events, as read from an iCal feed

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::description::DescriptionFields;
use crate::utils::iso_millis;

/// An event, as extracted from a `VEVENT` block. Values are still raw text (dates are ICS timestamps).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawCalendarEvent {
    /// The UID of the event, or a positional placeholder chosen by the extraction strategy when the feed omits it
    pub id: String,
    /// The `UID` property (empty when absent)
    pub uid: String,
    pub summary: String,
    pub description: String,
    /// The `DTSTART` value, e.g. `20240115T093000Z`
    pub start: String,
    /// The `DTEND` value
    pub end: String,
    pub location: String,
    /// Set on placeholders that replace an event that could not be processed
    pub error: bool,
}

impl RawCalendarEvent {
    /// The placeholder that replaces the `index`-th event when it cannot be processed
    pub fn error_placeholder(index: usize) -> Self {
        Self {
            id: format!("error-event-{}", index),
            summary: String::from("Error parsing event"),
            description: String::from("There was an error parsing this event"),
            error: true,
            ..Self::default()
        }
    }
}


/// An event of the feed, with normalized dates and the metadata mined from its description
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedEvent {
    pub id: String,
    pub summary: String,
    pub description: String,
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
    pub teacher: String,
    pub class: String,
    pub subject: String,
    /// The assignment type (e.g. `Huiswerk`, `Grote toets`)
    #[serde(rename = "type")]
    pub event_type: String,
    pub location: String,
    /// Whether this is a placeholder for an event that could not be parsed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ParsedEvent {
    /// Normalize the dates of a raw event and attach its description metadata
    pub fn new(raw: RawCalendarEvent, fields: DescriptionFields) -> Self {
        let start = crate::ical::parse_ical_date(&raw.start);
        // Without an end, the event ends when it starts
        let end = if raw.end.trim().is_empty() { start } else { crate::ical::parse_ical_date(&raw.end) };
        Self {
            id: raw.id,
            summary: raw.summary,
            description: raw.description,
            start,
            end,
            teacher: fields.teacher,
            class: fields.class,
            subject: fields.subject,
            event_type: fields.assignment_type,
            location: raw.location,
            error: raw.error,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn is_error(&self) -> bool { self.error }
}
