//! Conversion of iCal timestamps to instants

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Parse an iCal date or date-time.
///
/// * `YYYYMMDDThhmmssZ` is a UTC date-time
/// * `YYYYMMDDThhmmss` is a date-time in the local time zone
/// * anything else goes through a more generic parsing (RFC 3339, `YYYY-MM-DD`, `YYYYMMDD` as local midnight)
///
/// Empty and unparsable values fall back to the current time.
pub fn parse_ical_date(value: &str) -> DateTime<Utc> {
    let value = value.trim();
    if value.is_empty() {
        return Utc::now();
    }

    match try_parse_ical_date(value) {
        Some(dt) => dt,
        None => {
            log::warn!("Unable to parse iCal date {:?}, using the current time", value);
            Utc::now()
        },
    }
}

/// Same as [`parse_ical_date`], but returns `None` instead of falling back to the current time
pub fn try_parse_ical_date(value: &str) -> Option<DateTime<Utc>> {
    if is_compact(value, true) {
        let naive = NaiveDateTime::parse_from_str(&value[..15], COMPACT_FORMAT).ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    if is_compact(value, false) {
        let naive = NaiveDateTime::parse_from_str(value, COMPACT_FORMAT).ok()?;
        return local_to_utc(&naive);
    }

    parse_generic(value)
}

/// Whether `value` is `YYYYMMDDThhmmss`, followed by a `Z` when `utc` is set
fn is_compact(value: &str, utc: bool) -> bool {
    let bytes = value.as_bytes();
    let expected_len = if utc { 16 } else { 15 };
    if bytes.len() != expected_len {
        return false;
    }
    if utc && bytes[15] != b'Z' {
        return false;
    }

    bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'T'
        && bytes[9..15].iter().all(u8::is_ascii_digit)
}

fn parse_generic(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return local_to_utc(&naive);
        }
    }

    // All-day values (`DTSTART;VALUE=DATE:20240115`) start at local midnight
    for format in &["%Y%m%d", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return local_to_utc(&date.and_hms_opt(0, 0, 0)?);
        }
    }

    None
}

fn local_to_utc(naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    // Ambiguous local times (when clocks go back) resolve to the earliest instant
    Local.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format an instant as an ISO-8601 string with milliseconds, e.g. `2024-01-15T09:30:00.000Z`
pub fn to_iso_string(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Format an instant as an iCal UTC date-time, e.g. `20240115T093000Z`
pub fn format_ical_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
