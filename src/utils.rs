//! Some utility functions

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;

use crate::item::UnifiedEvent;

/// Prefix of the ids of user-created tasks
pub const TASK_ID_PREFIX: &str = "id-";
const TASK_ID_SUFFIX_LEN: usize = 9;
const TASK_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new task id: a fixed prefix, followed by random lowercase alphanumeric characters.
///
/// This is not guaranteed to be collision-free, but collisions are very unlikely for a personal task list.
pub fn random_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..TASK_ID_SUFFIX_LEN)
        .map(|_| TASK_ID_ALPHABET[rng.random_range(0..TASK_ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", TASK_ID_PREFIX, suffix)
}

/// The current time, truncated to the millisecond precision timestamps are stored with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}


/// (De)serialize instants as ISO-8601 strings with milliseconds, e.g. `2024-01-15T09:30:00.000Z`
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&crate::ical::to_iso_string(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional instants (`null` when absent)
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match dt {
                Some(dt) => serializer.serialize_str(&crate::ical::to_iso_string(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(s) => DateTime::parse_from_rfc3339(&s)
                    .map(|dt| Some(dt.with_timezone(&Utc)))
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

/// Deserialize an `Option<Option<T>>`, so that a missing field is `None` (requires `#[serde(default)]`) and an explicit `null` is `Some(None)`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}


/// A debug utility that pretty-prints a unified event list
pub fn print_unified_list(events: &[UnifiedEvent]) {
    for event in events {
        print_event(event);
    }
}

pub fn print_event(event: &UnifiedEvent) {
    let provenance = if event.is_imported() { "feed" } else { "task" };
    let event_type = if event.event_type().is_empty() { "-" } else { event.event_type() };
    println!("    [{}] {} -> {}\t{}\t({})\t{}",
        provenance,
        crate::ical::to_iso_string(event.start()),
        crate::ical::to_iso_string(event.end()),
        event.summary(),
        event_type,
        event.id(),
    );
}
