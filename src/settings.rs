//! Display preferences and the feed URL, persisted next to the user data
//!
//! Front ends read these on startup. The core pipeline does not depend on them.

use std::collections::BTreeMap;

use csscolorparser::Color;
use url::Url;

use crate::error::{Error, Result};
use crate::store::KeyValueStore;

pub const FEED_URL_KEY: &str = "weekplanner_ical_url";
pub const START_HOUR_KEY: &str = "startHour";
pub const END_HOUR_KEY: &str = "endHour";
pub const TYPE_COLORS_KEY: &str = "typeColors";

pub const DEFAULT_START_HOUR: u32 = 7;
pub const DEFAULT_END_HOUR: u32 = 22;

/// The colour of event types that have no colour of their own
pub const FALLBACK_COLOR: &str = "#2563eb";

/// Colours of the usual event types
pub const DEFAULT_TYPE_COLORS: &[(&str, &str)] = &[
    ("Grote toets", "#dc2626"),
    ("Kleine toets", "#f97316"),
    ("Huiswerk", "#16a34a"),
    ("Taak", "#9333ea"),
    ("task", "#357ae8"),
    ("User Planned", "#0891b2"),
    ("other", "#6b7280"),
];

/// The range of hours shown by the week view
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl Default for HourRange {
    fn default() -> Self {
        Self { start: DEFAULT_START_HOUR, end: DEFAULT_END_HOUR }
    }
}

impl HourRange {
    /// Check that `0 <= start < end <= 24`
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > 23 || end < 1 || end > 24 || start >= end {
            return Err(Error::InvalidSetting(format!("invalid hour range {}-{}", start, end)));
        }
        Ok(Self { start, end })
    }
}


/// Typed access to the preferences of a [`KeyValueStore`]
pub struct Settings<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> Settings<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// The stored feed URL, if any (an invalid stored value is ignored)
    pub fn feed_url(&self) -> Option<Url> {
        let raw = self.read(FEED_URL_KEY)?;
        match Url::parse(raw.trim()) {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("Ignoring invalid stored feed URL {:?}: {}", raw, err);
                None
            },
        }
    }

    pub fn set_feed_url(&mut self, url: &Url) -> Result<()> {
        self.write(FEED_URL_KEY, url.as_str())
    }

    /// The visible hours. Each bound falls back to its default when missing or invalid.
    pub fn hour_range(&self) -> HourRange {
        let start = self.read_hour(START_HOUR_KEY).unwrap_or(DEFAULT_START_HOUR);
        let end = self.read_hour(END_HOUR_KEY).unwrap_or(DEFAULT_END_HOUR);
        HourRange::new(start, end).unwrap_or_else(|_| {
            log::warn!("Ignoring invalid stored hour range {}-{}", start, end);
            HourRange::default()
        })
    }

    pub fn set_hour_range(&mut self, range: HourRange) -> Result<()> {
        let range = HourRange::new(range.start, range.end)?;
        self.write(START_HOUR_KEY, &range.start.to_string())?;
        self.write(END_HOUR_KEY, &range.end.to_string())
    }

    /// The colour of every event type: the default ones, overridden by the stored ones
    pub fn type_colors(&self) -> BTreeMap<String, Color> {
        let mut colors: BTreeMap<String, Color> = DEFAULT_TYPE_COLORS.iter()
            .filter_map(|(event_type, hex)| csscolorparser::parse(hex).ok().map(|c| (event_type.to_string(), c)))
            .collect();

        for (event_type, color) in self.stored_type_colors() {
            match csscolorparser::parse(&color) {
                Ok(c) => { colors.insert(event_type, c); },
                Err(err) => log::warn!("Ignoring invalid colour {:?} for {}: {}", color, event_type, err),
            }
        }
        colors
    }

    /// The colour of an event type
    pub fn color_of(&self, event_type: &str) -> Color {
        match self.type_colors().remove(event_type) {
            Some(color) => color,
            None => csscolorparser::parse(FALLBACK_COLOR).unwrap_or_else(|_| Color::from_rgb_u8(0x25, 0x63, 0xeb)),
        }
    }

    /// Set the colour of an event type. Any CSS colour is accepted, it is stored as a hex string.
    pub fn set_type_color(&mut self, event_type: &str, color: &str) -> Result<()> {
        let parsed = csscolorparser::parse(color)
            .map_err(|err| Error::InvalidSetting(format!("invalid colour {:?}: {}", color, err)))?;

        let mut stored = self.stored_type_colors();
        stored.insert(event_type.to_string(), parsed.to_hex_string());
        let serialized = serde_json::to_string(&stored)
            .map_err(|err| Error::StoreWrite { key: TYPE_COLORS_KEY.to_string(), reason: err.to_string() })?;
        self.write(TYPE_COLORS_KEY, &serialized)
    }

    fn stored_type_colors(&self) -> BTreeMap<String, String> {
        let raw = match self.read(TYPE_COLORS_KEY) {
            None => return BTreeMap::new(),
            Some(raw) => raw,
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!("Ignoring malformed stored type colours: {}", err);
            BTreeMap::new()
        })
    }

    fn read_hour(&self, key: &str) -> Option<u32> {
        self.read(key)?.trim().parse().ok()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Unable to read {} from the store: {}", key, err);
                None
            },
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value)
            .map_err(|err| Error::StoreWrite { key: key.to_string(), reason: err.to_string() })
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_defaults() {
        let mut store = MemoryStore::new();
        let settings = Settings::new(&mut store);
        assert_eq!(settings.feed_url(), None);
        assert_eq!(settings.hour_range(), HourRange { start: 7, end: 22 });
        assert_eq!(settings.color_of("Huiswerk").to_hex_string(), "#16a34a");
        assert_eq!(settings.color_of("Unknown type").to_hex_string(), FALLBACK_COLOR);
    }

    #[test]
    fn test_hour_range() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::new(&mut store);
        settings.set_hour_range(HourRange { start: 8, end: 18 }).unwrap();
        assert_eq!(settings.hour_range(), HourRange { start: 8, end: 18 });

        assert!(matches!(settings.set_hour_range(HourRange { start: 18, end: 8 }), Err(Error::InvalidSetting(_))));
        assert!(HourRange::new(0, 25).is_err());
        drop(settings);

        // Values written by other front ends are plain strings
        store.set(START_HOUR_KEY, "not a number").unwrap();
        assert_eq!(Settings::new(&mut store).hour_range(), HourRange { start: 7, end: 18 });
    }

    #[test]
    fn test_type_colors() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::new(&mut store);
        settings.set_type_color("Huiswerk", "red").unwrap();
        assert_eq!(settings.color_of("Huiswerk").to_hex_string(), "#ff0000");
        assert_eq!(settings.color_of("Taak").to_hex_string(), "#9333ea");

        assert!(settings.set_type_color("Taak", "not a colour").is_err());
        assert_eq!(settings.color_of("Taak").to_hex_string(), "#9333ea");
    }

    #[test]
    fn test_feed_url() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::new(&mut store);
        let url = Url::parse("https://feed.example/cal.ics").unwrap();
        settings.set_feed_url(&url).unwrap();
        assert_eq!(settings.feed_url(), Some(url));
    }
}
