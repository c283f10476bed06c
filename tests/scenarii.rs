//! Feeds and a scripted fetcher, shared by the integration tests
#![allow(dead_code)]

use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use week_planner::config::TransportConfig;
use week_planner::store::MemoryStore;
use week_planner::transport::{FetchResponse, Fetcher, TransportResolver};
use week_planner::Provider;

pub const FEED_URL: &str = "https://school.example/planner/sync/ics/abc";

/// A feed as school planners publish it: CRLF line breaks, a BOM, folded lines and labelled descriptions
pub const SCHOOL_FEED: &str = "\u{feff}BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Smartschool//Planner//NL\r\n\
BEGIN:VEVENT\r\n\
UID:0633de27-8c32-42be-bcb8-63bc879c6185\r\n\
DTSTART:20240115T093000Z\r\n\
DTEND:20240115T103000Z\r\n\
SUMMARY:Toets hoofdstuk 3\r\n\
DESCRIPTION:Leerkrachten: J. Doe\\nKlassen en/of leerlingen: 5A\\nVakken: Wis\r\n kunde\\nOpdrachttype: Grote toets\r\n\
LOCATION:Lokaal 12\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:7f2c1d8e-5f4b-4a4e-9d55-2f1d4e0b7a10\r\n\
DTSTART:20240116T080000Z\r\n\
DTEND:20240116T090000Z\r\n\
SUMMARY:Oefeningen p. 42\r\n\
DESCRIPTION:Leerkrachten: A. Peeters\\nVakken:Frans\\nOpdrachttype: Huiswerk\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
DTSTART:20240117T120000Z\r\n\
SUMMARY:Project\r\n\
DESCRIPTION:Vakken: Geschiedenis\\nOpdrachttype: Taak\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Outlook-style exports carry an HTML rendition of the description
pub const FEED_WITH_HTML_DESCRIPTION: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:html-description-1\r\n\
DTSTART:20240118T090000Z\r\n\
DTEND:20240118T100000Z\r\n\
SUMMARY:Spreekbeurt\r\n\
DESCRIPTION:Vakken: Nederlands\\nOpdrachttype: Taak\r\n\
X-ALT-DESC;FMTTYPE=text/html:<!DOCTYPE html><html><body><p>Vakken: Nederlands</p></body></html>\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

pub const HTML_PAGE: &str = "<!DOCTYPE html>\n<html><body>Please log in</body></html>";

/// What the fetcher does for a URL
#[derive(Clone, Debug)]
pub enum Reply {
    /// No response at all (e.g. a network or CORS error)
    Fail(&'static str),
    Respond(u16, &'static str),
}

/// A [`Fetcher`] that replies according to a script, and records every requested URL.
///
/// Rules are matched in order, against the beginning of the requested URL.
/// Unmatched URLs fail.
pub struct ScriptedFetcher {
    rules: Vec<(String, Reply)>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self { rules: Vec::new(), requested: Mutex::new(Vec::new()) }
    }

    /// Always serve `body` for the feed URL
    pub fn serving(body: &'static str) -> Self {
        Self::new().on(FEED_URL, Reply::Respond(200, body))
    }

    pub fn on(mut self, url_prefix: &str, reply: Reply) -> Self {
        self.rules.push((url_prefix.to_string(), reply));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, Box<dyn Error + Send + Sync>> {
        self.requested.lock().unwrap().push(url.to_string());

        let reply = self.rules.iter()
            .find(|(prefix, _)| url.as_str().starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Respond(status, body)) => Ok(FetchResponse::new(status, body)),
            Some(Reply::Fail(msg)) => Err(msg.into()),
            None => Err(format!("no route to {}", url).into()),
        }
    }
}

pub fn feed_url() -> Url {
    Url::parse(FEED_URL).unwrap()
}

/// A provider that reads `feed` directly, with an empty in-memory store
pub fn test_provider(feed: &'static str) -> Provider<ScriptedFetcher, MemoryStore> {
    let resolver = TransportResolver::new(ScriptedFetcher::serving(feed), TransportConfig::direct_only());
    Provider::new(resolver, MemoryStore::new())
}
