//! Errors surfaced by this crate
//!
//! Failures that can be recovered locally (a single unparsable event or stored task, a malformed task store) never show up here:
//! they are logged and replaced by placeholder or default data.

use thiserror::Error;

/// Errors that can occur while loading a feed or mutating the task store
#[derive(Error, Debug)]
pub enum Error {
    /// Every fetch strategy (direct request, then every proxy) failed
    #[error("All fetch attempts failed for {url}. Consider setting up a local proxy server. Last error: {last_error}")]
    Transport { url: String, last_error: String },

    /// The payload is not iCal data (usually an authentication wall or a proxy error page)
    #[error("Received HTML instead of iCal data")]
    Format,

    /// The iCal grammar rejected the whole document
    #[error("Failed to parse iCal data: {0}")]
    Parse(String),

    /// The stored user data cannot be read, or is not shaped as expected. It is left untouched.
    #[error("Unable to read key `{key}` from the store: {reason}")]
    StoreRead { key: String, reason: String },

    /// The key-value store refused a write. The previous value is still in place.
    #[error("Unable to write key `{key}` to the store: {reason}")]
    StoreWrite { key: String, reason: String },

    /// An imported backup is not well-formed JSON
    #[error("Invalid JSON: {0}")]
    Import(String),

    /// A preference value was rejected
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error aborts a feed load (as opposed to a store-related error)
    pub fn is_load_failure(&self) -> bool {
        match self {
            Error::Transport{..} | Error::Format | Error::Parse(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;
