//! This module retrieves the raw text of a feed, falling back on CORS relays when a direct request fails

use std::error::Error as StdError;

use async_trait::async_trait;
use url::Url;

use crate::config::TransportConfig;
use crate::error::{Error, Result};

/// The outcome of a single HTTP request
#[derive(Clone, Debug, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new<S: ToString>(status: u16, body: S) -> Self {
        Self { status, body: body.to_string() }
    }

    /// A response is usable when its status is a success and it carries some content
    pub fn is_usable(&self) -> bool {
        (200..300).contains(&self.status) && self.body.is_empty() == false
    }
}

/// Something that can perform a GET request.
///
/// This is usually a [`HttpFetcher`], but tests can provide any scripted implementation.
#[async_trait]
pub trait Fetcher {
    /// Perform a GET request on `url`.
    /// Returns an error only when no response could be obtained at all (DNS, connection, TLS...)
    async fn get(&self, url: &Url) -> std::result::Result<FetchResponse, Box<dyn StdError + Send + Sync>>;
}

/// A [`Fetcher`] that performs actual HTTP requests
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pre-configured client (e.g. with a custom timeout or user agent)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> std::result::Result<FetchResponse, Box<dyn StdError + Send + Sync>> {
        let response = self.client
            .get(url.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}


/// Fetches the text of a feed, trying a direct request, then every configured relay, one after the other
pub struct TransportResolver<F: Fetcher> {
    fetcher: F,
    config: TransportConfig,
}

impl<F: Fetcher> TransportResolver<F> {
    pub fn new(fetcher: F, config: TransportConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &F { &self.fetcher }
    pub fn config(&self) -> &TransportConfig { &self.config }

    /// Returns the body of the first usable response.
    ///
    /// Attempts are strictly sequential: a relay is only queried once the previous attempt has failed.
    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        let mut last_error: Option<String> = None;

        if self.config.try_direct {
            log::debug!("Trying direct fetch of {}", url);
            match self.attempt(url).await {
                Ok(body) => {
                    log::info!("Successfully fetched {} directly", url);
                    return Ok(body);
                },
                Err(err) => {
                    log::warn!("Direct fetch of {} failed: {}", url, err);
                    last_error = Some(err);
                },
            }
        }

        for proxy in &self.config.proxies {
            let proxy_url = match proxy.wrap(url) {
                Ok(u) => u,
                Err(err) => {
                    log::warn!("Unable to build a {} URL for {}: {}", proxy.name(), url, err);
                    last_error = Some(err.to_string());
                    continue;
                },
            };

            log::debug!("Trying CORS proxy {} ({})", proxy.name(), proxy_url);
            match self.attempt(&proxy_url).await {
                Ok(body) => {
                    log::info!("Successfully fetched {} using {}", url, proxy.name());
                    return Ok(body);
                },
                Err(err) => {
                    log::warn!("{} proxy attempt failed: {}", proxy.name(), err);
                    last_error = Some(err);
                },
            }
        }

        log::error!("All fetch attempts failed for {}", url);
        Err(Error::Transport {
            url: url.to_string(),
            last_error: last_error.unwrap_or_else(|| String::from("Unknown error")),
        })
    }

    async fn attempt(&self, url: &Url) -> std::result::Result<String, String> {
        let response = self.fetcher.get(url).await.map_err(|err| err.to_string())?;
        if response.is_usable() {
            Ok(response.body)
        } else if response.body.is_empty() {
            Err(format!("Empty response body (HTTP status {})", response.status))
        } else {
            Err(format!("Unexpected HTTP status code {}", response.status))
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::config::ProxyStrategy;

    /// Replies from a fixed table, and records every requested URL
    struct TableFetcher {
        replies: HashMap<String, Option<FetchResponse>>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetcher for TableFetcher {
        async fn get(&self, url: &Url) -> std::result::Result<FetchResponse, Box<dyn StdError + Send + Sync>> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.replies.get(url.as_str()) {
                Some(Some(response)) => Ok(response.clone()),
                _ => Err(format!("connection refused for {}", url).into()),
            }
        }
    }

    fn target() -> Url {
        Url::parse("https://feed.example/cal.ics").unwrap()
    }

    #[tokio::test]
    async fn test_direct_success_skips_proxies() {
        let mut replies = HashMap::new();
        replies.insert(target().to_string(), Some(FetchResponse::new(200, "BEGIN:VCALENDAR")));
        let fetcher = TableFetcher { replies, requested: Mutex::new(Vec::new()) };

        let resolver = TransportResolver::new(fetcher, TransportConfig::default());
        let text = resolver.fetch_text(&target()).await.unwrap();
        assert_eq!(text, "BEGIN:VCALENDAR");
        assert_eq!(resolver.fetcher().requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_body_is_a_failure() {
        let first = ProxyStrategy::Custom { name: String::from("first"), prefix: String::from("https://first.example/?") };
        let mut replies = HashMap::new();
        replies.insert(target().to_string(), Some(FetchResponse::new(200, "")));
        replies.insert(first.wrap(&target()).unwrap().to_string(), Some(FetchResponse::new(200, "payload")));
        let fetcher = TableFetcher { replies, requested: Mutex::new(Vec::new()) };

        let config = TransportConfig { try_direct: true, proxies: vec![first] };
        let resolver = TransportResolver::new(fetcher, config);
        assert_eq!(resolver.fetch_text(&target()).await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_exhausted_strategies_report_last_error() {
        let fetcher = TableFetcher { replies: HashMap::new(), requested: Mutex::new(Vec::new()) };
        let resolver = TransportResolver::new(fetcher, TransportConfig::default());

        let err = resolver.fetch_text(&target()).await.unwrap_err();
        match &err {
            Error::Transport { url, last_error } => {
                assert_eq!(url, "https://feed.example/cal.ics");
                assert!(last_error.contains("corsproxy.io"));
            },
            other => panic!("Unexpected error {:?}", other),
        }
        assert!(err.is_load_failure());
        // direct + 3 relays
        assert_eq!(resolver.fetcher().requested.lock().unwrap().len(), 4);
    }
}
