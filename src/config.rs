//! Support for library configuration options
//!
//! There is no global state in this crate: a [`TransportConfig`] is handed to the [`TransportResolver`](crate::transport::TransportResolver)
//! and the feed URL is given to every [`Provider::load_unified_data`](crate::Provider::load_unified_data) call.

use url::Url;

/// Part of the ProdID string that describes the organization (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
pub const ORG_NAME: &str = "Week Planner";

/// Part of the ProdID string that describes the product name (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
pub const PRODUCT_NAME: &str = "week-planner";

/// The base URL of the self-hosted relay (see [`ProxyStrategy::Local`])
pub const DEFAULT_LOCAL_PROXY: &str = "http://localhost:3001/proxy";

/// A way to reach the feed through a CORS relay.
///
/// Every strategy wraps the target URL into a different request URL.
#[derive(Clone, Debug, PartialEq)]
pub enum ProxyStrategy {
    /// `https://api.allorigins.win/raw?url=<encoded target>`
    AllOrigins,
    /// `https://cors-anywhere.herokuapp.com/<target>` (may require requesting temporary access)
    CorsAnywhere,
    /// `https://corsproxy.io/?<encoded target>`
    CorsProxyIo,
    /// A self-hosted relay, queried as `<base>?url=<encoded target>`
    Local { base: Url },
    /// Any relay that expects the encoded target appended to a fixed prefix
    Custom { name: String, prefix: String },
}

impl ProxyStrategy {
    /// A self-hosted relay at [`DEFAULT_LOCAL_PROXY`]
    pub fn local() -> Self {
        Self::Local {
            base: Url::parse(DEFAULT_LOCAL_PROXY).unwrap(/* this is a valid constant URL */),
        }
    }

    /// A human-readable name, used in logs
    pub fn name(&self) -> &str {
        match self {
            ProxyStrategy::AllOrigins => "AllOrigins",
            ProxyStrategy::CorsAnywhere => "CORS Anywhere",
            ProxyStrategy::CorsProxyIo => "Corsproxy.io",
            ProxyStrategy::Local{..} => "Local proxy",
            ProxyStrategy::Custom{name, ..} => name,
        }
    }

    /// Build the request URL that makes this relay fetch `target`
    pub fn wrap(&self, target: &Url) -> Result<Url, url::ParseError> {
        let encoded = encode_component(target.as_str());
        match self {
            ProxyStrategy::AllOrigins => Url::parse(&format!("https://api.allorigins.win/raw?url={}", encoded)),
            ProxyStrategy::CorsAnywhere => Url::parse(&format!("https://cors-anywhere.herokuapp.com/{}", target)),
            ProxyStrategy::CorsProxyIo => Url::parse(&format!("https://corsproxy.io/?{}", encoded)),
            ProxyStrategy::Local{base} => {
                let mut url = base.clone();
                url.query_pairs_mut().append_pair("url", target.as_str());
                Ok(url)
            },
            ProxyStrategy::Custom{prefix, ..} => Url::parse(&format!("{}{}", prefix, encoded)),
        }
    }
}

/// Percent-encode a string so that it fits in a single query component
fn encode_component(input: &str) -> String {
    url::form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        // form encoding turns spaces into '+', URI components want %20
        .replace('+', "%20")
}

/// Tells the transport layer how to reach a feed
#[derive(Clone, Debug, PartialEq)]
pub struct TransportConfig {
    /// Whether a direct request is attempted before the relays
    pub try_direct: bool,
    /// The relays to try, in order, when the direct request fails
    pub proxies: Vec<ProxyStrategy>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            try_direct: true,
            proxies: vec![
                ProxyStrategy::AllOrigins,
                ProxyStrategy::CorsAnywhere,
                ProxyStrategy::CorsProxyIo,
            ],
        }
    }
}

impl TransportConfig {
    /// Use only the direct request, without any relay
    pub fn direct_only() -> Self {
        Self { try_direct: true, proxies: Vec::new() }
    }

    /// Append a relay at the end of the fallback list
    pub fn with_proxy(mut self, proxy: ProxyStrategy) -> Self {
        self.proxies.push(proxy);
        self
    }
}
