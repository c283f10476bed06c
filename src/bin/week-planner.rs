//! Print the unified schedule of a feed and of the locally stored tasks
//!
//! Run `week-planner --help` for the available options.
//! Without a feed URL, the one remembered from a previous run is used.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use url::Url;

use week_planner::config::{ProxyStrategy, TransportConfig, DEFAULT_LOCAL_PROXY};
use week_planner::store::FileStore;
use week_planner::transport::{HttpFetcher, TransportResolver};
use week_planner::Provider;

#[derive(Parser, Debug)]
#[command(name = "week-planner")]
#[command(about = "Print the schedule of an iCal feed, merged with your own tasks")]
struct Cli {
    /// The feed to load. It is remembered for the next runs.
    url: Option<Url>,

    /// The folder that holds the tasks and the settings
    #[arg(long, env = "WEEKPLANNER_DATA", default_value = "week-planner-data")]
    data: PathBuf,

    /// Try a self-hosted relay after the public ones (at the given base URL, or at the default one)
    #[arg(long, env = "WEEKPLANNER_LOCAL_PROXY", num_args = 0..=1, default_missing_value = DEFAULT_LOCAL_PROXY)]
    local_proxy: Option<Url>,

    /// Do not go through any CORS relay
    #[arg(long, conflicts_with = "local_proxy")]
    direct_only: bool,
}

impl Cli {
    fn transport_config(&self) -> TransportConfig {
        if self.direct_only {
            return TransportConfig::direct_only();
        }

        // The self-hosted relay is tried last
        match &self.local_proxy {
            None => TransportConfig::default(),
            Some(base) => TransportConfig::default().with_proxy(ProxyStrategy::Local { base: base.clone() }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let resolver = TransportResolver::new(HttpFetcher::new(), cli.transport_config());
    let mut provider = Provider::new(resolver, FileStore::new(&cli.data));

    let url = match cli.url {
        Some(url) => {
            if let Err(err) = provider.settings().set_feed_url(&url) {
                log::warn!("Unable to remember the feed URL: {}", err);
            }
            url
        },
        None => match provider.settings().feed_url() {
            Some(url) => url,
            None => return Err("No feed URL given, and none remembered from a previous run".into()),
        },
    };

    let events = provider.load_unified_data(&url).await.map_err(|err| {
        log::error!("Unable to load {}: {}", url, err);
        err
    })?;
    println!("{} entries:", events.len());
    week_planner::utils::print_unified_list(&events);
    Ok(())
}
