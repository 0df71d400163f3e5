use pipeline_common::domain::FetchStrategy;
use pipeline_common::Config;
use pipeline_fetcher::{Fetcher, HeadlessFetcher, ProxyFetcher, StaticFetcher};

/// Every concrete fetcher the worker might need, built once from config and
/// shared across a whole batch. `select` hands back the `&dyn Fetcher` for
/// whatever rung of the ladder a job currently calls for, falling back to
/// `static` when the requested strategy has no credentials configured —
/// same "degrade rather than fail the whole job" posture as `NoopNotify`.
pub struct FetcherSet {
    static_fetcher: StaticFetcher,
    headless_fetcher: Option<HeadlessFetcher>,
    proxy_fetcher: Option<ProxyFetcher>,
}

impl FetcherSet {
    pub fn from_config(config: &Config) -> Self {
        let headless_fetcher = match (&config.headless_endpoint, &config.headless_token) {
            (Some(endpoint), Some(token)) => Some(HeadlessFetcher::new(endpoint.clone(), token.clone())),
            _ => None,
        };
        let proxy_fetcher = config.scraper_proxy_api_key.clone().map(ProxyFetcher::new);

        Self { static_fetcher: StaticFetcher::new(), headless_fetcher, proxy_fetcher }
    }

    /// Picks the fetcher for `strategy`, degrading to `static` when the
    /// requested rung has no backing credentials rather than failing the job.
    pub fn select(&self, strategy: FetchStrategy) -> &dyn Fetcher {
        match strategy {
            FetchStrategy::Static => &self.static_fetcher,
            FetchStrategy::Headless => self
                .headless_fetcher
                .as_ref()
                .map(|f| f as &dyn Fetcher)
                .unwrap_or(&self.static_fetcher),
            FetchStrategy::Proxy => self
                .proxy_fetcher
                .as_ref()
                .map(|f| f as &dyn Fetcher)
                .unwrap_or(&self.static_fetcher),
        }
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy_fetcher.is_some()
    }
}
