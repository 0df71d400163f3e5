use tracing::warn;

/// Process-wide configuration, loaded once at startup. Unlike the teacher's
/// multi-binary deployment (separate `scout`/`editions`/`supervisor`/`web`
/// processes, each with its own `*_from_env()` scoping down which vars it
/// reads), this pipeline runs as a single daemon (`pipeline-api`) that
/// drives every role from one process, so `from_env()` always reads the
/// full set.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub target_event_year: i32,

    pub scraper_proxy_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub headless_endpoint: Option<String>,
    pub headless_token: Option<String>,

    pub scrape_interval_ms: u64,
    pub batch_size: i64,
    pub max_consecutive_errors: u32,
}

impl Config {
    /// Loads every variable the pipeline's roles collectively need. The
    /// sole binary, `pipeline-api`, calls this directly — it serves the
    /// coordinator, worker, discovery, and healer endpoints out of one
    /// process, so there is no narrower role to scope down to.
    pub fn from_env() -> Self {
        let cfg = Self {
            database_url: required_env("DATABASE_URL"),
            target_event_year: std::env::var("TARGET_EVENT_YEAR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| chrono::Utc::now().format("%Y").to_string().parse().unwrap()),
            scraper_proxy_api_key: first_present(&[
                "SCRAPER_PROXY_API_KEY",
                "PROXY_PROVIDER_API_KEY",
                "SCRAPINGBEE_API_KEY",
            ]),
            gemini_api_key: first_present(&["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            serper_api_key: std::env::var("SERPER_API_KEY").ok(),
            slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok(),
            headless_endpoint: std::env::var("BROWSERLESS_URL").ok(),
            headless_token: std::env::var("BROWSERLESS_TOKEN").ok(),
            scrape_interval_ms: std::env::var("SCRAPE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3_600_000),
            batch_size: std::env::var("BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            max_consecutive_errors: std::env::var("MAX_CONSECUTIVE_ERRORS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        };
        cfg.log_redacted();
        cfg
    }

    /// Logs which optional integrations are configured without ever printing
    /// a secret value, just char-counts — matches the teacher's `log_redacted`.
    pub fn log_redacted(&self) {
        tracing::info!(
            target_event_year = self.target_event_year,
            proxy_configured = self.scraper_proxy_api_key.is_some(),
            gemini_configured = self.gemini_api_key.is_some(),
            openai_configured = self.openai_api_key.is_some(),
            serper_configured = self.serper_api_key.is_some(),
            slack_configured = self.slack_webhook_url.is_some(),
            headless_configured = self.headless_endpoint.is_some(),
            batch_size = self.batch_size,
            "pipeline config loaded"
        );
    }
}

fn first_present(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| std::env::var(k).ok())
}

/// Panics with a clear message if the variable is missing — acceptable only
/// at process startup, never inside request handling.
fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        warn!(key, "required environment variable missing");
        panic!("missing required environment variable: {key}")
    })
}
