use pipeline_ai::OpenAiCompatClient;
use pipeline_common::{notifier_from_config, Config, NotifyBackend};
use pipeline_db::Store;
use pipeline_discovery::search::{SearchClient, SerperClient};
use pipeline_worker::fetchers::FetcherSet;

/// Ambient process-wide state (§9: "a single process-wide DB handle and
/// configuration struct; initialized at startup, torn down on shutdown; no
/// singletons for business logic"). One `AppState` is built in `main` and
/// shared behind an `Arc` across every axum handler.
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub fetchers: FetcherSet,
    /// Gemini-backed client: normalization fallback, selector healing,
    /// embeddings. `None` when neither `GEMINI_API_KEY` nor
    /// `GOOGLE_AI_API_KEY` is set.
    pub gemini: Option<OpenAiCompatClient>,
    /// OpenAI-backed client for the Social Five structured-output
    /// enrichment. `None` when `OPENAI_API_KEY` is unset.
    pub social: Option<OpenAiCompatClient>,
    pub search: Option<SerperClient>,
    pub notify: Box<dyn NotifyBackend>,
    /// This process's own externally-reachable base URL, used for
    /// fire-and-forget chain-trigger POSTs (§4.6, §4.7). `None` disables
    /// chaining — the next scheduled tick or manual call picks up the slack.
    pub self_url: Option<String>,
}

impl AppState {
    /// Builds every role's dependencies from `config` and an already-connected
    /// `store` — the binary (`main.rs`) owns the connect/migrate lifecycle,
    /// this constructor only wires up what each handler needs.
    pub fn new(store: Store, config: Config) -> Self {
        let fetchers = FetcherSet::from_config(&config);

        let gemini = config
            .gemini_api_key
            .as_ref()
            .map(|key| OpenAiCompatClient::gemini(key.clone(), "gemini-2.0-flash"));
        let social = config
            .openai_api_key
            .as_ref()
            .map(|key| OpenAiCompatClient::openai(key.clone(), "gpt-4o-mini"));
        let search = config.serper_api_key.as_ref().map(|key| SerperClient::new(key.clone()));
        let notify = notifier_from_config(config.slack_webhook_url.as_deref());
        let self_url = std::env::var("SELF_BASE_URL").ok().filter(|s| !s.is_empty());

        Self { store, config, fetchers, gemini, social, search, notify, self_url }
    }

    /// Prefers the Gemini client for selector-healing/discovery-validation
    /// duty when both providers are configured — the Social Five client is
    /// reserved for card normalization, matching `pipeline-worker`'s own
    /// `pick_ai_for_normalize` precedence in the other direction.
    pub fn structured_ai(&self) -> Option<&OpenAiCompatClient> {
        self.gemini.as_ref().or(self.social.as_ref())
    }

    pub fn worker_url(&self) -> Option<String> {
        self.self_url.as_ref().map(|base| format!("{base}/worker"))
    }

    pub fn search_client(&self) -> Option<&dyn SearchClient> {
        self.search.as_ref().map(|s| s as &dyn SearchClient)
    }
}
