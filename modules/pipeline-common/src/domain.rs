use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// WGS84 point, `(lng, lat)` order to match the PostGIS `geography(Point, 4326)`
/// wire convention the teacher's `GeoPoint`/`geohash` types also follow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const ORIGIN: GeoPoint = GeoPoint { lng: 0.0, lat: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lng, lat }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Aggregator,
    Venue,
    General,
}

impl Tier {
    /// `runEvery` from the tier policy table (§4.3).
    pub fn run_every_hours(self) -> i64 {
        match self {
            Tier::Aggregator => 6,
            Tier::Venue => 24,
            Tier::General => 168,
        }
    }

    pub fn deep_scrape(self) -> bool {
        !matches!(self, Tier::Aggregator)
    }

    pub fn feed_guessing(self) -> bool {
        matches!(self, Tier::Venue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    Static,
    Headless,
    Proxy,
}

/// A web location that publishes event listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub tier: Tier,
    pub enabled: bool,
    pub auto_disabled: bool,
    pub fetch_strategy: FetchStrategy,
    pub extraction_config: serde_json::Value,
    pub default_coordinates: Option<GeoPoint>,
    pub location_name: Option<String>,
    pub language: Option<String>,
    pub volatility_score: f64,
    pub consecutive_errors: i32,
    pub consecutive_failures: i32,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub next_scrape_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub total_events_scraped: i64,
    pub quarantined: bool,
    pub config_version: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A scheduled unit of work to scrape one source once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: Uuid,
    pub source_id: Uuid,
    pub status: JobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub proxy_retry: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub events_scraped: i32,
    pub events_inserted: i32,
    pub error_message: Option<String>,
}

impl ScrapeJob {
    pub fn default_max_attempts() -> i32 {
        3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingStatus {
    Pending,
    AwaitingEnrichment,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingMethod {
    Hydration,
    JsonLd,
    Microdata,
    Feed,
    Dom,
    Deterministic,
    DeterministicDetail,
    Ai,
    HybridAi,
    AiFallback,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEventStaging {
    pub id: Uuid,
    pub source_id: Uuid,
    pub status: StagingStatus,
    pub source_url: String,
    pub detail_url: Option<String>,
    pub raw_html: Option<String>,
    pub detail_html: Option<String>,
    pub parsing_method: ParsingMethod,
    pub extracted_title: Option<String>,
    pub extracted_date: Option<String>,
    pub quality_score: f64,
    pub data_completeness: f64,
}

/// Closed category enum (§6). Unmapped text always defaults to `Community`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Active,
    Gaming,
    Entertainment,
    Social,
    Family,
    Outdoors,
    Music,
    Workshops,
    Foodie,
    Community,
}

impl Default for Category {
    fn default() -> Self {
        Category::Community
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Anchor,
    Signal,
    Fork,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Cancelled,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub event_type: EventKind,
    pub venue_name: String,
    pub location: GeoPoint,
    pub event_date: DateTime<Utc>,
    /// "HH:MM" 24h, or the literal string "TBD".
    pub event_time: String,
    pub image_url: Option<String>,
    pub source_id: Uuid,
    pub event_fingerprint: String,
    pub content_hash: String,
    pub embedding: Option<Vec<f32>>,
    pub embedding_model: Option<String>,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DlqStage {
    Fetch,
    Parse,
    Normalize,
    Dedup,
    Insert,
    Enrich,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DlqStatus {
    Pending,
    Retrying,
    Resolved,
    Discarded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterItem {
    pub id: Uuid,
    pub original_job_id: Uuid,
    pub source_id: Uuid,
    pub stage: DlqStage,
    pub error_type: String,
    pub error_message: String,
    pub error_stack: Option<String>,
    pub payload: serde_json::Value,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: DateTime<Utc>,
    pub status: DlqStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl DeadLetterItem {
    pub fn default_max_retries() -> i32 {
        3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryJob {
    pub id: Uuid,
    pub municipality: String,
    pub coordinates: Option<GeoPoint>,
    pub batch_id: Uuid,
    pub status: DiscoveryJobStatus,
    pub priority: i32,
    pub attempts: i32,
    pub sources_found: i32,
    pub sources_added: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairLog {
    pub id: Uuid,
    pub source_id: Uuid,
    pub trigger_reason: String,
    pub raw_html_sample: String,
    pub ai_diagnosis: Option<String>,
    pub old_config: serde_json::Value,
    pub new_config: Option<serde_json::Value>,
    pub validation_passed: bool,
    pub applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
}
