use chrono::{DateTime, Utc};
use uuid::Uuid;

use pipeline_common::domain::{
    DeadLetterItem, DiscoveryJob, Event, FetchStrategy, GeoPoint, JobStatus, RepairLog,
    ScrapeJob, Source, Tier,
};

/// Raw row shape for `scraper_sources`, lat/lng pulled out of the
/// `geography` column by the query itself (`ST_X`/`ST_Y`) rather than
/// requiring a custom `Decode` impl for `GEOGRAPHY(Point, 4326)`.
#[derive(Debug, sqlx::FromRow)]
pub struct SourceRow {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub tier: String,
    pub enabled: bool,
    pub auto_disabled: bool,
    pub fetch_strategy: String,
    pub extraction_config: serde_json::Value,
    pub default_lng: Option<f64>,
    pub default_lat: Option<f64>,
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

impl From<SourceRow> for Source {
    fn from(r: SourceRow) -> Self {
        Source {
            id: r.id,
            name: r.name,
            url: r.url,
            tier: parse_tier(&r.tier),
            enabled: r.enabled,
            auto_disabled: r.auto_disabled,
            fetch_strategy: parse_fetch_strategy(&r.fetch_strategy),
            extraction_config: r.extraction_config,
            default_coordinates: match (r.default_lat, r.default_lng) {
                (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
                _ => None,
            },
            location_name: r.location_name,
            language: r.language,
            volatility_score: r.volatility_score,
            consecutive_errors: r.consecutive_errors,
            consecutive_failures: r.consecutive_failures,
            last_scraped_at: r.last_scraped_at,
            next_scrape_at: r.next_scrape_at,
            last_error: r.last_error,
            total_events_scraped: r.total_events_scraped,
            quarantined: r.quarantined,
            config_version: r.config_version,
        }
    }
}

fn parse_tier(s: &str) -> Tier {
    match s {
        "aggregator" => Tier::Aggregator,
        "venue" => Tier::Venue,
        _ => Tier::General,
    }
}

fn parse_fetch_strategy(s: &str) -> FetchStrategy {
    match s {
        "headless" => FetchStrategy::Headless,
        "proxy" => FetchStrategy::Proxy,
        _ => FetchStrategy::Static,
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScrapeJobRow {
    pub id: Uuid,
    pub source_id: Uuid,
    pub status: String,
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

impl From<ScrapeJobRow> for ScrapeJob {
    fn from(r: ScrapeJobRow) -> Self {
        ScrapeJob {
            id: r.id,
            source_id: r.source_id,
            status: match r.status.as_str() {
                "running" => JobStatus::Running,
                "completed" => JobStatus::Completed,
                "failed" => JobStatus::Failed,
                _ => JobStatus::Pending,
            },
            attempts: r.attempts,
            max_attempts: r.max_attempts,
            proxy_retry: r.proxy_retry,
            priority: r.priority,
            created_at: r.created_at,
            started_at: r.started_at,
            completed_at: r.completed_at,
            events_scraped: r.events_scraped,
            events_inserted: r.events_inserted,
            error_message: r.error_message,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub event_type: String,
    pub venue_name: String,
    pub lng: f64,
    pub lat: f64,
    pub event_date: DateTime<Utc>,
    pub event_time: String,
    pub image_url: Option<String>,
    pub source_id: Uuid,
    pub event_fingerprint: String,
    pub content_hash: String,
    pub embedding_model: Option<String>,
    pub status: String,
}

impl From<EventRow> for Event {
    fn from(r: EventRow) -> Self {
        use pipeline_common::domain::{Category, EventKind, EventStatus};
        Event {
            id: r.id,
            title: r.title,
            description: r.description,
            category: parse_category(&r.category),
            event_type: match r.event_type.as_str() {
                "signal" => EventKind::Signal,
                "fork" => EventKind::Fork,
                _ => EventKind::Anchor,
            },
            venue_name: r.venue_name,
            location: GeoPoint { lat: r.lat, lng: r.lng },
            event_date: r.event_date,
            event_time: r.event_time,
            image_url: r.image_url,
            source_id: r.source_id,
            event_fingerprint: r.event_fingerprint,
            content_hash: r.content_hash,
            embedding: None,
            embedding_model: r.embedding_model,
            status: match r.status.as_str() {
                "cancelled" => EventStatus::Cancelled,
                "archived" => EventStatus::Archived,
                _ => EventStatus::Active,
            },
        }
    }
}

fn parse_category(s: &str) -> pipeline_common::domain::Category {
    use pipeline_common::domain::Category::*;
    match s {
        "active" => Active,
        "gaming" => Gaming,
        "entertainment" => Entertainment,
        "social" => Social,
        "family" => Family,
        "outdoors" => Outdoors,
        "music" => Music,
        "workshops" => Workshops,
        "foodie" => Foodie,
        _ => Community,
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DlqRow {
    pub id: Uuid,
    pub original_job_id: Uuid,
    pub source_id: Uuid,
    pub stage: String,
    pub error_type: String,
    pub error_message: String,
    pub error_stack: Option<String>,
    pub payload: serde_json::Value,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: DateTime<Utc>,
    pub status: String,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl From<DlqRow> for DeadLetterItem {
    fn from(r: DlqRow) -> Self {
        use pipeline_common::domain::{DlqStage, DlqStatus};
        DeadLetterItem {
            id: r.id,
            original_job_id: r.original_job_id,
            source_id: r.source_id,
            stage: match r.stage.as_str() {
                "parse" => DlqStage::Parse,
                "normalize" => DlqStage::Normalize,
                "dedup" => DlqStage::Dedup,
                "insert" => DlqStage::Insert,
                "enrich" => DlqStage::Enrich,
                _ => DlqStage::Fetch,
            },
            error_type: r.error_type,
            error_message: r.error_message,
            error_stack: r.error_stack,
            payload: r.payload,
            retry_count: r.retry_count,
            max_retries: r.max_retries,
            next_retry_at: r.next_retry_at,
            status: match r.status.as_str() {
                "retrying" => DlqStatus::Retrying,
                "resolved" => DlqStatus::Resolved,
                "discarded" => DlqStatus::Discarded,
                _ => DlqStatus::Pending,
            },
            resolved_at: r.resolved_at,
            resolution_notes: r.resolution_notes,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DiscoveryJobRow {
    pub id: Uuid,
    pub municipality: String,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub batch_id: Uuid,
    pub status: String,
    pub priority: i32,
    pub attempts: i32,
    pub sources_found: i32,
    pub sources_added: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<DiscoveryJobRow> for DiscoveryJob {
    fn from(r: DiscoveryJobRow) -> Self {
        use pipeline_common::domain::DiscoveryJobStatus;
        DiscoveryJob {
            id: r.id,
            municipality: r.municipality,
            coordinates: match (r.lat, r.lng) {
                (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
                _ => None,
            },
            batch_id: r.batch_id,
            status: match r.status.as_str() {
                "processing" => DiscoveryJobStatus::Processing,
                "completed" => DiscoveryJobStatus::Completed,
                "failed" => DiscoveryJobStatus::Failed,
                _ => DiscoveryJobStatus::Pending,
            },
            priority: r.priority,
            attempts: r.attempts,
            sources_found: r.sources_found,
            sources_added: r.sources_added,
            created_at: r.created_at,
            completed_at: r.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct RepairLogRow {
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

impl From<RepairLogRow> for RepairLog {
    fn from(r: RepairLogRow) -> Self {
        RepairLog {
            id: r.id,
            source_id: r.source_id,
            trigger_reason: r.trigger_reason,
            raw_html_sample: r.raw_html_sample,
            ai_diagnosis: r.ai_diagnosis,
            old_config: r.old_config,
            new_config: r.new_config,
            validation_passed: r.validation_passed,
            applied: r.applied,
            applied_at: r.applied_at,
        }
    }
}
