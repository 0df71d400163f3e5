use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use pipeline_ai::{AiNormalizedEvent, StructuredOutputClient};
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use pipeline_common::domain::{Category, Event, EventKind, EventStatus, GeoPoint, Source};
use pipeline_common::hash::{content_hash, event_fingerprint};

use crate::card::RawEventCard;
use crate::category::classify_category;

const DESCRIPTION_FALLBACK_MAX_CHARS: usize = 240;

/// Closed, normalized shape produced by either `cheap_normalize` or the AI
/// fallback (§9 Design Notes: dynamic shapes collapse to a closed schema
/// before anything downstream sees them).
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub venue_name: String,
    pub location: GeoPoint,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub image_url: Option<String>,
    pub detail_url: Option<String>,
}

impl NormalizedEvent {
    /// Builds the row that `pipeline-dedup`/`insert_event` work with.
    /// `event_date` is placed at local midnight UTC — callers that need a
    /// real start time combine it with `event_time` themselves; the column
    /// stores the date, the string column carries the human time.
    pub fn to_event(&self, source_id: Uuid) -> Event {
        let date_str = self.event_date.format("%Y-%m-%d").to_string();
        let event_date: DateTime<Utc> = Utc
            .from_utc_datetime(&NaiveDateTime::new(self.event_date, NaiveTime::MIN));

        Event {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            event_type: EventKind::Anchor,
            venue_name: self.venue_name.clone(),
            location: self.location,
            event_date,
            event_time: self.event_time.clone(),
            image_url: self.image_url.clone(),
            source_id,
            event_fingerprint: event_fingerprint(&self.title, &date_str, source_id),
            content_hash: content_hash(&self.title, &date_str),
            embedding: None,
            embedding_model: None,
            status: EventStatus::Active,
        }
    }
}

/// Why `cheap_normalize` couldn't produce a row. `Reject*` variants are
/// terminal (§4.4: reject outright, no AI fallback); `NeedsAi*` variants are
/// the two cases the spec calls out for an AI retry ("fails on time or
/// description").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    RejectMissingTitle,
    RejectDate,
    NeedsAiTime,
    NeedsAiDescription,
}

/// Deterministic normalization (§4.4, steps 1-7). Pure, no I/O — the AI
/// fallback lives in [`normalize_with_ai_fallback`], which is the only
/// caller allowed to invoke an LLM.
pub fn cheap_normalize(
    raw: &RawEventCard,
    source: &Source,
    target_year: i32,
) -> Result<NormalizedEvent, NormalizeOutcome> {
    let title = raw.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let Some(title) = title else { return Err(NormalizeOutcome::RejectMissingTitle) };

    let Some(event_date) = raw.date.as_deref().and_then(parse_date) else {
        return Err(NormalizeOutcome::RejectDate);
    };
    if event_date.format("%Y").to_string().parse::<i32>() != Ok(target_year) {
        return Err(NormalizeOutcome::RejectDate);
    }

    let search_text = format!(
        "{} {}",
        raw.detail_page_time.as_deref().unwrap_or_default(),
        raw.description.as_deref().unwrap_or_default()
    );
    let event_time = match parse_time(raw.detail_page_time.as_deref(), &search_text) {
        TimeOutcome::Explicit(t) => t,
        TimeOutcome::Tbd => "TBD".to_string(),
        TimeOutcome::Invalid => return Err(NormalizeOutcome::NeedsAiTime),
    };

    let description = match normalize_description(raw) {
        Some(d) => d,
        None => return Err(NormalizeOutcome::NeedsAiDescription),
    };

    let category = classify_category(title, &description, raw.category_hint.as_deref());
    let venue_name = raw.location.clone().unwrap_or_else(|| source.name.clone());
    let location = source.default_coordinates.unwrap_or_else(|| {
        warn!(source_id = %source.id, "no default_coordinates for source, falling back to origin");
        GeoPoint::ORIGIN
    });

    Ok(NormalizedEvent {
        title: title.to_string(),
        description,
        category,
        venue_name,
        location,
        event_date,
        event_time,
        image_url: raw.image_url.clone(),
        detail_url: raw.detail_url.clone(),
    })
}

const AI_SYSTEM_PROMPT: &str = r#"You normalize a single scraped community event into a strict
contract: title, date (ISO YYYY-MM-DD), time (24h "HH:MM" or the literal "TBD"), description
(plain text, no HTML), and a short category hint. Use only information present in the input;
never invent a date or time that isn't implied by the text."#;

/// Runs `cheap_normalize`, and on the two recoverable failure modes it
/// names (time, description) retries once through an AI client with the
/// same closed contract (§4.4: "If cheap normalize fails on time or
/// description, try AI normalization... If AI returns invalid JSON or
/// out-of-year date, reject."). Title/date rejections never reach the AI.
pub async fn normalize_with_ai_fallback<C: StructuredOutputClient>(
    raw: &RawEventCard,
    source: &Source,
    target_year: i32,
    ai: Option<&C>,
) -> Option<NormalizedEvent> {
    match cheap_normalize(raw, source, target_year) {
        Ok(event) => Some(event),
        Err(NormalizeOutcome::RejectMissingTitle) | Err(NormalizeOutcome::RejectDate) => None,
        Err(NormalizeOutcome::NeedsAiTime) | Err(NormalizeOutcome::NeedsAiDescription) => {
            let client = ai?;
            ai_normalize(raw, source, target_year, client).await
        }
    }
}

async fn ai_normalize<C: StructuredOutputClient>(
    raw: &RawEventCard,
    source: &Source,
    target_year: i32,
    client: &C,
) -> Option<NormalizedEvent> {
    let user_prompt = format!(
        "Title: {}\nDate (as written): {}\nDescription/HTML: {}",
        raw.title.as_deref().unwrap_or(""),
        raw.date.as_deref().unwrap_or(""),
        raw.description.as_deref().unwrap_or(&raw.raw_html),
    );

    let result: anyhow::Result<AiNormalizedEvent> =
        client.extract(AI_SYSTEM_PROMPT, &user_prompt).await;

    let ai_event = match result {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "AI normalization returned invalid output");
            return None;
        }
    };

    let event_date = parse_date(&ai_event.date)?;
    if event_date.format("%Y").to_string().parse::<i32>() != Ok(target_year) {
        return None;
    }

    let event_time = if ai_event.time.eq_ignore_ascii_case("tbd") {
        "TBD".to_string()
    } else {
        match normalize_time_str(&ai_event.time) {
            Some(t) => t,
            None => "TBD".to_string(),
        }
    };

    let category = classify_category(&ai_event.title, &ai_event.description, Some(&ai_event.category_hint));
    let venue_name = raw.location.clone().unwrap_or_else(|| source.name.clone());
    let location = source.default_coordinates.unwrap_or(GeoPoint::ORIGIN);

    Some(NormalizedEvent {
        title: ai_event.title,
        description: ai_event.description,
        category,
        venue_name,
        location,
        event_date,
        event_time,
        image_url: raw.image_url.clone(),
        detail_url: raw.detail_url.clone(),
    })
}

fn normalize_description(raw: &RawEventCard) -> Option<String> {
    if let Some(desc) = raw.description.as_deref() {
        let normalized = whitespace_normalize(desc);
        if !normalized.is_empty() {
            return Some(truncate_chars(&normalized, DESCRIPTION_FALLBACK_MAX_CHARS));
        }
    }

    let stripped = strip_html(&raw.raw_html);
    let normalized = whitespace_normalize(&stripped);
    (!normalized.is_empty()).then(|| truncate_chars(&normalized, DESCRIPTION_FALLBACK_MAX_CHARS))
}

fn whitespace_normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

fn strip_html(html: &str) -> String {
    HTML_TAG_RE.replace_all(html, " ").into_owned()
}

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

const DUTCH_MONTHS: &[(&str, &str)] = &[
    ("januari", "January"),
    ("februari", "February"),
    ("maart", "March"),
    ("april", "April"),
    ("mei", "May"),
    ("juni", "June"),
    ("juli", "July"),
    ("augustus", "August"),
    ("september", "September"),
    ("oktober", "October"),
    ("november", "November"),
    ("december", "December"),
];

/// Parses a date string to `NaiveDate` (§4.4 step 2). Tries RFC3339,
/// bare ISO, an ISO substring buried in a longer string, English long-form,
/// and Dutch long-form (month name translated, then re-parsed).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some(m) = ISO_DATE_RE.find(raw) {
        if let Ok(d) = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d") {
            return Some(d);
        }
    }
    for fmt in ["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }

    let lower = raw.to_lowercase();
    for (dutch, english) in DUTCH_MONTHS {
        if lower.contains(dutch) {
            let anglicized = lower.replacen(dutch, english, 1);
            for fmt in ["%d %B %Y", "%B %d %Y"] {
                if let Ok(d) = NaiveDate::parse_from_str(&anglicized, fmt) {
                    return Some(d);
                }
            }
        }
    }

    None
}

enum TimeOutcome {
    Explicit(String),
    Tbd,
    Invalid,
}

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})[:.h](\d{2})\s*(am|pm)?\b").unwrap());
static UHR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*uhr\b").unwrap());

/// §4.4 step 3: prefer `detail_page_time`, else regex over the combined
/// text, else `"TBD"`. A syntactically-present but out-of-range time (e.g.
/// "24:00", "13:45 pm") is `Invalid`, not `Tbd` — it signals the caller to
/// retry with AI rather than silently discarding a time that was stated.
fn parse_time(detail_page_time: Option<&str>, text: &str) -> TimeOutcome {
    if let Some(detail) = detail_page_time {
        if !detail.trim().is_empty() {
            return match normalize_time_str(detail) {
                Some(t) => TimeOutcome::Explicit(t),
                None => TimeOutcome::Invalid,
            };
        }
    }

    if let Some(caps) = TIME_RE.captures(text) {
        return match build_time(&caps) {
            Some(t) => TimeOutcome::Explicit(t),
            None => TimeOutcome::Invalid,
        };
    }

    if let Some(caps) = UHR_RE.captures(text) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        return if hour <= 23 {
            TimeOutcome::Explicit(format!("{hour:02}:00"))
        } else {
            TimeOutcome::Invalid
        };
    }

    TimeOutcome::Tbd
}

fn normalize_time_str(s: &str) -> Option<String> {
    if let Some(caps) = TIME_RE.captures(s) {
        return build_time(&caps);
    }
    if let Some(caps) = UHR_RE.captures(s) {
        let hour: u32 = caps[1].parse().ok()?;
        return (hour <= 23).then(|| format!("{hour:02}:00"));
    }
    None
}

fn build_time(caps: &regex::Captures) -> Option<String> {
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if minute > 59 {
        return None;
    }

    if let Some(ampm) = caps.get(3) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let is_pm = ampm.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, is_pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    } else if hour > 23 {
        return None;
    }

    Some(format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_common::domain::{FetchStrategy, Tier};

    fn source() -> Source {
        Source {
            id: Uuid::new_v4(),
            name: "Lake St Church".to_string(),
            url: "https://x.example".to_string(),
            tier: Tier::Venue,
            enabled: true,
            auto_disabled: false,
            fetch_strategy: FetchStrategy::Static,
            extraction_config: serde_json::json!({}),
            default_coordinates: Some(GeoPoint::new(41.8, -87.6)),
            location_name: None,
            language: None,
            volatility_score: 0.5,
            consecutive_errors: 0,
            consecutive_failures: 0,
            last_scraped_at: None,
            next_scrape_at: None,
            last_error: None,
            total_events_scraped: 0,
            quarantined: false,
            config_version: 1,
        }
    }

    fn card() -> RawEventCard {
        RawEventCard {
            title: Some("Jazz in Park".to_string()),
            date: Some("2026-07-01".to_string()),
            location: None,
            description: Some("An evening of live jazz at 7:30 pm in the park.".to_string()),
            raw_html: "<div>Jazz in Park</div>".to_string(),
            image_url: None,
            detail_url: None,
            category_hint: None,
            detail_page_time: None,
        }
    }

    #[test]
    fn missing_title_rejects() {
        let raw = RawEventCard { title: None, ..card() };
        assert_eq!(cheap_normalize(&raw, &source(), 2026), Err(NormalizeOutcome::RejectMissingTitle));
    }

    #[test]
    fn date_boundaries_for_target_year() {
        let start = RawEventCard { date: Some("2026-01-01".to_string()), ..card() };
        let end = RawEventCard { date: Some("2026-12-31".to_string()), ..card() };
        let before = RawEventCard { date: Some("2025-12-31".to_string()), ..card() };

        assert!(cheap_normalize(&start, &source(), 2026).is_ok());
        assert!(cheap_normalize(&end, &source(), 2026).is_ok());
        assert_eq!(cheap_normalize(&before, &source(), 2026), Err(NormalizeOutcome::RejectDate));
    }

    #[test]
    fn seven_thirty_pm_becomes_nineteen_thirty() {
        let normalized = cheap_normalize(&card(), &source(), 2026).unwrap();
        assert_eq!(normalized.event_time, "19:30");
    }

    #[test]
    fn time_2359_is_valid_2400_is_invalid() {
        let valid = RawEventCard { detail_page_time: Some("23:59".to_string()), ..card() };
        let invalid = RawEventCard { detail_page_time: Some("24:00".to_string()), ..card() };

        assert_eq!(cheap_normalize(&valid, &source(), 2026).unwrap().event_time, "23:59");
        assert_eq!(cheap_normalize(&invalid, &source(), 2026), Err(NormalizeOutcome::NeedsAiTime));
    }

    #[test]
    fn no_time_in_text_defaults_to_tbd() {
        let raw = RawEventCard { description: Some("A lovely community gathering.".to_string()), ..card() };
        assert_eq!(cheap_normalize(&raw, &source(), 2026).unwrap().event_time, "TBD");
    }

    #[test]
    fn missing_description_and_html_needs_ai() {
        let raw = RawEventCard { description: None, raw_html: String::new(), ..card() };
        assert_eq!(cheap_normalize(&raw, &source(), 2026), Err(NormalizeOutcome::NeedsAiDescription));
    }

    #[test]
    fn falls_back_to_stripped_html_when_description_missing() {
        let raw = RawEventCard {
            description: None,
            raw_html: "<div><p>Live music under the stars.</p></div>".to_string(),
            ..card()
        };
        let normalized = cheap_normalize(&raw, &source(), 2026).unwrap();
        assert_eq!(normalized.description, "Live music under the stars.");
    }

    #[test]
    fn missing_coordinates_falls_back_to_origin() {
        let mut s = source();
        s.default_coordinates = None;
        let normalized = cheap_normalize(&card(), &s, 2026).unwrap();
        assert_eq!(normalized.location, GeoPoint::ORIGIN);
    }

    #[test]
    fn venue_falls_back_to_source_name() {
        let normalized = cheap_normalize(&card(), &source(), 2026).unwrap();
        assert_eq!(normalized.venue_name, "Lake St Church");
    }

    #[test]
    fn dutch_month_name_parses() {
        let raw = RawEventCard { date: Some("1 juli 2026".to_string()), ..card() };
        assert!(cheap_normalize(&raw, &source(), 2026).is_ok());
    }
}
