use serde::{Deserialize, Serialize};

use pipeline_common::domain::ParsingMethod;

/// Dynamic JSON shapes coming out of any strategy collapse into this one
/// closed, tagged shape before anything downstream touches them — unknown
/// fields from a CMS's hydration payload or JSON-LD block are looked up
/// defensively and discarded, never preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEventCard {
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub raw_html: String,
    pub image_url: Option<String>,
    pub detail_url: Option<String>,
    pub category_hint: Option<String>,
    pub detail_page_time: Option<String>,
}

impl RawEventCard {
    pub fn from_value(value: &serde_json::Value, raw_html: &str) -> Self {
        let lookup = |keys: &[&str]| -> Option<String> {
            keys.iter().find_map(|k| value.get(k)).and_then(|v| v.as_str()).map(str::to_string)
        };

        Self {
            title: lookup(&["title", "name", "eventName", "heading"]),
            date: lookup(&["date", "startDate", "start_date", "eventDate"]),
            location: lookup(&["location", "venue", "venueName", "place"]),
            description: lookup(&["description", "summary", "body"]),
            raw_html: raw_html.to_string(),
            image_url: lookup(&["image", "imageUrl", "image_url", "thumbnail"]),
            detail_url: lookup(&["url", "detailUrl", "detail_url", "link"]),
            category_hint: lookup(&["category", "categoryHint", "type"]),
            detail_page_time: lookup(&["time", "startTime", "start_time"]),
        }
    }
}

/// One strategy's contribution to a job, tagged with the method that
/// produced it so `raw_event_staging.parsing_method` stays honest.
#[derive(Debug, Clone)]
pub struct ExtractedBatch {
    pub method: ParsingMethod,
    pub cards: Vec<RawEventCard>,
}
