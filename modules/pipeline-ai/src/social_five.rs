use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The "Social Five" enrichment contract: what/when/where/who/vibe, produced
/// by the AI extraction strategy when every deterministic strategy yields
/// nothing useful (§4.3). Kept as a flat, closed schema — unknown fields from
/// the model are never preserved, matching the Design Notes' "tagged
/// variant" rule for dynamic JSON shapes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SocialFive {
    /// The event's title/what, plain text.
    pub what: String,
    /// Date/time as written on the page; normalization parses this further.
    pub when: String,
    /// Venue or address as written on the page.
    #[serde(rename = "where")]
    pub where_: String,
    /// Who it's for / hosted by, if stated; empty string if absent.
    pub who: String,
    /// One-line tone/category hint (e.g. "family-friendly outdoor market").
    pub vibe: String,
    /// Detail page URL if one was present near the card, else null.
    pub detail_url: Option<String>,
    /// Image URL if one was present near the card, else null.
    pub image_url: Option<String>,
    /// Model's own confidence this is a real, single event (not a section
    /// heading or navigation artifact), 0..100.
    pub confidence: u8,
}

/// Result of a single-event AI normalization fallback (§4.4) — same closed
/// shape as the deterministic path so callers don't special-case it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AiNormalizedEvent {
    pub title: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// "HH:MM" 24h or the literal "TBD".
    pub time: String,
    pub description: String,
    pub category_hint: String,
}

/// Selector-healing response (§4.8): the healer asks the model for new DOM
/// selectors and a preferred fetch strategy given a raw HTML sample.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectorRepair {
    pub selectors: Vec<String>,
    /// One of "static" | "headless" | "proxy".
    pub recommended_strategy: String,
    pub diagnosis: String,
    /// 0.0..1.0; repair only applies when this clears the healer's threshold.
    pub confidence: f32,
}

/// Discovery candidate validation response (§4.10).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiscoveryValidation {
    pub is_valid: bool,
    /// 0..100.
    pub confidence: u8,
    pub suggested_name: String,
}
