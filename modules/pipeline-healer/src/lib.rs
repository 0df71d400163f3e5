//! Self-healing orchestrator (§4.8): diagnoses quarantined or persistently
//! failing sources with an LLM-proposed selector/strategy repair, and either
//! just records the diagnosis, applies it, or uses it to clear quarantine —
//! depending on which mode the `/healer` endpoint was invoked with.
//!
//! Grounded on the teacher's `rootsignal-scout-supervisor::supervisor`
//! (mode-less but structurally the same "select candidates, run checks,
//! report a digest" shape) and `checks/llm.rs` (LLM-backed validation of a
//! candidate, consulted before any state mutation).

use std::fmt;

use pipeline_ai::{SelectorRepair, StructuredOutputClient};
use pipeline_common::domain::Source;
use pipeline_common::Result;
use pipeline_db::Store;
use pipeline_fetcher::Fetcher;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_HTML_SAMPLE_CHARS: usize = 4_000;
/// Confidence floor to *apply* a repair (§4.8: "validates result has
/// confidence ≥0.6").
const REPAIR_CONFIDENCE_THRESHOLD: f32 = 0.6;
/// Lower confidence floor used only to clear quarantine without also
/// rewriting selectors (§4.8: "unquarantine mode ... clears quarantine if
/// confidence ≥0.5").
const UNQUARANTINE_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// `quarantined_or_failing_sources` candidate bar (§4.8: "sources with ≥3
/// consecutive failures").
const FAILURE_THRESHOLD: i32 = 3;
/// Default candidate cap when the `/healer` body doesn't specify `limit`.
const DEFAULT_LIMIT: i64 = 20;

const SELECTOR_REPAIR_SYSTEM_PROMPT: &str = r#"You are diagnosing a broken or suspect
event-scraper configuration for a municipal/venue agenda page. You will be given the
source's current extraction_config and a sample of its current raw HTML. Diagnose what,
if anything, is wrong, and propose a minimal replacement set of CSS selectors in the
order: card, title, date, location, description, image_url, detail_url (omit trailing
selectors you can't determine), plus a recommended fetch strategy: one of
"static", "headless", "proxy". State your confidence the page is actually fixable
this way, 0.0 to 1.0."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealerMode {
    Diagnose,
    Repair,
    Unquarantine,
}

impl fmt::Display for HealerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealerMode::Diagnose => write!(f, "diagnose"),
            HealerMode::Repair => write!(f, "repair"),
            HealerMode::Unquarantine => write!(f, "unquarantine"),
        }
    }
}

impl std::str::FromStr for HealerMode {
    type Err = pipeline_common::PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "diagnose" => Ok(HealerMode::Diagnose),
            "repair" => Ok(HealerMode::Repair),
            "unquarantine" => Ok(HealerMode::Unquarantine),
            other => Err(pipeline_common::PipelineError::Validation(format!(
                "unknown healer mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceHealResult {
    pub source_id: Uuid,
    pub source_name: String,
    pub confidence: f32,
    pub diagnosis: String,
    pub applied: bool,
    pub quarantine_cleared: bool,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct HealerOutcome {
    pub mode_run: Vec<SourceHealResult>,
}

/// Runs the healer in `mode` over up to `limit` candidate sources. When
/// `source_id` is given, only that source is considered (still subject to
/// being a genuine candidate — quarantined or failing — otherwise it's
/// skipped, not force-healed).
pub async fn run_healer<C: StructuredOutputClient>(
    store: &Store,
    fetcher: &dyn Fetcher,
    ai_client: &C,
    mode: HealerMode,
    source_id: Option<Uuid>,
    limit: Option<i64>,
) -> Result<HealerOutcome> {
    let mut candidates = store.quarantined_or_failing_sources(FAILURE_THRESHOLD).await?;
    if let Some(id) = source_id {
        candidates.retain(|s| s.id == id);
    }
    let limit = limit.unwrap_or(DEFAULT_LIMIT).max(0) as usize;
    candidates.truncate(limit);

    let mut results = Vec::with_capacity(candidates.len());
    for source in &candidates {
        match heal_one(store, fetcher, ai_client, mode, source).await {
            Ok(result) => results.push(result),
            Err(error) => warn!(source_id = %source.id, %error, "healer: source heal attempt failed"),
        }
    }

    info!(mode = %mode, candidates = candidates.len(), healed = results.len(), "healer pass complete");
    Ok(HealerOutcome { mode_run: results })
}

async fn heal_one<C: StructuredOutputClient>(
    store: &Store,
    fetcher: &dyn Fetcher,
    ai_client: &C,
    mode: HealerMode,
    source: &Source,
) -> Result<SourceHealResult> {
    let response = fetcher
        .fetch(&source.url, &[])
        .await
        .map_err(|e| pipeline_common::PipelineError::Transient(e.to_string()))?;
    let sample = truncate_chars(&response.html, MAX_HTML_SAMPLE_CHARS);

    let trigger_reason = if source.quarantined { "quarantined" } else { "consecutive_failures" };
    let repair_id = store
        .log_repair_attempt(source.id, trigger_reason, sample, &source.extraction_config)
        .await?;

    let user_prompt = format!(
        "Current extraction_config: {}\n\nHTML sample:\n{sample}",
        source.extraction_config
    );

    let repair: SelectorRepair = match ai_client.extract(SELECTOR_REPAIR_SYSTEM_PROMPT, &user_prompt).await {
        Ok(repair) => repair,
        Err(error) => {
            store.record_repair_validation(repair_id, false).await?;
            return Err(pipeline_common::PipelineError::RepairFailure(error.to_string()));
        }
    };

    let new_config = selector_repair_config(&repair);
    store.record_repair_diagnosis(repair_id, &repair.diagnosis, &new_config).await?;

    let mut applied = false;
    let mut quarantine_cleared = false;

    match mode {
        HealerMode::Diagnose => {
            store.record_repair_validation(repair_id, repair.confidence >= REPAIR_CONFIDENCE_THRESHOLD).await?;
        }
        HealerMode::Repair => {
            if repair.confidence >= REPAIR_CONFIDENCE_THRESHOLD {
                store.record_repair_validation(repair_id, true).await?;
                store.persist_extraction_config(source.id, &new_config).await?;
                store.mark_repair_applied(repair_id).await?;
                store.reset_consecutive_failures(source.id).await?;
                store.quarantine_source(source.id, false).await?;
                applied = true;
                quarantine_cleared = source.quarantined;
            } else {
                store.record_repair_validation(repair_id, false).await?;
                if source.consecutive_failures + 1 >= FAILURE_THRESHOLD {
                    store.quarantine_source(source.id, true).await?;
                }
            }
        }
        HealerMode::Unquarantine => {
            let passed = repair.confidence >= UNQUARANTINE_CONFIDENCE_THRESHOLD;
            store.record_repair_validation(repair_id, passed).await?;
            if passed {
                store.quarantine_source(source.id, false).await?;
                store.reset_consecutive_failures(source.id).await?;
                quarantine_cleared = true;
            }
        }
    }

    Ok(SourceHealResult {
        source_id: source.id,
        source_name: source.name.clone(),
        confidence: repair.confidence,
        diagnosis: repair.diagnosis,
        applied,
        quarantine_cleared,
    })
}

fn selector_repair_config(repair: &SelectorRepair) -> serde_json::Value {
    let fields = ["card", "title", "date", "location", "description", "image_url", "detail_url"];
    let mut dom = serde_json::Map::new();
    for (field, value) in fields.iter().zip(repair.selectors.iter()) {
        dom.insert((*field).to_string(), serde_json::Value::String(value.clone()));
    }
    serde_json::json!({
        "dom": dom,
        "preferred_method": repair.recommended_strategy,
    })
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("diagnose".parse::<HealerMode>().unwrap(), HealerMode::Diagnose);
        assert_eq!("repair".parse::<HealerMode>().unwrap(), HealerMode::Repair);
        assert_eq!("unquarantine".parse::<HealerMode>().unwrap(), HealerMode::Unquarantine);
        assert!("bogus".parse::<HealerMode>().is_err());
    }

    #[test]
    fn selector_repair_config_maps_positionally() {
        let repair = SelectorRepair {
            selectors: vec![".card".to_string(), ".title".to_string()],
            recommended_strategy: "headless".to_string(),
            diagnosis: "drifted".to_string(),
            confidence: 0.7,
        };
        let config = selector_repair_config(&repair);
        assert_eq!(config["dom"]["card"], ".card");
        assert_eq!(config["dom"]["title"], ".title");
        assert_eq!(config["preferred_method"], "headless");
        assert!(config["dom"].get("date").is_none());
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        let s = "a".repeat(5) + "é" + &"b".repeat(5);
        let truncated = truncate_chars(&s, 5);
        assert_eq!(truncated, "a".repeat(5));
    }
}
