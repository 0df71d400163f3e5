use pipeline_ai::{SelectorRepair, StructuredOutputClient};
use pipeline_common::domain::{ParsingMethod, Source};
use pipeline_common::Result;
use pipeline_db::Store;
use pipeline_extract::{fingerprint, run_waterfall, DomStrategy, ExtractedBatch, ExtractionStrategy};
use pipeline_fetcher::{fetch_with_backoff, RetryPolicy};
use tracing::{info, warn};

use crate::fetchers::FetcherSet;
use crate::waterfall::{build_waterfall, dom_selectors_to_config, selector_repair_to_dom_selectors};

const MIN_CARDS_FOR_STRICT: usize = 3;
const MAX_HTML_SAMPLE_CHARS: usize = 4_000;
const REPAIR_APPLY_THRESHOLD: f32 = 0.6;

pub enum HealOutcome {
    Recovered(ExtractedBatch),
    Failed,
}

const SELECTOR_REPAIR_SYSTEM_PROMPT: &str = r#"You are repairing a broken CSS selector
configuration for an event-listing scraper. You will be given a sample of the page's raw HTML
and the selectors that used to work. Diagnose why zero cards extracted and propose a new,
minimal set of selectors in the order: card, title, date, location, description, image_url,
detail_url. Omit trailing selectors you can't determine rather than guessing."#;

/// Runs the two-step "heal on zero" ladder (§4.7) after a listing parse
/// comes back empty: first try bumping the fetch strategy (maybe the page
/// just needs JS rendering now), then fall back to AI selector repair
/// against the HTML that was actually fetched. Gives up and marks the
/// source failing if neither recovers a non-empty batch.
pub async fn heal_on_zero<C: StructuredOutputClient>(
    store: &Store,
    fetchers: &FetcherSet,
    ai: Option<&C>,
    source: &Source,
    raw_html: &str,
) -> Result<HealOutcome> {
    if let Some(recovered) = try_fetch_strategy_ladder(store, fetchers, source).await? {
        return Ok(HealOutcome::Recovered(recovered));
    }

    if let Some(client) = ai {
        if let Some(recovered) = try_selector_repair(store, client, source, raw_html).await? {
            return Ok(HealOutcome::Recovered(recovered));
        }
    }

    store.increment_consecutive_failures(source.id).await?;
    Ok(HealOutcome::Failed)
}

async fn try_fetch_strategy_ladder(
    store: &Store,
    fetchers: &FetcherSet,
    source: &Source,
) -> Result<Option<ExtractedBatch>> {
    let Some(new_strategy) = store.check_and_heal_fetcher(source.id).await? else {
        return Ok(None);
    };

    info!(source_id = %source.id, strategy = ?new_strategy, "heal: bumped fetch strategy, retrying listing");

    let fetcher = fetchers.select(new_strategy);
    let response = match fetch_with_backoff(fetcher, &source.url, &[], RetryPolicy::default()).await {
        Ok(response) if !response.is_blocked() => response,
        _ => return Ok(None),
    };

    let fp = fingerprint(&response.html);
    let strategies = build_waterfall(&fp, &source.extraction_config);
    let batch = run_waterfall(&strategies, &response.html, &source.url, source.tier, MIN_CARDS_FOR_STRICT);

    Ok(batch.filter(|b| !b.cards.is_empty()))
}

async fn try_selector_repair<C: StructuredOutputClient>(
    store: &Store,
    client: &C,
    source: &Source,
    raw_html: &str,
) -> Result<Option<ExtractedBatch>> {
    let sample = truncate_chars(raw_html, MAX_HTML_SAMPLE_CHARS);
    let repair_id = store
        .log_repair_attempt(source.id, "zero_cards_extracted", sample, &source.extraction_config)
        .await?;

    let user_prompt = format!(
        "Current extraction_config: {}\n\nHTML sample:\n{}",
        source.extraction_config, sample
    );

    let repair: SelectorRepair = match client.extract(SELECTOR_REPAIR_SYSTEM_PROMPT, &user_prompt).await {
        Ok(repair) => repair,
        Err(error) => {
            warn!(source_id = %source.id, %error, "ai selector repair request failed");
            store.record_repair_validation(repair_id, false).await?;
            return Ok(None);
        }
    };

    let new_selectors = selector_repair_to_dom_selectors(&repair);
    let new_config = dom_selectors_to_config(&new_selectors);
    store.record_repair_diagnosis(repair_id, &repair.diagnosis, &new_config).await?;

    if repair.confidence < REPAIR_APPLY_THRESHOLD {
        store.record_repair_validation(repair_id, false).await?;
        info!(source_id = %source.id, confidence = repair.confidence, "ai selector repair below confidence threshold");
        return Ok(None);
    }

    let dom_strategy = DomStrategy::new(new_selectors);
    let cards = dom_strategy.parse_listing(raw_html, &source.url);
    if cards.is_empty() {
        store.record_repair_validation(repair_id, false).await?;
        return Ok(None);
    }

    store.record_repair_validation(repair_id, true).await?;
    store.persist_extraction_config(source.id, &new_config).await?;
    store.mark_repair_applied(repair_id).await?;
    store.reset_consecutive_failures(source.id).await?;

    Ok(Some(ExtractedBatch { method: ParsingMethod::HybridAi, cards }))
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
