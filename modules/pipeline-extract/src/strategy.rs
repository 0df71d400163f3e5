use async_trait::async_trait;
use pipeline_common::domain::Tier;
use pipeline_fetcher::{FetchResponse, Fetcher};
use tracing::{debug, info};

use crate::card::{ExtractedBatch, RawEventCard};
use crate::fingerprint::StrategyKind;

/// Small capability set every extraction strategy implements — an ordered
/// list of implementations, not an inheritance hierarchy (§9 Design Notes).
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Most strategies operate on the already-fetched listing HTML and
    /// return no extra URLs to discover; Feed overrides this to locate
    /// `/feed`, `.ics` links when the source tier allows feed-guessing.
    async fn discover_listing_urls(&self, _listing_html: &str, _base_url: &str) -> Vec<String> {
        Vec::new()
    }

    async fn fetch_listing(&self, fetcher: &dyn Fetcher, url: &str) -> anyhow::Result<FetchResponse> {
        fetcher
            .fetch(url, &[])
            .await
            .map_err(|e| anyhow::anyhow!("listing fetch failed for {url}: {e}"))
    }

    fn parse_listing(&self, html: &str, url: &str) -> Vec<RawEventCard>;
}

/// Runs strategies in fingerprinter-recommended order, stopping at the
/// first that yields at least one card — unless the source is an
/// `aggregator` with a strict completeness floor, in which case a partial
/// hit isn't good enough and the waterfall keeps going (§4.3).
pub async fn run_waterfall(
    strategies: &[Box<dyn ExtractionStrategy>],
    html: &str,
    url: &str,
    tier: Tier,
    min_cards_for_strict: usize,
) -> Option<ExtractedBatch> {
    let strict = matches!(tier, Tier::Aggregator);
    let mut last_non_empty: Option<ExtractedBatch> = None;

    for strategy in strategies {
        let cards = strategy.parse_listing(html, url);
        debug!(strategy = ?strategy.kind(), cards = cards.len(), url, "extraction strategy ran");

        if cards.is_empty() {
            continue;
        }

        let satisfies_strictness = !strict || cards.len() >= min_cards_for_strict;
        let batch = ExtractedBatch { method: method_for(strategy.kind()), cards };

        if satisfies_strictness {
            info!(strategy = ?strategy.kind(), url, "waterfall stopped, strategy satisfied strictness");
            return Some(batch);
        }

        last_non_empty = Some(batch);
    }

    last_non_empty
}

fn method_for(kind: StrategyKind) -> pipeline_common::domain::ParsingMethod {
    use pipeline_common::domain::ParsingMethod;
    match kind {
        StrategyKind::Hydration => ParsingMethod::Hydration,
        StrategyKind::JsonLd => ParsingMethod::JsonLd,
        StrategyKind::Feed => ParsingMethod::Feed,
        StrategyKind::Dom => ParsingMethod::Dom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_common::domain::ParsingMethod;

    struct FixedStrategy {
        kind: StrategyKind,
        cards: Vec<RawEventCard>,
    }

    #[async_trait]
    impl ExtractionStrategy for FixedStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn parse_listing(&self, _html: &str, _url: &str) -> Vec<RawEventCard> {
            self.cards.clone()
        }
    }

    fn card() -> RawEventCard {
        RawEventCard { title: Some("x".into()), ..Default::default() }
    }

    #[tokio::test]
    async fn stops_at_first_non_empty_strategy_for_non_aggregator() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(FixedStrategy { kind: StrategyKind::Hydration, cards: vec![] }),
            Box::new(FixedStrategy { kind: StrategyKind::JsonLd, cards: vec![card()] }),
            Box::new(FixedStrategy { kind: StrategyKind::Dom, cards: vec![card(), card()] }),
        ];

        let batch = run_waterfall(&strategies, "<html></html>", "https://x", Tier::Venue, 3)
            .await
            .unwrap();
        assert_eq!(batch.method, ParsingMethod::JsonLd);
        assert_eq!(batch.cards.len(), 1);
    }

    #[tokio::test]
    async fn aggregator_with_strict_floor_skips_partial_hits() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(FixedStrategy { kind: StrategyKind::JsonLd, cards: vec![card()] }),
            Box::new(FixedStrategy { kind: StrategyKind::Dom, cards: vec![card(), card(), card()] }),
        ];

        let batch = run_waterfall(&strategies, "<html></html>", "https://x", Tier::Aggregator, 3)
            .await
            .unwrap();
        assert_eq!(batch.method, ParsingMethod::Dom);
        assert_eq!(batch.cards.len(), 3);
    }

    #[tokio::test]
    async fn no_strategy_yields_cards_returns_none() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> =
            vec![Box::new(FixedStrategy { kind: StrategyKind::Dom, cards: vec![] })];
        assert!(run_waterfall(&strategies, "<html></html>", "https://x", Tier::Venue, 1).await.is_none());
    }
}
