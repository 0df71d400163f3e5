use pipeline_ai::SelectorRepair;
use pipeline_extract::{
    DomSelectors, DomStrategy, ExtractionStrategy, FeedStrategy, Fingerprint, HydrationStrategy,
    JsonLdStrategy, StrategyKind,
};

/// Field order `SelectorRepair::selectors` is assumed to follow when the
/// healer hands back an unlabeled list rather than a tagged shape — matches
/// `DomSelectors`' own field order so `selectors[0]` is always the card
/// selector, same convention the teacher's CSV-ish config importers use for
/// positional fields.
const SELECTOR_FIELD_ORDER: usize = 7;

/// Builds the waterfall the worker runs against one listing page (§4.2/§4.3),
/// in the order the fingerprinter recommended, with `Dom` built from the
/// source's persisted `extraction_config`.
pub fn build_waterfall(
    fingerprint: &Fingerprint,
    extraction_config: &serde_json::Value,
) -> Vec<Box<dyn ExtractionStrategy>> {
    fingerprint
        .recommended_strategies
        .iter()
        .map(|kind| strategy_for(*kind, extraction_config))
        .collect()
}

fn strategy_for(kind: StrategyKind, extraction_config: &serde_json::Value) -> Box<dyn ExtractionStrategy> {
    match kind {
        StrategyKind::Hydration => Box::new(HydrationStrategy),
        StrategyKind::JsonLd => Box::new(JsonLdStrategy),
        StrategyKind::Feed => Box::new(FeedStrategy),
        StrategyKind::Dom => Box::new(DomStrategy::new(dom_selectors_from_config(extraction_config))),
    }
}

/// Reads `{"dom": {"card": ..., "title": ..., ...}}` out of `extraction_config`.
/// Missing or malformed config yields `DomSelectors::default()` (empty card
/// selector), which `DomStrategy::parse_listing` already treats as "no cards"
/// rather than an error.
pub fn dom_selectors_from_config(extraction_config: &serde_json::Value) -> DomSelectors {
    let dom = extraction_config.get("dom");
    let field = |name: &str| dom.and_then(|d| d.get(name)).and_then(|v| v.as_str()).map(str::to_string);

    DomSelectors {
        card: field("card").unwrap_or_default(),
        title: field("title"),
        date: field("date"),
        location: field("location"),
        description: field("description"),
        image_url: field("image_url"),
        detail_url: field("detail_url"),
    }
}

pub fn dom_selectors_to_config(selectors: &DomSelectors) -> serde_json::Value {
    serde_json::json!({
        "dom": {
            "card": selectors.card,
            "title": selectors.title,
            "date": selectors.date,
            "location": selectors.location,
            "description": selectors.description,
            "image_url": selectors.image_url,
            "detail_url": selectors.detail_url,
        }
    })
}

/// Maps the healer's flat `selectors` list onto `DomSelectors`' fields
/// positionally (card, title, date, location, description, image_url,
/// detail_url); a short list just leaves the trailing fields `None`.
pub fn selector_repair_to_dom_selectors(repair: &SelectorRepair) -> DomSelectors {
    let mut fields: Vec<Option<String>> =
        repair.selectors.iter().take(SELECTOR_FIELD_ORDER).cloned().map(Some).collect();
    fields.resize(SELECTOR_FIELD_ORDER, None);

    DomSelectors {
        card: fields[0].clone().unwrap_or_default(),
        title: fields[1].clone(),
        date: fields[2].clone(),
        location: fields[3].clone(),
        description: fields[4].clone(),
        image_url: fields[5].clone(),
        detail_url: fields[6].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dom_selectors_from_config() {
        let config = serde_json::json!({
            "dom": { "card": ".event", "title": ".event-title" }
        });
        let selectors = dom_selectors_from_config(&config);
        assert_eq!(selectors.card, ".event");
        assert_eq!(selectors.title.as_deref(), Some(".event-title"));
        assert_eq!(selectors.date, None);
    }

    #[test]
    fn missing_dom_key_yields_empty_card() {
        let selectors = dom_selectors_from_config(&serde_json::json!({}));
        assert!(selectors.card.is_empty());
    }

    #[test]
    fn repair_selectors_map_positionally() {
        let repair = SelectorRepair {
            selectors: vec![".card".to_string(), ".title".to_string()],
            recommended_strategy: "static".to_string(),
            diagnosis: "selectors drifted".to_string(),
            confidence: 0.8,
        };
        let selectors = selector_repair_to_dom_selectors(&repair);
        assert_eq!(selectors.card, ".card");
        assert_eq!(selectors.title.as_deref(), Some(".title"));
        assert_eq!(selectors.date, None);
    }
}
