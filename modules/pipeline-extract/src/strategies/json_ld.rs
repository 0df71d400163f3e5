use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::card::RawEventCard;
use crate::fingerprint::StrategyKind;
use crate::strategy::ExtractionStrategy;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static ITEMSCOPE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemtype*="schema.org"]"#).unwrap());

/// Parses `<script type="application/ld+json">` blocks (filtering `@type:
/// Event`, including `@graph` wrappers and top-level arrays) plus Microdata
/// `itemtype` scopes (§4.3).
pub struct JsonLdStrategy;

#[async_trait]
impl ExtractionStrategy for JsonLdStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::JsonLd
    }

    fn parse_listing(&self, html: &str, _url: &str) -> Vec<RawEventCard> {
        let document = Html::parse_document(html);
        let mut cards = Vec::new();

        for script in document.select(&SCRIPT_SELECTOR) {
            let text = script.text().collect::<Vec<_>>().join("");
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else { continue };
            collect_event_objects(&value, &text, &mut cards);
        }

        for scope in document.select(&ITEMSCOPE_SELECTOR) {
            let itemtype = scope.value().attr("itemtype").unwrap_or_default();
            if !itemtype.to_lowercase().contains("event") {
                continue;
            }
            cards.push(microdata_card(&scope));
        }

        cards
    }
}

fn collect_event_objects(value: &serde_json::Value, raw_html: &str, out: &mut Vec<RawEventCard>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_event_objects(item, raw_html, out);
            }
        }
        serde_json::Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_event_objects(graph, raw_html, out);
                return;
            }
            if is_event_type(map.get("@type")) {
                out.push(event_card_from_json_ld(value, raw_html));
            }
        }
        _ => {}
    }
}

fn is_event_type(type_field: Option<&serde_json::Value>) -> bool {
    match type_field {
        Some(serde_json::Value::String(s)) => s.to_lowercase().contains("event"),
        Some(serde_json::Value::Array(items)) => {
            items.iter().any(|v| matches!(v, serde_json::Value::String(s) if s.to_lowercase().contains("event")))
        }
        _ => false,
    }
}

fn event_card_from_json_ld(value: &serde_json::Value, raw_html: &str) -> RawEventCard {
    let mut card = RawEventCard::from_value(value, raw_html);

    if card.location.is_none() {
        card.location = value
            .get("location")
            .and_then(|loc| loc.get("name").or(loc.get("address")))
            .and_then(|v| v.as_str())
            .map(str::to_string);
    }

    if card.date.is_none() {
        card.date = value.get("startDate").and_then(|v| v.as_str()).map(str::to_string);
    }

    card
}

fn microdata_card(scope: &scraper::ElementRef) -> RawEventCard {
    let field = |prop: &str| -> Option<String> {
        let selector = Selector::parse(&format!("[itemprop=\"{prop}\"]")).ok()?;
        scope.select(&selector).next().and_then(|el| {
            el.value()
                .attr("content")
                .map(str::to_string)
                .or_else(|| el.value().attr("datetime").map(str::to_string))
                .or_else(|| {
                    let text = el.text().collect::<Vec<_>>().join(" ");
                    let trimmed = text.trim().to_string();
                    (!trimmed.is_empty()).then_some(trimmed)
                })
        })
    };

    RawEventCard {
        title: field("name"),
        date: field("startDate"),
        location: field("location"),
        description: field("description"),
        raw_html: scope.html(),
        image_url: field("image"),
        detail_url: field("url"),
        category_hint: None,
        detail_page_time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_event_block() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@type":"Event","name":"Jazz Night","startDate":"2026-07-01"}
        </script>"#;
        let cards = JsonLdStrategy.parse_listing(html, "https://x");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title.as_deref(), Some("Jazz Night"));
        assert_eq!(cards[0].date.as_deref(), Some("2026-07-01"));
    }

    #[test]
    fn parses_graph_wrapper_and_array() {
        let html = r#"<script type="application/ld+json">
            {"@graph":[
                {"@type":"Event","name":"A"},
                {"@type":"WebPage","name":"ignored"},
                {"@type":"Event","name":"B"}
            ]}
        </script>"#;
        let cards = JsonLdStrategy.parse_listing(html, "https://x");
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn ignores_non_event_types() {
        let html = r#"<script type="application/ld+json">{"@type":"Organization","name":"Acme"}</script>"#;
        assert!(JsonLdStrategy.parse_listing(html, "https://x").is_empty());
    }

    #[test]
    fn parses_microdata_event_scope() {
        let html = r#"
            <div itemscope itemtype="https://schema.org/Event">
                <span itemprop="name">Food Market</span>
                <time itemprop="startDate" datetime="2026-07-02">July 2</time>
            </div>
        "#;
        let cards = JsonLdStrategy.parse_listing(html, "https://x");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title.as_deref(), Some("Food Market"));
        assert_eq!(cards[0].date.as_deref(), Some("2026-07-02"));
    }
}
