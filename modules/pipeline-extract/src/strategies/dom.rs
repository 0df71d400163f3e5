use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::card::RawEventCard;
use crate::fingerprint::StrategyKind;
use crate::strategy::ExtractionStrategy;

/// Per-source CSS selectors for each field, read from `extraction_config`
/// (§3 Source). Universal fallback — works on any rendered markup, always
/// last in the waterfall.
#[derive(Debug, Clone, Default)]
pub struct DomSelectors {
    pub card: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub detail_url: Option<String>,
}

pub struct DomStrategy {
    selectors: DomSelectors,
}

impl DomStrategy {
    pub fn new(selectors: DomSelectors) -> Self {
        Self { selectors }
    }

    fn text_for(element: &scraper::ElementRef, selector: &Option<String>) -> Option<String> {
        let sel = selector.as_ref()?;
        let parsed = Selector::parse(sel).ok()?;
        let text: String = element.select(&parsed).next()?.text().collect::<Vec<_>>().join(" ");
        let trimmed = text.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    fn attr_for(element: &scraper::ElementRef, selector: &Option<String>, attr: &str) -> Option<String> {
        let sel = selector.as_ref()?;
        let parsed = Selector::parse(sel).ok()?;
        element.select(&parsed).next()?.value().attr(attr).map(str::to_string)
    }
}

#[async_trait]
impl ExtractionStrategy for DomStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dom
    }

    fn parse_listing(&self, html: &str, _url: &str) -> Vec<RawEventCard> {
        if self.selectors.card.is_empty() {
            return Vec::new();
        }
        let Ok(card_selector) = Selector::parse(&self.selectors.card) else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        document
            .select(&card_selector)
            .map(|card| {
                let raw_html = card.html();
                RawEventCard {
                    title: Self::text_for(&card, &self.selectors.title),
                    date: Self::text_for(&card, &self.selectors.date),
                    location: Self::text_for(&card, &self.selectors.location),
                    description: Self::text_for(&card, &self.selectors.description),
                    image_url: Self::attr_for(&card, &self.selectors.image_url, "src"),
                    detail_url: Self::attr_for(&card, &self.selectors.detail_url, "href"),
                    raw_html,
                    category_hint: None,
                    detail_page_time: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cards_by_selector() {
        let html = r#"
            <div class="agenda-card">
                <h3 class="title">Jazz Night</h3>
                <span class="date">2026-07-01</span>
                <a class="detail" href="/events/jazz-night">More</a>
            </div>
            <div class="agenda-card">
                <h3 class="title">Food Market</h3>
                <span class="date">2026-07-02</span>
                <a class="detail" href="/events/food-market">More</a>
            </div>
        "#;
        let strategy = DomStrategy::new(DomSelectors {
            card: ".agenda-card".to_string(),
            title: Some(".title".to_string()),
            date: Some(".date".to_string()),
            detail_url: Some(".detail".to_string()),
            ..Default::default()
        });

        let cards = strategy.parse_listing(html, "https://example.com");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title.as_deref(), Some("Jazz Night"));
        assert_eq!(cards[0].date.as_deref(), Some("2026-07-01"));
        assert_eq!(cards[0].detail_url.as_deref(), Some("/events/jazz-night"));
    }

    #[test]
    fn empty_selector_yields_no_cards() {
        let strategy = DomStrategy::new(DomSelectors::default());
        assert!(strategy.parse_listing("<div>x</div>", "https://example.com").is_empty());
    }
}
