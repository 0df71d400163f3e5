use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::card::RawEventCard;
use crate::fingerprint::StrategyKind;
use crate::strategy::ExtractionStrategy;

static NEXT_DATA_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script#__NEXT_DATA__"#).unwrap());
static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

/// Fields an object needs before we treat it as an event-shaped hydration
/// node, not just any JS-framework state blob.
const EVENT_SHAPE_KEYS: &[&str] =
    &["title", "name", "eventName", "startDate", "date", "eventDate"];

/// Locates `__NEXT_DATA__`, `__NUXT__`, `__INITIAL_STATE__` and other inline
/// JSON state blocks, then walks the tree looking for arrays of
/// event-shaped objects (§4.3).
pub struct HydrationStrategy;

#[async_trait]
impl ExtractionStrategy for HydrationStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hydration
    }

    fn parse_listing(&self, html: &str, _url: &str) -> Vec<RawEventCard> {
        let document = Html::parse_document(html);
        let mut cards = Vec::new();

        for script in document.select(&NEXT_DATA_SELECTOR) {
            let text = script.text().collect::<Vec<_>>().join("");
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                walk_for_event_arrays(&value, &text, &mut cards);
            }
        }

        if cards.is_empty() {
            for script in document.select(&SCRIPT_SELECTOR) {
                let inline = script.inner_html();
                for marker in ["__NUXT__", "__INITIAL_STATE__"] {
                    if let Some(json_text) = extract_assignment_json(&inline, marker) {
                        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&json_text) {
                            walk_for_event_arrays(&value, &json_text, &mut cards);
                        }
                    }
                }
            }
        }

        cards
    }
}

/// `window.__NUXT__={...};` style assignments aren't valid standalone JSON —
/// pull out the object/array literal after the `=`.
fn extract_assignment_json(script_text: &str, marker: &str) -> Option<String> {
    let pos = script_text.find(marker)?;
    let after = &script_text[pos + marker.len()..];
    let eq = after.find('=')?;
    let rest = after[eq + 1..].trim_start();
    let start_char = rest.chars().next()?;
    if start_char != '{' && start_char != '[' {
        return None;
    }

    let (open, close) = if start_char == '{' { ('{', '}') } else { ('[', ']') };
    let mut depth = 0i32;
    let mut end = None;
    for (idx, ch) in rest.char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                end = Some(idx + ch.len_utf8());
                break;
            }
        }
    }

    end.map(|e| rest[..e].to_string())
}

fn walk_for_event_arrays(value: &serde_json::Value, raw_html: &str, out: &mut Vec<RawEventCard>) {
    match value {
        serde_json::Value::Array(items) => {
            let event_like = items.iter().filter(|v| looks_event_shaped(v)).count();
            if event_like > 0 && event_like == items.len() {
                for item in items {
                    out.push(RawEventCard::from_value(item, raw_html));
                }
                return;
            }
            for item in items {
                walk_for_event_arrays(item, raw_html, out);
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                walk_for_event_arrays(v, raw_html, out);
            }
        }
        _ => {}
    }
}

fn looks_event_shaped(value: &serde_json::Value) -> bool {
    let serde_json::Value::Object(map) = value else { return false };
    EVENT_SHAPE_KEYS.iter().any(|key| map.contains_key(*key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_events_in_next_data() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">
            {"props":{"pageProps":{"events":[
                {"title":"Jazz Night","date":"2026-07-01"},
                {"title":"Food Market","date":"2026-07-02"}
            ]}}}
        </script>"#;
        let cards = HydrationStrategy.parse_listing(html, "https://x");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title.as_deref(), Some("Jazz Night"));
    }

    #[test]
    fn finds_events_in_nuxt_assignment() {
        let html = r#"<script>window.__NUXT__={"data":{"events":[{"name":"A","startDate":"2026-07-01"}]}};</script>"#;
        let cards = HydrationStrategy.parse_listing(html, "https://x");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn ignores_non_event_shaped_arrays() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">
            {"props":{"nav":[{"label":"Home"},{"label":"About"}]}}
        </script>"#;
        assert!(HydrationStrategy.parse_listing(html, "https://x").is_empty());
    }
}
