use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::card::RawEventCard;
use crate::fingerprint::StrategyKind;
use crate::strategy::ExtractionStrategy;

static FEED_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[type="application/rss+xml"], link[type="application/atom+xml"]"#).unwrap()
});
static ICS_ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Maximum occurrences expanded from a single recurring (`RRULE`) VEVENT —
/// agenda ICS feeds can recur indefinitely; the worker re-scrapes on its own
/// cadence so a bounded window is enough to seed near-term events.
const MAX_RECURRENCE_OCCURRENCES: usize = 12;

/// Parses already-fetched feed bodies (RSS/Atom via `feed-rs`, ICS/webcal
/// hand-parsed with `rrule` expansion for recurring `VEVENT`s). Listing-page
/// discovery (`discover_listing_urls`) finds the feed/ICS link itself; the
/// caller fetches it and passes the feed body to `parse_listing` (§4.3,
/// tier `feedGuessing`).
pub struct FeedStrategy;

#[async_trait]
impl ExtractionStrategy for FeedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Feed
    }

    async fn discover_listing_urls(&self, listing_html: &str, base_url: &str) -> Vec<String> {
        let Ok(base) = Url::parse(base_url) else { return Vec::new() };
        let document = Html::parse_document(listing_html);
        let mut urls = Vec::new();

        for link in document.select(&FEED_LINK_SELECTOR) {
            if let Some(href) = link.value().attr("href") {
                if let Ok(resolved) = base.join(href) {
                    urls.push(resolved.to_string());
                }
            }
        }

        for anchor in document.select(&ICS_ANCHOR_SELECTOR) {
            if let Some(href) = anchor.value().attr("href") {
                if href.ends_with(".ics") || href.starts_with("webcal:") {
                    let normalized = href.replacen("webcal:", "https:", 1);
                    if let Ok(resolved) = base.join(&normalized) {
                        urls.push(resolved.to_string());
                    }
                }
            }
        }

        urls
    }

    fn parse_listing(&self, html: &str, _url: &str) -> Vec<RawEventCard> {
        if let Ok(feed) = feed_rs::parser::parse(html.as_bytes()) {
            return feed
                .entries
                .into_iter()
                .map(|entry| {
                    let title = entry.title.map(|t| t.content);
                    let date = entry
                        .published
                        .or(entry.updated)
                        .map(|dt| dt.to_rfc3339());
                    let description = entry.summary.map(|s| s.content);
                    let detail_url = entry.links.into_iter().next().map(|l| l.href);

                    RawEventCard {
                        title,
                        date,
                        location: None,
                        description,
                        raw_html: html.to_string(),
                        image_url: None,
                        detail_url,
                        category_hint: None,
                        detail_page_time: None,
                    }
                })
                .collect();
        }

        parse_ics(html)
    }
}

fn parse_ics(body: &str) -> Vec<RawEventCard> {
    let mut cards = Vec::new();
    for block in body.split("BEGIN:VEVENT").skip(1) {
        let Some(end) = block.find("END:VEVENT") else { continue };
        let vevent = &block[..end];
        cards.extend(card_from_vevent(vevent));
    }
    cards
}

fn card_from_vevent(vevent: &str) -> Vec<RawEventCard> {
    let field = |prefix: &str| -> Option<String> {
        vevent.lines().find_map(|line| {
            let line = line.trim();
            line.split_once(':').and_then(|(key, value)| {
                let base_key = key.split(';').next().unwrap_or(key);
                (base_key.eq_ignore_ascii_case(prefix)).then(|| unescape_ics(value))
            })
        })
    };

    let summary = field("SUMMARY");
    let dtstart = field("DTSTART");
    let location = field("LOCATION");
    let description = field("DESCRIPTION");
    let url = field("URL");
    let rrule_line = vevent.lines().map(str::trim).find(|l| l.starts_with("RRULE:"));

    let base_card = RawEventCard {
        title: summary,
        date: dtstart.clone(),
        location,
        description,
        raw_html: format!("BEGIN:VEVENT{vevent}END:VEVENT"),
        image_url: None,
        detail_url: url,
        category_hint: None,
        detail_page_time: None,
    };

    let (Some(rule_str), Some(dtstart)) = (rrule_line, dtstart.as_deref()) else {
        return vec![base_card];
    };

    expand_recurrence(&base_card, rule_str, dtstart).unwrap_or_else(|| vec![base_card])
}

fn expand_recurrence(base: &RawEventCard, rrule_line: &str, dtstart: &str) -> Option<Vec<RawEventCard>> {
    use rrule::RRuleSet;

    // Re-assemble a minimal iCalendar fragment so `rrule` parses DTSTART and
    // RRULE together, rather than reaching into its unstable builder API.
    let spec = format!("DTSTART:{dtstart}\n{rrule_line}");
    let rule_set: RRuleSet = spec.parse().ok()?;
    let (occurrences, _) = rule_set.all(MAX_RECURRENCE_OCCURRENCES as u16);

    if occurrences.is_empty() {
        return None;
    }

    Some(
        occurrences
            .into_iter()
            .map(|occ| RawEventCard { date: Some(occ.to_rfc3339()), ..base.clone() })
            .collect(),
    )
}

fn unescape_ics(value: &str) -> String {
    value.replace("\\,", ",").replace("\\;", ";").replace("\\n", " ").replace("\\N", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rss_entries() {
        let xml = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
            <item><title>Jazz Night</title><link>https://x.example/jazz</link>
            <pubDate>Mon, 01 Jun 2026 20:00:00 GMT</pubDate></item>
        </channel></rss>"#;
        let cards = FeedStrategy.parse_listing(xml, "https://x.example/feed");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title.as_deref(), Some("Jazz Night"));
    }

    #[test]
    fn parses_single_ics_vevent() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Food Market\r\nDTSTART:20260702T090000Z\r\nLOCATION:Market Square\r\nEND:VEVENT\r\nEND:VCALENDAR";
        let cards = parse_ics(ics);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title.as_deref(), Some("Food Market"));
        assert_eq!(cards[0].location.as_deref(), Some("Market Square"));
    }

    #[test]
    fn expands_recurring_vevent() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:Weekly Market\r\nDTSTART:20260601T090000Z\r\nRRULE:FREQ=WEEKLY;COUNT=3\r\nEND:VEVENT\r\nEND:VCALENDAR";
        let cards = parse_ics(ics);
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().all(|c| c.title.as_deref() == Some("Weekly Market")));
    }

    #[tokio::test]
    async fn discovers_feed_and_ics_links() {
        let html = r#"<html><head>
            <link rel="alternate" type="application/rss+xml" href="/events.rss">
        </head><body><a href="/calendar/agenda.ics">Download ICS</a></body></html>"#;
        let urls = FeedStrategy.discover_listing_urls(html, "https://x.example").await;
        assert!(urls.iter().any(|u| u.ends_with("events.rss")));
        assert!(urls.iter().any(|u| u.ends_with("agenda.ics")));
    }
}
