use pipeline_extract::RawEventCard;
use pipeline_fetcher::{fetch_with_backoff, Fetcher, RetryPolicy};
use regex::Regex;
use tracing::warn;

/// Fetches detail pages for cards that didn't yield a time from the listing
/// page (§4.3 "deep scrape for missing times", `Tier::deep_scrape()`
/// sources only). Sequential, not parallel — `fetch_with_backoff` already
/// paces each request with `RetryPolicy`'s jittered delay, and detail pages
/// rarely outnumber a handful per batch.
///
/// Feeds the stripped detail-page text into `detail_page_time` rather than
/// attempting its own time parse — `cheap_normalize` already searches that
/// field combined with the description, so no change to the normalizer is
/// needed here.
pub async fn fill_missing_times(fetcher: &dyn Fetcher, cards: &mut [RawEventCard]) {
    let policy = RetryPolicy::default();

    for card in cards.iter_mut() {
        if card.detail_page_time.is_some() {
            continue;
        }
        let Some(url) = card.detail_url.clone() else { continue };

        match fetch_with_backoff(fetcher, &url, &[], policy.clone()).await {
            Ok(response) => {
                card.detail_page_time = Some(strip_tags(&response.html));
            }
            Err(error) => {
                warn!(url, %error, "deep scrape detail page fetch failed");
            }
        }
    }
}

fn strip_tags(html: &str) -> String {
    let tag_re = Regex::new("<[^>]+>").expect("static regex");
    let text = tag_re.replace_all(html, " ");
    let ws_re = Regex::new(r"\s+").expect("static regex");
    ws_re.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<div>Doors at   <strong>19:30</strong></div>";
        assert_eq!(strip_tags(html), "Doors at 19:30");
    }
}
