use std::sync::Arc;

use async_trait::async_trait;
use pipeline_ai::{SocialFive, StructuredOutputClient};
use tracing::warn;

use crate::card::RawEventCard;
use crate::fingerprint::StrategyKind;
use crate::strategy::ExtractionStrategy;

const MAX_HTML_CHARS: usize = 25_000;
const JUNK_TITLE_MARKERS: &[&str] = &["unable to extract", "page not found", "error loading"];

const SYSTEM_PROMPT: &str = r#"You extract a list of community events from raw HTML. For each
distinct event, emit the Social Five: what (title), when (date/time as written), where (venue or
address), who (audience/host if stated, else empty string), and vibe (one-line tone/category hint).
Only emit real single events, never navigation, section headers, or "no events found" placeholders.
If you cannot identify any real events, return an empty list."#;

/// Last resort when every deterministic strategy yields nothing useful:
/// truncated HTML plus a strict structured-output schema (§4.3's "Social
/// Five"). LLM output is treated as untrusted — schema validation happens
/// in `pipeline-ai`, and junk placeholder titles are filtered here the same
/// way the teacher's `Extractor::extract` drops "unable to extract" rows.
pub struct AiStrategy<C: StructuredOutputClient> {
    client: Arc<C>,
}

impl<C: StructuredOutputClient> AiStrategy<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    fn truncate(html: &str) -> &str {
        if html.len() <= MAX_HTML_CHARS {
            return html;
        }
        let mut end = MAX_HTML_CHARS;
        while !html.is_char_boundary(end) {
            end -= 1;
        }
        &html[..end]
    }

    pub async fn extract(&self, html: &str, url: &str) -> anyhow::Result<Vec<RawEventCard>> {
        let truncated = Self::truncate(html);
        let user_prompt = format!("Source URL: {url}\n\n---\n\n{truncated}");

        #[derive(serde::Deserialize, schemars::JsonSchema)]
        struct Response {
            events: Vec<SocialFive>,
        }

        let response: Response = self.client.extract(SYSTEM_PROMPT, &user_prompt).await?;

        let cards = response
            .events
            .into_iter()
            .filter(|event| {
                let lower = event.what.to_lowercase();
                let is_junk = JUNK_TITLE_MARKERS.iter().any(|marker| lower.contains(marker));
                if is_junk {
                    warn!(url, title = event.what, "filtered junk AI-extracted event");
                }
                !is_junk
            })
            .map(|event| RawEventCard {
                title: Some(event.what),
                date: Some(event.when),
                location: Some(event.where_),
                description: (!event.who.is_empty()).then_some(event.who),
                raw_html: truncated.to_string(),
                image_url: event.image_url,
                detail_url: event.detail_url,
                category_hint: Some(event.vibe),
                detail_page_time: None,
            })
            .collect();

        Ok(cards)
    }
}

/// Non-waterfall member: the AI strategy needs an injected LLM client and
/// runs async-extract rather than the synchronous `parse_listing` the other
/// strategies implement, so `pipeline-worker` invokes `AiStrategy::extract`
/// directly once the waterfall comes back empty, instead of placing it in
/// `Vec<Box<dyn ExtractionStrategy>>`. This stub lets it still report its
/// `StrategyKind` for logging/telemetry parity with the other strategies.
pub struct AiStrategyMarker;

#[async_trait]
impl ExtractionStrategy for AiStrategyMarker {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dom
    }

    fn parse_listing(&self, _html: &str, _url: &str) -> Vec<RawEventCard> {
        Vec::new()
    }
}
