const AGENDA_KEYWORDS: &[&str] = &["agenda", "evenement", "activiteit", "programma", "wat te doen"];

const MONTH_TOKENS: &[&str] = &[
    "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus", "september",
    "oktober", "november", "december",
];

/// Cheap pre-check before spending an LLM call (§4.10): does the fetched page
/// even look like an events listing? Looks for agenda-ish Dutch vocabulary
/// plus a Dutch month name, which together are a decent proxy for "this page
/// lists dated events" without parsing any markup.
pub fn looks_like_agenda(html: &str) -> bool {
    let lower = html.to_lowercase();
    let has_agenda_keyword = AGENDA_KEYWORDS.iter().any(|k| lower.contains(k));
    let has_date_token = MONTH_TOKENS.iter().any(|m| lower.contains(m));
    has_agenda_keyword && has_date_token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agenda_page_with_month_passes() {
        let html = "<html><body><h1>Evenementenagenda</h1><p>15 januari: Concert</p></body></html>";
        assert!(looks_like_agenda(html));
    }

    #[test]
    fn agenda_keyword_without_date_fails() {
        let html = "<html><body><h1>Onze agenda</h1><p>Neem contact op voor meer info.</p></body></html>";
        assert!(!looks_like_agenda(html));
    }

    #[test]
    fn date_token_without_agenda_keyword_fails() {
        let html = "<html><body><p>Wij zijn opgericht in januari 2010.</p></body></html>";
        assert!(!looks_like_agenda(html));
    }

    #[test]
    fn unrelated_page_fails() {
        let html = "<html><body><h1>Over ons</h1><p>Wij verkopen schoenen.</p></body></html>";
        assert!(!looks_like_agenda(html));
    }
}
