/// Canonicalizes a discovered URL (§4.10): drops the fragment, strips a
/// trailing slash from the path, lowercases the host. Query strings are
/// preserved — some agenda sites encode the listing filter there. Returns
/// `None` for URLs that don't parse.
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut url = url::Url::parse(raw).ok()?;
    url.set_fragment(None);

    if url.path().len() > 1 && url.path().ends_with('/') {
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_fragment() {
        assert_eq!(
            canonicalize_url("https://example.com/agenda#section").unwrap(),
            "https://example.com/agenda"
        );
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(
            canonicalize_url("https://example.com/agenda/").unwrap(),
            "https://example.com/agenda"
        );
    }

    #[test]
    fn preserves_root_slash() {
        assert_eq!(canonicalize_url("https://example.com/").unwrap(), "https://example.com/");
    }

    #[test]
    fn preserves_query_string() {
        assert_eq!(
            canonicalize_url("https://example.com/agenda?maand=januari").unwrap(),
            "https://example.com/agenda?maand=januari"
        );
    }

    #[test]
    fn combines_trailing_slash_query_and_fragment() {
        assert_eq!(
            canonicalize_url("https://example.com/agenda/?maand=januari#top").unwrap(),
            "https://example.com/agenda?maand=januari"
        );
    }

    #[test]
    fn unparseable_url_is_none() {
        assert!(canonicalize_url("not a url").is_none());
    }
}
