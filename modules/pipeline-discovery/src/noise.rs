use std::collections::HashSet;
use std::sync::OnceLock;

/// Domains that show up constantly in search results but are never
/// themselves event-listing pages — social platforms, booking engines,
/// review aggregators, link shorteners. Filtered before a candidate ever
/// reaches the heuristic/LLM validation step.
const NOISE_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "linkedin.com",
    "youtube.com",
    "pinterest.com",
    "booking.com",
    "tripadvisor.com",
    "yelp.com",
    "wikipedia.org",
    "google.com",
    "goo.gl",
    "bit.ly",
    "t.co",
    "amazon.com",
    "amazon.nl",
];

fn noise_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| NOISE_DOMAINS.iter().copied().collect())
}

/// True when `url`'s host is a known noise domain (or a subdomain of one),
/// e.g. `m.facebook.com` and `www.booking.com` both match.
pub fn is_noise_domain(url: &str) -> bool {
    let Some(host) = url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
        return false;
    };
    noise_set().iter().any(|noise| host == *noise || host.ends_with(&format!(".{noise}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_domain_is_noise() {
        assert!(is_noise_domain("https://facebook.com/events/123"));
    }

    #[test]
    fn subdomain_is_noise() {
        assert!(is_noise_domain("https://www.booking.com/hotel/nl/foo.html"));
        assert!(is_noise_domain("https://m.facebook.com/somepage"));
    }

    #[test]
    fn real_agenda_site_is_not_noise() {
        assert!(!is_noise_domain("https://www.uitagendautrecht.nl/"));
    }

    #[test]
    fn unparseable_url_is_not_noise() {
        assert!(!is_noise_domain("not a url"));
    }
}
