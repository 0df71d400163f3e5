use regex::Regex;
use std::sync::LazyLock;

/// One of the extraction strategies the waterfall can run, in the order the
/// fingerprinter recommends them (§4.2). `Dom` is always last — it is the
/// universal fallback that works on any rendered markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Hydration,
    JsonLd,
    Feed,
    Dom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub cms: &'static str,
    pub version: Option<String>,
    pub confidence: u8,
    pub recommended_strategies: Vec<StrategyKind>,
    pub requires_js_render: bool,
    pub detected_data_sources: Vec<&'static str>,
}

struct CmsPattern {
    name: &'static str,
    requires_js_render: bool,
    /// (regex, weight)
    signatures: &'static [(&'static str, u32)],
}

/// Declaration order is the tie-break order (§4.2: "ties resolve to
/// earlier-defined CMS").
static CMS_PATTERNS: &[CmsPattern] = &[
    CmsPattern {
        name: "wordpress",
        requires_js_render: false,
        signatures: &[
            (r#"wp-content"#, 40),
            (r#"wp-includes"#, 30),
            (r#"name="generator"\s+content="WordPress"#, 50),
        ],
    },
    CmsPattern {
        name: "wix",
        requires_js_render: true,
        signatures: &[(r#"wix\.com"#, 40), (r#"wixstatic\.com"#, 40), (r#"_wixCIDX"#, 50)],
    },
    CmsPattern {
        name: "squarespace",
        requires_js_render: false,
        signatures: &[
            (r#"squarespace\.com"#, 40),
            (r#"static1\.squarespace\.com"#, 40),
            (r#"Squarespace\.afterBodyLoad"#, 50),
        ],
    },
    CmsPattern {
        name: "nextjs",
        requires_js_render: true,
        signatures: &[(r#"__NEXT_DATA__"#, 60), (r#"/_next/static"#, 30)],
    },
    CmsPattern {
        name: "nuxt",
        requires_js_render: true,
        signatures: &[(r#"__NUXT__"#, 60), (r#"/_nuxt/"#, 30)],
    },
    CmsPattern {
        name: "react",
        requires_js_render: true,
        signatures: &[(r#"__INITIAL_STATE__"#, 40), (r#"id="root">\s*</div>"#, 30)],
    },
    CmsPattern {
        name: "drupal",
        requires_js_render: false,
        signatures: &[(r#"Drupal\.settings"#, 50), (r#"/sites/default/files"#, 30)],
    },
    CmsPattern {
        name: "joomla",
        requires_js_render: false,
        signatures: &[(r#"name="generator"\s+content="Joomla"#, 50), (r#"/media/jui/"#, 30)],
    },
    CmsPattern {
        name: "shopify",
        requires_js_render: false,
        signatures: &[(r#"cdn\.shopify\.com"#, 50), (r#"Shopify\.shop"#, 40)],
    },
    CmsPattern {
        name: "webflow",
        requires_js_render: false,
        signatures: &[(r#"webflow\.com"#, 40), (r#"data-wf-site"#, 50)],
    },
];

static COMPILED: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    CMS_PATTERNS
        .iter()
        .map(|p| p.signatures.iter().map(|(pat, _)| Regex::new(pat).expect("valid CMS regex")).collect())
        .collect()
});

static JSON_LD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<script[^>]+type="application/ld\+json""#).unwrap());
static MICRODATA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"itemtype="[^"]*schema.org"#).unwrap());
static FEED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"type="application/(rss|atom)\+xml""#).unwrap());
static ICS_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\.ics(["'?]|$)"#).unwrap());

/// Pure CMS fingerprinting (§4.2): weighted regex signatures, highest total
/// weight wins, ties resolve to declaration order. Zero I/O, zero async —
/// directly unit-testable against HTML fixtures.
pub fn fingerprint(html: &str) -> Fingerprint {
    let mut best_idx: Option<usize> = None;
    let mut best_weight = 0u32;

    for (idx, pattern) in CMS_PATTERNS.iter().enumerate() {
        let total: u32 = pattern
            .signatures
            .iter()
            .zip(COMPILED[idx].iter())
            .filter(|((_, _), re)| re.is_match(html))
            .map(|((_, weight), _)| *weight)
            .sum();

        if total > best_weight {
            best_weight = total;
            best_idx = Some(idx);
        }
    }

    let has_json_ld = JSON_LD_RE.is_match(html) || MICRODATA_RE.is_match(html);
    let has_feed = FEED_LINK_RE.is_match(html) || ICS_LINK_RE.is_match(html);

    let mut detected_data_sources = Vec::new();
    if has_json_ld {
        detected_data_sources.push("json_ld");
    }
    if has_feed {
        detected_data_sources.push("feed");
    }

    match best_idx {
        Some(idx) => {
            let pattern = &CMS_PATTERNS[idx];
            let confidence = best_weight.min(200) as u8 / 2;
            let mut strategies = strategy_order_for(pattern.requires_js_render, has_json_ld, has_feed);
            ensure_dom_last(&mut strategies);

            Fingerprint {
                cms: pattern.name,
                version: None,
                confidence: confidence.min(100),
                recommended_strategies: strategies,
                requires_js_render: pattern.requires_js_render,
                detected_data_sources,
            }
        }
        None => {
            let mut strategies = strategy_order_for(false, has_json_ld, has_feed);
            ensure_dom_last(&mut strategies);
            Fingerprint {
                cms: "unknown",
                version: None,
                confidence: 0,
                recommended_strategies: strategies,
                requires_js_render: false,
                detected_data_sources,
            }
        }
    }
}

fn strategy_order_for(requires_js_render: bool, has_json_ld: bool, has_feed: bool) -> Vec<StrategyKind> {
    let mut strategies = Vec::new();
    if requires_js_render {
        strategies.push(StrategyKind::Hydration);
    }
    if has_json_ld {
        strategies.push(StrategyKind::JsonLd);
    }
    if has_feed {
        strategies.push(StrategyKind::Feed);
    }
    strategies
}

fn ensure_dom_last(strategies: &mut Vec<StrategyKind>) {
    strategies.retain(|s| *s != StrategyKind::Dom);
    strategies.push(StrategyKind::Dom);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordpress_site_is_detected() {
        let html = r#"<html><head><meta name="generator" content="WordPress 6.4"></head>
            <body><link href="/wp-content/themes/x/style.css"></body></html>"#;
        let fp = fingerprint(html);
        assert_eq!(fp.cms, "wordpress");
        assert!(fp.confidence > 0);
        assert_eq!(*fp.recommended_strategies.last().unwrap(), StrategyKind::Dom);
    }

    #[test]
    fn nextjs_hydration_is_detected_and_requires_render() {
        let html = r#"<html><body><script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#;
        let fp = fingerprint(html);
        assert_eq!(fp.cms, "nextjs");
        assert!(fp.requires_js_render);
        assert_eq!(fp.recommended_strategies.first(), Some(&StrategyKind::Hydration));
    }

    #[test]
    fn unknown_cms_falls_back_to_dom_only() {
        let html = "<html><body><p>hello</p></body></html>";
        let fp = fingerprint(html);
        assert_eq!(fp.cms, "unknown");
        assert_eq!(fp.recommended_strategies, vec![StrategyKind::Dom]);
    }

    #[test]
    fn json_ld_present_is_recommended_before_dom() {
        let html = r#"<html><body><script type="application/ld+json">{"@type":"Event"}</script></body></html>"#;
        let fp = fingerprint(html);
        assert!(fp.recommended_strategies.contains(&StrategyKind::JsonLd));
        assert_eq!(*fp.recommended_strategies.last().unwrap(), StrategyKind::Dom);
    }

    #[test]
    fn recommended_strategies_always_end_with_dom() {
        for html in [
            "<html></html>",
            r#"<script type="application/ld+json">{}</script>"#,
            r#"<script id="__NUXT__">{}</script>"#,
            r#"<link href="feed.rss" type="application/rss+xml">"#,
        ] {
            let fp = fingerprint(html);
            assert_eq!(*fp.recommended_strategies.last().unwrap(), StrategyKind::Dom);
        }
    }

    #[test]
    fn ties_resolve_to_earlier_declared_cms() {
        let html = r#"wp-content wix.com"#;
        let fp = fingerprint(html);
        assert_eq!(fp.cms, "wordpress");
    }
}
