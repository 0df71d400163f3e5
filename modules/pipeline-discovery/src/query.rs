/// Discovery search templates, one per municipality (§4.10). Dutch agenda
/// sites overwhelmingly use "agenda" or "evenementen" in their own copy, so
/// templating on those terms surfaces them ahead of generic event listings.
const TEMPLATES: &[&str] = &[
    "uitagenda {city}",
    "evenementen {city}",
    "agenda {city}",
    "wat te doen {city}",
    "activiteiten {city}",
];

/// Renders the fixed template set for one municipality.
pub fn generate_queries(municipality: &str) -> Vec<String> {
    TEMPLATES.iter().map(|t| t.replace("{city}", municipality)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_query_per_template() {
        let queries = generate_queries("Utrecht");
        assert_eq!(queries.len(), TEMPLATES.len());
        assert!(queries.contains(&"uitagenda Utrecht".to_string()));
        assert!(queries.contains(&"evenementen Utrecht".to_string()));
    }

    #[test]
    fn substitutes_municipality_with_spaces() {
        let queries = generate_queries("Den Haag");
        assert!(queries.iter().any(|q| q == "agenda Den Haag"));
    }
}
