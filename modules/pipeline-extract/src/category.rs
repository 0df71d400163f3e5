use pipeline_common::domain::Category;

/// Dutch parenting vocabulary that always forces `Family`, ahead of every
/// other rule — the "Hybrid Life" override (§4.4 step 5, GLOSSARY).
const DUTCH_PARENTING_KEYWORDS: &[&str] = &[
    "peuter",
    "kleuter",
    "kinderfeestje",
    "kinderopvang",
    "ouder-kind",
    "ouder kind",
    "gezinsuitje",
    "gezinsactiviteit",
    "baby's",
    "babyzwemmen",
];

/// Adult-social vocabulary. Resolves to `Foodie` when paired with a food
/// keyword, `Social` otherwise.
const ADULT_SOCIAL_KEYWORDS: &[&str] =
    &["singles", "speeddate", "speed date", "borrel", "networking", "volwassenen only", "dating"];

const FOOD_KEYWORDS: &[&str] =
    &["food", "eten", "diner", "dinner", "wijn", "wine", "bier", "beer", "proeverij", "tasting", "culinair"];

struct CategoryRule {
    category: Category,
    keywords: &'static [&'static str],
}

/// Checked in order after the Dutch-parenting override and before the
/// `Community` default (§4.4 step 5: "otherwise match by keyword list per
/// category; default `community`").
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule { category: Category::Music, keywords: &["concert", "band", "dj", "live music", "festival"] },
    CategoryRule {
        category: Category::Gaming,
        keywords: &["gaming", "esports", "board game", "tabletop", "arcade"],
    },
    CategoryRule {
        category: Category::Workshops,
        keywords: &["workshop", "cursus", "class", "training", "seminar", "masterclass"],
    },
    CategoryRule {
        category: Category::Outdoors,
        keywords: &["hike", "wandeling", "park", "outdoor", "trail", "fietstocht", "bike ride"],
    },
    CategoryRule {
        category: Category::Entertainment,
        keywords: &["theater", "theatre", "cinema", "film", "comedy", "show"],
    },
    CategoryRule {
        category: Category::Active,
        keywords: &["run", "marathon", "yoga", "fitness", "sport", "workout"],
    },
    CategoryRule {
        category: Category::Family,
        keywords: &["family", "kids", "children", "toddler", "kinderen"],
    },
];

/// Rule-based Hybrid Life classifier (§4.4 step 5). Checks title,
/// description, and the strategy-supplied category hint together; never
/// returns an error — unmapped text always falls back to `Community`.
pub fn classify_category(title: &str, description: &str, category_hint: Option<&str>) -> Category {
    let combined = format!(
        "{} {} {}",
        title.to_lowercase(),
        description.to_lowercase(),
        category_hint.unwrap_or_default().to_lowercase()
    );

    if contains_any(&combined, DUTCH_PARENTING_KEYWORDS) {
        return Category::Family;
    }

    if contains_any(&combined, ADULT_SOCIAL_KEYWORDS) {
        return if contains_any(&combined, FOOD_KEYWORDS) {
            Category::Foodie
        } else {
            Category::Social
        };
    }

    for rule in CATEGORY_RULES {
        if contains_any(&combined, rule.keywords) {
            return rule.category;
        }
    }

    Category::Community
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dutch_parenting_keywords_force_family() {
        assert_eq!(classify_category("Peuter gymles", "voor de allerkleinsten", None), Category::Family);
    }

    #[test]
    fn adult_social_without_food_is_social() {
        assert_eq!(classify_category("Singles Borrel", "networking event", None), Category::Social);
    }

    #[test]
    fn adult_social_with_food_is_foodie() {
        assert_eq!(
            classify_category("Singles Wine Tasting", "borrel met proeverij", None),
            Category::Foodie
        );
    }

    #[test]
    fn keyword_rules_match_in_declared_order() {
        assert_eq!(classify_category("Outdoor Jazz Festival", "", None), Category::Music);
        assert_eq!(classify_category("Morning Yoga in the Park", "", None), Category::Active);
    }

    #[test]
    fn unmapped_text_defaults_to_community() {
        assert_eq!(classify_category("Neighborhood Meeting", "quarterly update", None), Category::Community);
    }

    #[test]
    fn category_hint_participates_in_matching() {
        assert_eq!(classify_category("Evening at the Hall", "", Some("board game night")), Category::Gaming);
    }
}
