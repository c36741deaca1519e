//! Token-overlap similarity between a purchased item and catalog products

use crate::catalog::{Catalog, CatalogEntry};

use super::tokenizer::TokenSet;

/// Threshold used when searching for substitutes
///
/// Deliberately loose: the preference filter and the price comparison prune
/// most false positives downstream.
pub const DEFAULT_SUBSTITUTION_THRESHOLD: f64 = 0.2;

/// Threshold for treating a catalog entry as the same product
pub const CONFIDENT_MATCH_THRESHOLD: f64 = 0.3;

/// A catalog entry paired with its similarity to a query
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub entry: &'a CatalogEntry,
    pub similarity: f64,
}

/// Jaccard index of two token sets: |A ∩ B| / |A ∪ B|
///
/// Zero when either set is empty.
pub fn jaccard_similarity(a: &TokenSet, b: &TokenSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    intersection as f64 / union as f64
}

/// Catalog entries whose similarity to `query` is at least `threshold`
///
/// Sorted by similarity, highest first. Equal scores keep catalog order.
pub fn find_matches<'a>(query: &TokenSet, catalog: &'a Catalog, threshold: f64) -> Vec<Match<'a>> {
    if query.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<Match<'a>> = catalog
        .entries()
        .iter()
        .filter_map(|entry| {
            let similarity = jaccard_similarity(query, &entry.tokens);
            (similarity >= threshold).then_some(Match { entry, similarity })
        })
        .collect();

    // sort_by is stable, so ties stay in catalog order
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::tokenizer::tokenize;

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("a", "Dentyl Active Toothpaste"),
            CatalogEntry::new("b", "Colgate Toothpaste"),
            CatalogEntry::new("c", "Semi Skimmed Milk"),
            CatalogEntry::new("d", "Everyday Value Toothpaste"),
        ])
    }

    #[test]
    fn test_jaccard_identical_sets() {
        let a = tokenize("Colgate Toothpaste");
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_jaccard_empty_sets() {
        let empty = TokenSet::new();
        let a = tokenize("milk");
        assert_eq!(jaccard_similarity(&empty, &a), 0.0);
        assert_eq!(jaccard_similarity(&a, &empty), 0.0);
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        let a = tokenize("Colgate Toothpaste");
        let b = tokenize("Dentyl Active Toothpaste");
        // 1 shared token out of 4 distinct
        assert!((jaccard_similarity(&a, &b) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let names = [
            "Colgate Toothpaste",
            "Dentyl Active Toothpaste",
            "Semi Skimmed Milk 2L",
            "Organic Semi Skimmed Milk",
            "",
            "milk",
        ];
        for x in &names {
            for y in &names {
                let (a, b) = (tokenize(x), tokenize(y));
                assert_eq!(jaccard_similarity(&a, &b), jaccard_similarity(&b, &a));
            }
        }
    }

    #[test]
    fn test_jaccard_one_only_for_identical_sets() {
        let a = tokenize("Semi Skimmed Milk");
        let b = tokenize("Semi Skimmed Milk 2L");
        assert!(jaccard_similarity(&a, &b) < 1.0);
        assert_eq!(jaccard_similarity(&a, &tokenize("milk skimmed semi")), 1.0);
    }

    #[test]
    fn test_find_matches_ranked_by_similarity() {
        let catalog = catalog();
        let matches = find_matches(&tokenize("Colgate Toothpaste"), &catalog, 0.2);
        let keys: Vec<&str> = matches.iter().map(|m| m.entry.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "d"]);
        assert_eq!(matches[0].similarity, 1.0);
    }

    #[test]
    fn test_find_matches_ties_keep_catalog_order() {
        let catalog = catalog();
        let matches = find_matches(&tokenize("Toothpaste"), &catalog, 0.2);
        let keys: Vec<&str> = matches.iter().map(|m| m.entry.key.as_str()).collect();
        // "b" (1/2) first, then "a" and "d" tie at 1/3 in catalog order
        assert_eq!(keys, vec!["b", "a", "d"]);
    }

    #[test]
    fn test_find_matches_threshold_is_inclusive() {
        let catalog = catalog();
        let query = tokenize("Colgate Toothpaste");
        let at = find_matches(&query, &catalog, 0.25);
        assert!(at.iter().any(|m| m.entry.key == "a"));
        let above = find_matches(&query, &catalog, CONFIDENT_MATCH_THRESHOLD);
        assert!(!above.iter().any(|m| m.entry.key == "a"));
    }

    #[test]
    fn test_find_matches_empty_query_or_catalog() {
        assert!(find_matches(&TokenSet::new(), &catalog(), 0.0).is_empty());
        assert!(find_matches(&tokenize("milk"), &Catalog::empty(), 0.0).is_empty());
    }
}
