//! Preference filter
//!
//! Each dietary/budget flag maps to at most one predicate in `RULES`. A match
//! survives when it passes every rule whose flag the shopper enabled.
//!
//! `sulfateFree`, `vegetarian` and `budgetFocus` have no rule yet: they are
//! accepted and carried through the API, but do not filter anything. Adding a
//! rule for one of them is a new row in `RULES`.

use crate::catalog::CatalogEntry;
use crate::models::{PreferenceFlag, UserPreferences};

use super::matcher::Match;

/// Phrase used by value-range products in their display name
pub const VALUE_RANGE_PHRASE: &str = "everyday value";

/// Words marking products that usually contain gluten
pub const GLUTEN_WORDS: &[&str] = &["bread", "flour", "pasta"];

/// A filtering rule tied to one preference flag
pub struct PreferenceRule {
    pub flag: PreferenceFlag,
    /// Returns true when the entry is acceptable under this rule
    pub accepts: fn(&CatalogEntry) -> bool,
}

pub static RULES: &[PreferenceRule] = &[
    PreferenceRule {
        flag: PreferenceFlag::OrganicOnly,
        accepts: is_organic,
    },
    PreferenceRule {
        flag: PreferenceFlag::NoBrandSwaps,
        accepts: is_not_value_range,
    },
    PreferenceRule {
        flag: PreferenceFlag::GlutenFree,
        accepts: lacks_gluten_words,
    },
];

fn is_organic(entry: &CatalogEntry) -> bool {
    entry.normalized_name().contains("organic")
}

fn is_not_value_range(entry: &CatalogEntry) -> bool {
    !entry.normalized_name().contains(VALUE_RANGE_PHRASE) && !entry.is_generic_brand()
}

// Name-based heuristic only, not a nutritional guarantee
fn lacks_gluten_words(entry: &CatalogEntry) -> bool {
    let name = entry.normalized_name();
    !GLUTEN_WORDS.iter().any(|word| name.contains(word))
}

/// Rules switched on by these preferences
pub fn active_rules(preferences: &UserPreferences) -> Vec<&'static PreferenceRule> {
    RULES
        .iter()
        .filter(|rule| preferences.is_enabled(rule.flag))
        .collect()
}

/// Whether a single catalog entry satisfies the preferences
pub fn accepts(entry: &CatalogEntry, preferences: &UserPreferences) -> bool {
    RULES
        .iter()
        .filter(|rule| preferences.is_enabled(rule.flag))
        .all(|rule| (rule.accepts)(entry))
}

/// Matches that satisfy every active preference rule, in their original order
pub fn filter_matches<'a>(matches: &[Match<'a>], preferences: &UserPreferences) -> Vec<Match<'a>> {
    let rules = active_rules(preferences);
    matches
        .iter()
        .filter(|m| rules.iter().all(|rule| (rule.accepts)(m.entry)))
        .copied()
        .collect()
}
