//! Product name tokenizer

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Set of lower-cased word tokens for one product name
pub type TokenSet = BTreeSet<String>;

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid regex"))
}

/// Split a free-text product name into its token set
///
/// Punctuation becomes a word boundary, so "Semi-Skimmed" yields
/// `{"semi", "skimmed"}`. Empty or punctuation-only input yields an empty set.
pub fn tokenize(text: &str) -> TokenSet {
    let lowered = text.to_lowercase();
    non_word()
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
