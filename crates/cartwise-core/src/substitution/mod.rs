//! Product substitution engine
//!
//! For every purchased item the engine runs the same pipeline:
//!
//! ```text
//! name -> tokenize -> find_matches (catalog scan, Jaccard >= threshold)
//!      -> filter_matches (preference rules)
//!      -> rank_alternatives (cheapest store, strictly cheaper, top N)
//! ```
//!
//! and finally `aggregate` folds the per-item results into basket totals.
//! The engine holds no per-request state; one instance is shared by every
//! request through `Arc`.

mod aggregate;
mod matcher;
mod preferences;
mod ranker;
pub mod tokenizer;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::models::{AnalysisResult, PurchasedItem, Substitution, UserPreferences};

pub use aggregate::{aggregate, percentage_saved};
pub use matcher::{
    find_matches, jaccard_similarity, Match, CONFIDENT_MATCH_THRESHOLD,
    DEFAULT_SUBSTITUTION_THRESHOLD,
};
pub use preferences::{accepts, active_rules, filter_matches, PreferenceRule, RULES};
pub use ranker::{rank_alternatives, DEFAULT_MAX_ALTERNATIVES};
pub use tokenizer::{tokenize, TokenSet};

/// Finds cheaper catalog alternatives for purchased items
#[derive(Debug, Clone)]
pub struct SubstitutionEngine {
    catalog: Arc<Catalog>,
    threshold: f64,
    max_alternatives: usize,
}

impl SubstitutionEngine {
    /// Engine with the default threshold and alternative limit
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            threshold: DEFAULT_SUBSTITUTION_THRESHOLD,
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
        }
    }

    /// Engine tuned by `config`; the alternative limit is clamped to 1..=3
    pub fn with_config(catalog: Arc<Catalog>, config: &EngineConfig) -> Self {
        Self {
            catalog,
            threshold: config.threshold,
            max_alternatives: config.max_alternatives.clamp(1, DEFAULT_MAX_ALTERNATIVES),
        }
    }

    /// Load the configured catalog (falling back to empty) and build an engine
    pub fn from_config(config: &EngineConfig) -> Self {
        let catalog = Catalog::load(config.catalog_path.as_deref());
        Self::with_config(Arc::new(catalog), config)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_alternatives(&self) -> usize {
        self.max_alternatives
    }

    /// Ranked substitutions for a single purchased item
    pub fn find_substitutions(
        &self,
        item: &PurchasedItem,
        preferences: &UserPreferences,
    ) -> Vec<Substitution> {
        let tokens = tokenize(&item.name);
        let matches = find_matches(&tokens, &self.catalog, self.threshold);
        let allowed = filter_matches(&matches, preferences);
        let substitutions = rank_alternatives(item, &allowed, self.max_alternatives);

        debug!(
            item = %item.name,
            matched = matches.len(),
            allowed = allowed.len(),
            substitutions = substitutions.len(),
            "Ranked substitutions"
        );

        substitutions
    }

    /// Analyze a basket of validated items
    pub fn analyze(&self, items: &[PurchasedItem], preferences: &UserPreferences) -> AnalysisResult {
        let per_item = items
            .iter()
            .map(|item| self.find_substitutions(item, preferences))
            .collect();
        aggregate(items, per_item)
    }

    /// Analyze loosely-typed item records
    ///
    /// Records that are not valid purchased items are skipped with a warning
    /// and do not count towards the totals.
    pub fn analyze_values(&self, items: &[Value], preferences: &UserPreferences) -> AnalysisResult {
        let valid = parse_items(items);
        self.analyze(&valid, preferences)
    }
}

/// Validate raw item records, dropping the malformed ones
pub fn parse_items(items: &[Value]) -> Vec<PurchasedItem> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match PurchasedItem::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(index, "Skipping purchased item: {}", e);
                None
            }
        })
        .collect()
}
