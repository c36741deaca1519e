//! Basket-level totals

use crate::models::{AnalysisResult, PurchasedItem, Substitution};

/// Combine per-item substitutions into one result
///
/// `per_item` is expected in the same order as `items`; substitutions are
/// concatenated in that order. Every item counts towards the total, whether or
/// not it produced a substitution.
pub fn aggregate(items: &[PurchasedItem], per_item: Vec<Vec<Substitution>>) -> AnalysisResult {
    let total_original: f64 = items.iter().map(|item| item.price).sum();
    let substitutions: Vec<Substitution> = per_item
        .into_iter()
        .enumerate()
        .flat_map(|(index, subs)| {
            subs.into_iter().map(move |mut sub| {
                sub.item_index = index;
                sub
            })
        })
        .collect();
    let total_savings: f64 = substitutions.iter().map(|s| s.savings).sum();

    AnalysisResult {
        total_original,
        total_savings,
        percentage_saved: percentage_saved(total_savings, total_original),
        substitutions,
    }
}

/// Savings as a percentage of the total, to 2 decimal places
///
/// Zero when nothing was spent.
pub fn percentage_saved(total_savings: f64, total_original: f64) -> f64 {
    if total_original > 0.0 {
        round_2dp(total_savings / total_original * 100.0)
    } else {
        0.0
    }
}

// Half away from zero; inputs here are never negative
fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
