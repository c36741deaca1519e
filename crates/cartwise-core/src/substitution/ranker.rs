//! Turns filtered matches into priced substitutions for one purchased item

use crate::models::{ItemSnapshot, PurchasedItem, Substitution};

use super::matcher::Match;

/// Substitutions kept per purchased item
pub const DEFAULT_MAX_ALTERNATIVES: usize = 3;

/// Brand marker that never becomes a tag
const GENERIC_TAG: &str = "generic";

/// Cheaper alternatives for `item`, best savings first, at most `limit`
///
/// Each match is priced at its cheapest store. Matches with no prices, or
/// whose cheapest price is not strictly below what was paid, are dropped.
pub fn rank_alternatives(
    item: &PurchasedItem,
    matches: &[Match<'_>],
    limit: usize,
) -> Vec<Substitution> {
    let mut substitutions: Vec<Substitution> = matches
        .iter()
        .filter_map(|m| price_alternative(item, m))
        .collect();

    substitutions.sort_by(|a, b| {
        b.savings
            .partial_cmp(&a.savings)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    substitutions.truncate(limit);
    substitutions
}

fn price_alternative(item: &PurchasedItem, m: &Match<'_>) -> Option<Substitution> {
    let entry = m.entry;
    let cheapest = entry.cheapest()?;
    if cheapest.price >= item.price {
        return None;
    }

    let quantity = entry
        .unit
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or(&item.quantity)
        .to_string();

    let tags = [
        entry.category.clone(),
        Some(cheapest.store.to_lowercase()),
        entry.brand.clone(),
    ]
    .into_iter()
    .flatten()
    .filter(|tag| !tag.is_empty() && tag != GENERIC_TAG)
    .collect();

    Some(Substitution {
        original: ItemSnapshot::from(item),
        alternative: ItemSnapshot {
            name: entry.name.clone(),
            price: cheapest.price,
            quantity,
            category: entry.category.clone().unwrap_or_default(),
        },
        store: cheapest.store.clone(),
        reason: format!(
            "Token-based match ({}% similarity) - cheaper at {}",
            (m.similarity * 100.0).round(),
            cheapest.store
        ),
        savings: item.price - cheapest.price,
        tags,
        item_index: 0,
    })
}
