//! Catalog inspection commands

use anyhow::{bail, Result};
use cartwise_core::{find_matches, tokenize, SubstitutionEngine};

use super::truncate;

/// Show catalog size, stores and category count
pub fn cmd_catalog_stats(engine: &SubstitutionEngine) -> Result<()> {
    let stats = engine.catalog().stats();

    println!("\n📦 Catalog");
    println!("{}", "─".repeat(50));
    println!("  Products:   {}", stats.entries);
    println!("  Categories: {}", stats.categories);
    println!("  Stores:     {}", stats.stores.join(", "));
    println!();
    Ok(())
}

/// Search the catalog by token similarity
pub fn cmd_catalog_search(
    engine: &SubstitutionEngine,
    query: &str,
    threshold: f64,
    limit: usize,
) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        bail!("Threshold must be in (0, 1], got {}", threshold);
    }

    let tokens = tokenize(query);
    if tokens.is_empty() {
        bail!("Query has no searchable words: {:?}", query);
    }

    let matches = find_matches(&tokens, engine.catalog(), threshold);
    if matches.is_empty() {
        println!("No catalog products match '{}' at {:.2}", query, threshold);
        return Ok(());
    }

    println!("\n🔎 {} match(es) for '{}'", matches.len(), query);
    println!("{}", "─".repeat(70));
    for m in matches.iter().take(limit) {
        let cheapest = m
            .entry
            .cheapest()
            .map(|p| format!("£{:.2} at {}", p.price, p.store))
            .unwrap_or_else(|| "no prices".to_string());
        println!(
            "  {:>3.0}%  {:<40} {}",
            m.similarity * 100.0,
            truncate(&m.entry.name, 40),
            cheapest
        );
    }
    println!();
    Ok(())
}
