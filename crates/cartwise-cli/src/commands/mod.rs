//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Substitutions for items read from a JSON file
//! - `catalog` - Catalog stats and search
//! - `receipt` - Receipt photo extraction followed by analysis
//! - `serve` - Web server command

pub mod analyze;
pub mod catalog;
pub mod receipt;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use catalog::*;
pub use receipt::*;
pub use serve::*;

use std::path::Path;

use anyhow::{Context, Result};
use cartwise_core::{AnalysisResult, EngineConfig, SubstitutionEngine};

/// Build the engine from the config file chain, with `--catalog` taking precedence
pub fn build_engine(config_path: Option<&Path>, catalog: Option<&Path>) -> Result<SubstitutionEngine> {
    let mut config = EngineConfig::load(config_path).context("Failed to load engine config")?;
    if let Some(path) = catalog {
        config.catalog_path = Some(path.to_path_buf());
    }
    Ok(SubstitutionEngine::from_config(&config))
}

/// Print an analysis either as pretty JSON or as a human-readable report
pub fn print_result(result: &AnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", render_result(result));
    }
    Ok(())
}

/// Human-readable analysis report
pub fn render_result(result: &AnalysisResult) -> String {
    let mut out = String::new();

    if result.substitutions.is_empty() {
        out.push_str("\nNo cheaper alternatives found.\n");
    } else {
        out.push_str(&format!(
            "\n💡 {} cheaper alternative(s)\n",
            result.substitutions.len()
        ));
        out.push_str(&format!("{}\n", "─".repeat(70)));

        let mut current = None;
        for sub in &result.substitutions {
            if current != Some(sub.item_index) {
                current = Some(sub.item_index);
                out.push_str(&format!(
                    "\n  {} (£{:.2})\n",
                    sub.original.name, sub.original.price
                ));
            }
            out.push_str(&format!(
                "    → {:<40} £{:>6.2} at {:<12} save £{:.2}\n",
                truncate(&sub.alternative.name, 40),
                sub.alternative.price,
                sub.store,
                sub.savings
            ));
        }
    }

    out.push_str(&format!("{}\n", "─".repeat(70)));
    out.push_str(&format!("  Spent:            £{:.2}\n", result.total_original));
    out.push_str(&format!(
        "  Potential saving: £{:.2} ({:.2}%)\n",
        result.total_savings, result.percentage_saved
    ));
    out
}

/// Truncate a string to a maximum number of characters
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
