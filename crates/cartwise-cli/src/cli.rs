//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use cartwise_core::{UserPreferences, CONFIDENT_MATCH_THRESHOLD};

/// Cartwise - Find cheaper alternatives for your groceries
#[derive(Parser)]
#[command(name = "cartwise")]
#[command(about = "Grocery receipt substitution finder", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Product catalog JSON (defaults to the bundled sample catalog)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Engine config TOML (threshold, max alternatives)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Per-request deadline in seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },

    /// Find substitutions for items in a JSON file
    Analyze {
        /// JSON array of items, or {"extractedItems": [...]}
        #[arg(short, long)]
        items: PathBuf,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        preferences: PreferenceArgs,
    },

    /// Extract items from a receipt photo and find substitutions
    Receipt {
        /// Receipt image (JPEG)
        #[arg(short, long)]
        image: PathBuf,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        preferences: PreferenceArgs,
    },

    /// Inspect the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Show entry, store and category counts
    Stats,

    /// Search the catalog by name similarity
    Search {
        /// Product name to look up
        query: String,

        /// Minimum similarity (0-1]
        #[arg(short, long, default_value_t = CONFIDENT_MATCH_THRESHOLD)]
        threshold: f64,

        /// Maximum results to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

/// Shopper preference flags
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PreferenceArgs {
    /// Only suggest organic products
    #[arg(long)]
    pub organic_only: bool,

    /// Never suggest store/value-range products
    #[arg(long)]
    pub no_brand_swaps: bool,

    /// Skip bread, flour and pasta alternatives
    #[arg(long)]
    pub gluten_free: bool,

    /// Prefer sulfate-free products
    #[arg(long)]
    pub sulfate_free: bool,

    /// Prefer vegetarian products
    #[arg(long)]
    pub vegetarian: bool,

    /// Prioritise savings
    #[arg(long)]
    pub budget_focus: bool,
}

impl From<PreferenceArgs> for UserPreferences {
    fn from(args: PreferenceArgs) -> Self {
        UserPreferences {
            sulfate_free: args.sulfate_free,
            organic_only: args.organic_only,
            no_brand_swaps: args.no_brand_swaps,
            vegetarian: args.vegetarian,
            gluten_free: args.gluten_free,
            budget_focus: args.budget_focus,
        }
    }
}
