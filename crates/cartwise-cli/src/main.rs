//! Cartwise CLI - Grocery receipt substitution finder
//!
//! Usage:
//!   cartwise analyze --items items.json       Find substitutions for known items
//!   cartwise receipt --image receipt.jpg      Read a receipt photo, then substitute
//!   cartwise catalog search "semi skimmed"    Look up catalog products
//!   cartwise serve --port 3000                Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let engine = commands::build_engine(cli.config.as_deref(), cli.catalog.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            timeout_secs,
        } => commands::cmd_serve(engine, &host, port, timeout_secs).await,
        Commands::Analyze {
            items,
            json,
            preferences,
        } => commands::cmd_analyze(&engine, &items, &preferences.into(), json),
        Commands::Receipt {
            image,
            json,
            preferences,
        } => commands::cmd_receipt(&engine, &image, &preferences.into(), json).await,
        Commands::Catalog { action } => match action {
            CatalogAction::Stats => commands::cmd_catalog_stats(&engine),
            CatalogAction::Search {
                query,
                threshold,
                limit,
            } => commands::cmd_catalog_search(&engine, &query, threshold, limit),
        },
    }
}
