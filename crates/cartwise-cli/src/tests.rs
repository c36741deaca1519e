//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;

use clap::Parser;
use serde_json::json;
use tempfile::TempDir;

use cartwise_core::{PurchasedItem, UserPreferences};

use crate::cli::{CatalogAction, Cli, Commands};
use crate::commands::{self, truncate};

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_analyze_with_flags() {
    let cli = Cli::try_parse_from([
        "cartwise",
        "--catalog",
        "prices.json",
        "analyze",
        "--items",
        "items.json",
        "--organic-only",
        "--gluten-free",
        "--json",
    ])
    .unwrap();

    assert_eq!(cli.catalog.unwrap().to_str(), Some("prices.json"));
    match cli.command {
        Commands::Analyze {
            items,
            json,
            preferences,
        } => {
            assert_eq!(items.to_str(), Some("items.json"));
            assert!(json);
            let prefs: UserPreferences = preferences.into();
            assert!(prefs.organic_only);
            assert!(prefs.gluten_free);
            assert!(!prefs.no_brand_swaps);
            assert!(!prefs.budget_focus);
        }
        _ => panic!("expected analyze command"),
    }
}

#[test]
fn test_parse_catalog_search_defaults() {
    let cli = Cli::try_parse_from(["cartwise", "catalog", "search", "semi skimmed milk"]).unwrap();
    match cli.command {
        Commands::Catalog {
            action:
                CatalogAction::Search {
                    query,
                    threshold,
                    limit,
                },
        } => {
            assert_eq!(query, "semi skimmed milk");
            assert_eq!(threshold, 0.3);
            assert_eq!(limit, 10);
        }
        _ => panic!("expected catalog search"),
    }
}

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["cartwise", "serve", "-v"]).unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Serve {
            port,
            host,
            timeout_secs,
        } => {
            assert_eq!(port, 3000);
            assert_eq!(host, "127.0.0.1");
            assert_eq!(timeout_secs, 60);
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn test_parse_receipt_requires_image() {
    assert!(Cli::try_parse_from(["cartwise", "receipt"]).is_err());
}

// ========== Item File Tests ==========

#[test]
fn test_load_items_array() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "items.json",
        &json!([{"name": "White Bread", "price": 0.75}]).to_string(),
    );

    let items = commands::load_items(&path).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "White Bread");
}

#[test]
fn test_load_items_extracted_receipt() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "receipt.json",
        &json!({"extractedItems": [
            {"name": "Semi Skimmed Milk", "price": 1.65},
            {"name": "Colgate Toothpaste", "price": 3.50}
        ]})
        .to_string(),
    );

    let items = commands::load_items(&path).unwrap();
    assert_eq!(items.len(), 2);
}

#[test]
fn test_load_items_rejects_other_shapes() {
    let dir = TempDir::new().unwrap();
    let scalar = write_file(&dir, "scalar.json", "42");
    let object = write_file(&dir, "object.json", r#"{"items": []}"#);
    let broken = write_file(&dir, "broken.json", "[{");

    assert!(commands::load_items(&scalar).is_err());
    assert!(commands::load_items(&object).is_err());
    assert!(commands::load_items(&broken).is_err());
    assert!(commands::load_items(&dir.path().join("missing.json")).is_err());
}

// ========== Command Tests ==========

#[test]
fn test_cmd_analyze_items_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "items.json",
        &json!([
            {"name": "Colgate Toothpaste", "price": 3.50, "quantity": "75ml"},
            {"name": "Receipt total"}
        ])
        .to_string(),
    );
    let engine = commands::build_engine(None, None).unwrap();

    assert!(commands::cmd_analyze(&engine, &path, &UserPreferences::default(), false).is_ok());
    assert!(commands::cmd_analyze(&engine, &path, &UserPreferences::default(), true).is_ok());
}

#[test]
fn test_build_engine_with_catalog_and_config() {
    let dir = TempDir::new().unwrap();
    let catalog = write_file(
        &dir,
        "catalog.json",
        &json!({"items": {
            "value_bread": {
                "name": "Value White Bread",
                "brand": "value",
                "prices": {"Tesco": {"price": 0.39}}
            },
            "baker_bread": {
                "name": "Baker White Bread",
                "prices": {"Asda": {"price": 0.60}}
            }
        }})
        .to_string(),
    );
    let config = write_file(&dir, "engine.toml", "[ranking]\nmax_alternatives = 1\n");

    let engine = commands::build_engine(Some(&config), Some(&catalog)).unwrap();
    assert_eq!(engine.catalog().len(), 2);
    assert_eq!(engine.max_alternatives(), 1);

    let result = engine.analyze(
        &[PurchasedItem::new("White Bread", 0.75)],
        &UserPreferences::default(),
    );
    assert_eq!(result.substitutions.len(), 1);
    assert_eq!(result.substitutions[0].store, "Tesco");
}

#[test]
fn test_build_engine_rejects_broken_config() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "engine.toml", "[matching\nthreshold = ");
    assert!(commands::build_engine(Some(&config), None).is_err());
}

#[test]
fn test_cmd_catalog_commands() {
    let engine = commands::build_engine(None, None).unwrap();

    assert!(commands::cmd_catalog_stats(&engine).is_ok());
    assert!(commands::cmd_catalog_search(&engine, "semi skimmed milk", 0.3, 10).is_ok());
    assert!(commands::cmd_catalog_search(&engine, "caviar", 0.3, 10).is_ok());
    assert!(commands::cmd_catalog_search(&engine, "milk", 0.0, 10).is_err());
    assert!(commands::cmd_catalog_search(&engine, "milk", 1.5, 10).is_err());
    assert!(commands::cmd_catalog_search(&engine, "!!!", 0.3, 10).is_err());
}

#[tokio::test]
async fn test_cmd_receipt_missing_file() {
    let engine = commands::build_engine(None, None).unwrap();
    let result = commands::cmd_receipt(
        &engine,
        std::path::Path::new("/nonexistent/receipt.jpg"),
        &UserPreferences::default(),
        false,
    )
    .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("File not found"));
}

// ========== Output Tests ==========

#[test]
fn test_render_result_report() {
    let engine = commands::build_engine(None, None).unwrap();
    let prefs = UserPreferences {
        no_brand_swaps: true,
        ..Default::default()
    };
    let result = engine.analyze(&[PurchasedItem::new("Colgate Toothpaste", 3.50)], &prefs);

    let report = commands::render_result(&result);
    assert!(report.contains("2 cheaper alternative(s)"));
    assert!(report.contains("Colgate Toothpaste (£3.50)"));
    assert!(report.contains("Dentyl Active Toothpaste 75ml"));
    assert!(report.contains("save £1.51"));
    assert!(report.contains("Spent:            £3.50"));
    assert!(report.contains("(50.29%)"));
}

#[test]
fn test_render_result_same_name_items_get_own_headers() {
    let engine = commands::build_engine(None, None).unwrap();
    let items = [
        PurchasedItem::new("Colgate Toothpaste", 3.50),
        PurchasedItem::new("Colgate Toothpaste", 3.40),
    ];
    let result = engine.analyze(&items, &UserPreferences::default());

    let report = commands::render_result(&result);
    assert!(report.contains("Colgate Toothpaste (£3.50)"));
    assert!(report.contains("Colgate Toothpaste (£3.40)"));
}

#[test]
fn test_render_result_no_alternatives() {
    let engine = commands::build_engine(None, None).unwrap();
    let result = engine.analyze(&[], &UserPreferences::default());

    let report = commands::render_result(&result);
    assert!(report.contains("No cheaper alternatives found."));
    assert!(report.contains("£0.00 (0.00%)"));
}

#[test]
fn test_parse_origins() {
    assert!(commands::parse_origins("").is_empty());
    assert_eq!(
        commands::parse_origins(" https://a.example , ,https://b.example"),
        vec!["https://a.example", "https://b.example"]
    );
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("Tropicana Smooth Orange Juice 950ml", 12), "Tropicana...");
    assert_eq!(truncate("Café crème brûlée", 8), "Café ...");
}
