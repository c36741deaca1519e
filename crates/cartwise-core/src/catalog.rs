//! Product catalog
//!
//! The catalog is a pre-built JSON dataset of grocery products with per-store
//! prices. It is loaded once at startup and never mutated afterwards; callers
//! share it behind an `Arc<Catalog>`.
//!
//! Loading is best-effort: a missing or corrupt file yields an empty catalog
//! (every lookup then finds nothing) instead of stopping the process. Within a
//! readable file, entries without a usable name are skipped and store prices
//! that are not non-negative numbers are dropped.
//!
//! # Dataset format
//!
//! ```json
//! {
//!   "items": {
//!     "tesco_semi_skimmed_milk_2l": {
//!       "name": "Tesco Semi Skimmed Milk 2L",
//!       "tokens": ["tesco", "semi", "skimmed", "milk", "2l"],
//!       "category": "dairy",
//!       "unit": "2L",
//!       "brand": "tesco",
//!       "prices": { "Tesco": { "price": 1.45, "currency": "GBP" } }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::substitution::tokenizer::{tokenize, TokenSet};

/// Embedded sample catalog (compiled into binary)
const EMBEDDED_CATALOG: &str = include_str!("../../../data/grocery_catalog.json");

/// Brand value marking a store's own budget/value range
pub const GENERIC_BRAND: &str = "value";

/// One store's price for a catalog product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorePrice {
    pub store: String,
    pub price: f64,
    pub currency: Option<String>,
}

/// A catalog product with its derived token set
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub brand: Option<String>,
    #[serde(skip)]
    pub tokens: TokenSet,
    /// Store prices in dataset order
    pub prices: Vec<StorePrice>,
    #[serde(skip)]
    name_lower: String,
}

impl CatalogEntry {
    /// Create an entry whose tokens are derived from its name
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            category: None,
            unit: None,
            brand: None,
            tokens: tokenize(name),
            prices: Vec::new(),
            name_lower: name.to_lowercase(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_brand(mut self, brand: &str) -> Self {
        self.brand = Some(brand.to_string());
        self
    }

    /// Append a store price (ignored unless finite and non-negative)
    pub fn with_price(mut self, store: &str, price: f64) -> Self {
        if price.is_finite() && price >= 0.0 {
            self.prices.push(StorePrice {
                store: store.to_string(),
                price,
                currency: None,
            });
        }
        self
    }

    /// Lower-cased display name, computed once
    pub fn normalized_name(&self) -> &str {
        &self.name_lower
    }

    /// Whether the brand is the generic value-range sentinel
    pub fn is_generic_brand(&self) -> bool {
        self.brand
            .as_deref()
            .is_some_and(|b| b.trim().eq_ignore_ascii_case(GENERIC_BRAND))
    }

    /// Lowest store price; ties go to the store listed first
    pub fn cheapest(&self) -> Option<&StorePrice> {
        self.prices.iter().fold(None, |best, candidate| match best {
            Some(b) if b.price <= candidate.price => Some(b),
            _ => Some(candidate),
        })
    }
}

/// Summary counts for a loaded catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub entries: usize,
    pub stores: Vec<String>,
    pub categories: usize,
}

/// Read-only product catalog in dataset order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default)]
    items: Map<String, Value>,
}

impl Catalog {
    /// An empty catalog: every lookup finds nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Parse a catalog document
    ///
    /// Fails only when the document itself is not a catalog; bad entries
    /// inside it are skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|e| Error::Catalog(format!("Invalid catalog document: {}", e)))?;

        let mut entries = Vec::with_capacity(raw.items.len());
        for (key, value) in raw.items {
            match parse_entry(&key, value) {
                Some(entry) => entries.push(entry),
                None => debug!(key = %key, "Skipping catalog entry without usable name"),
            }
        }

        Ok(Self { entries })
    }

    /// Load the catalog, degrading to an empty one on failure
    ///
    /// With no path the embedded sample catalog is used.
    pub fn load(path: Option<&Path>) -> Self {
        let result = match path {
            Some(p) => fs::read_to_string(p)
                .map_err(Error::from)
                .and_then(|content| Self::from_json(&content)),
            None => Self::from_json(EMBEDDED_CATALOG),
        };

        match result {
            Ok(catalog) => {
                info!(
                    source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "embedded".into()),
                    "Loaded {} catalog items",
                    catalog.len()
                );
                catalog
            }
            Err(e) => {
                error!(error = %e, "Failed to load catalog, continuing with an empty catalog");
                Self::empty()
            }
        }
    }

    /// The embedded sample catalog
    pub fn embedded() -> Self {
        Self::load(None)
    }

    /// All entries in load order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        let stores: BTreeSet<&str> = self
            .entries
            .iter()
            .flat_map(|e| e.prices.iter().map(|p| p.store.as_str()))
            .collect();
        let categories: BTreeSet<&str> = self
            .entries
            .iter()
            .filter_map(|e| e.category.as_deref())
            .filter(|c| !c.is_empty())
            .collect();

        CatalogStats {
            entries: self.entries.len(),
            stores: stores.into_iter().map(str::to_string).collect(),
            categories: categories.len(),
        }
    }
}

fn parse_entry(key: &str, value: Value) -> Option<CatalogEntry> {
    let Value::Object(mut obj) = value else {
        warn!(key = %key, "Malformed catalog entry: not an object");
        return None;
    };

    let name = non_blank(string_field(&obj, "name"))?;

    // Precomputed tokens are re-normalized so they compare equal to query tokens.
    // Non-string tokens are ignored.
    let precomputed: Vec<&str> = obj
        .get("tokens")
        .and_then(Value::as_array)
        .map(|t| t.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let tokens = tokenize(&precomputed.join(" "));
    let tokens = if tokens.is_empty() { tokenize(&name) } else { tokens };
    if tokens.is_empty() {
        return None;
    }

    let prices = match obj.remove("prices") {
        Some(Value::Object(prices)) => prices
            .into_iter()
            .filter_map(|(store, price)| parse_store_price(key, store, &price))
            .collect(),
        _ => Vec::new(),
    };

    Some(CatalogEntry {
        key: key.to_string(),
        name_lower: name.to_lowercase(),
        name,
        category: non_blank(string_field(&obj, "category")),
        unit: non_blank(string_field(&obj, "unit")),
        brand: non_blank(string_field(&obj, "brand")),
        tokens,
        prices,
    })
}

fn parse_store_price(key: &str, store: String, value: &Value) -> Option<StorePrice> {
    let (price, currency) = match value {
        Value::Object(obj) => (
            obj.get("price").and_then(Value::as_f64),
            obj.get("currency").and_then(Value::as_str).map(str::to_string),
        ),
        Value::Number(n) => (n.as_f64(), None),
        _ => (None, None),
    };

    match price {
        Some(p) if p.is_finite() && p >= 0.0 => Some(StorePrice {
            store,
            price: p,
            currency,
        }),
        _ => {
            debug!(key = %key, store = %store, "Dropping invalid store price");
            None
        }
    }
}

/// A field's value when it is a string; any other type counts as absent
fn string_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "items": {
            "milk": {
                "name": "Semi Skimmed Milk 2L",
                "tokens": ["semi", "skimmed", "milk", "2l"],
                "category": "dairy",
                "unit": "2L",
                "brand": "generic",
                "prices": {
                    "Tesco": {"price": 1.45, "currency": "GBP"},
                    "Aldi": {"price": 1.35, "currency": "GBP"},
                    "Lidl": {"price": 1.35, "currency": "GBP"}
                }
            },
            "nameless": {"tokens": ["mystery"], "prices": {"Tesco": {"price": 1.0}}},
            "punctuation": {"name": "!!!", "prices": {}},
            "bread": {
                "name": "White Bread 800g",
                "prices": {
                    "Asda": {"price": 0.55},
                    "Broken": {"price": "cheap"},
                    "Negative": {"price": -1.0}
                }
            },
            "no_prices": {"name": "Organic Oats"}
        }
    }"#;

    #[test]
    fn test_from_json_skips_unusable_entries() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let keys: Vec<&str> = catalog.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["milk", "bread", "no_prices"]);
    }

    #[test]
    fn test_from_json_keeps_dataset_order_for_prices() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let milk = catalog.get("milk").unwrap();
        let stores: Vec<&str> = milk.prices.iter().map(|p| p.store.as_str()).collect();
        assert_eq!(stores, vec!["Tesco", "Aldi", "Lidl"]);
        assert_eq!(milk.prices[0].currency.as_deref(), Some("GBP"));
    }

    #[test]
    fn test_from_json_drops_invalid_prices() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let bread = catalog.get("bread").unwrap();
        assert_eq!(bread.prices.len(), 1);
        assert_eq!(bread.prices[0].store, "Asda");
    }

    #[test]
    fn test_wrongly_typed_optional_fields_are_ignored() {
        let catalog = Catalog::from_json(
            r#"{"items": {
                "beans": {
                    "name": "Baked Beans 415g",
                    "category": 5,
                    "unit": ["415g"],
                    "brand": null,
                    "tokens": "baked beans",
                    "prices": {"Tesco": {"price": 0.85}}
                },
                "rice": {
                    "name": "Basmati Rice",
                    "tokens": ["basmati", 7, "rice"],
                    "prices": [1.49]
                },
                "scalar": 42
            }}"#,
        )
        .unwrap();

        let keys: Vec<&str> = catalog.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["beans", "rice"]);

        let beans = catalog.get("beans").unwrap();
        assert!(beans.category.is_none());
        assert!(beans.unit.is_none());
        assert!(beans.brand.is_none());
        assert_eq!(beans.tokens, tokenize("Baked Beans 415g"));
        assert_eq!(beans.cheapest().map(|p| p.price), Some(0.85));

        let rice = catalog.get("rice").unwrap();
        assert_eq!(rice.tokens, tokenize("basmati rice"));
        assert!(rice.prices.is_empty());
    }

    #[test]
    fn test_tokens_derived_from_name_when_missing() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let bread = catalog.get("bread").unwrap();
        assert_eq!(bread.tokens, tokenize("White Bread 800g"));
        assert!(catalog.get("no_prices").unwrap().prices.is_empty());
    }

    #[test]
    fn test_cheapest_prefers_first_store_on_tie() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let cheapest = catalog.get("milk").unwrap().cheapest().unwrap();
        assert_eq!(cheapest.store, "Aldi");
        assert_eq!(cheapest.price, 1.35);
        assert!(catalog.get("no_prices").unwrap().cheapest().is_none());
    }

    #[test]
    fn test_generic_brand_detection() {
        let entry = CatalogEntry::new("a", "Everyday Value Beans").with_brand("Value");
        assert!(entry.is_generic_brand());
        let entry = CatalogEntry::new("b", "Heinz Beans").with_brand("heinz");
        assert!(!entry.is_generic_brand());
        assert!(!CatalogEntry::new("c", "Beans").is_generic_brand());
    }

    #[test]
    fn test_from_json_rejects_non_catalog() {
        assert!(Catalog::from_json("not json").is_err());
        assert!(Catalog::from_json("[1, 2, 3]").is_err());
        assert!(Catalog::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file_degrades_to_empty() {
        let catalog = Catalog::load(Some(Path::new("/nonexistent/catalog.json")));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_degrades_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ this is not json").unwrap();
        let catalog = Catalog::load(Some(file.path()));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let catalog = Catalog::load(Some(file.path()));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded();
        assert!(!catalog.is_empty());
        assert!(catalog.entries().iter().all(|e| !e.tokens.is_empty()));
        assert!(catalog
            .entries()
            .iter()
            .flat_map(|e| e.prices.iter())
            .all(|p| p.price >= 0.0));
    }

    #[test]
    fn test_stats() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let stats = catalog.stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.stores, vec!["Aldi", "Asda", "Lidl", "Tesco"]);
        assert_eq!(stats.categories, 1);
    }
}
