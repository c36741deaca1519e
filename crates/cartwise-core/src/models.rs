//! Domain models for Cartwise

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A line item the shopper actually bought
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub category: String,
}

/// Why a raw purchased-item record was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedItem {
    #[error("item is not a JSON object")]
    NotAnObject,
    #[error("item has no name")]
    MissingName,
    #[error("item has no price")]
    MissingPrice,
    #[error("item price is not a non-negative number: {0}")]
    InvalidPrice(String),
}

impl PurchasedItem {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            price,
            quantity: String::new(),
            category: String::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: &str) -> Self {
        self.quantity = quantity.to_string();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Validate a loosely-typed record (as produced by a vision model)
    ///
    /// Name must be a non-blank string. Price must be a finite, non-negative
    /// number, or a string that parses as one. Quantity and category accept
    /// any scalar and default to empty.
    pub fn from_value(value: &Value) -> std::result::Result<Self, MalformedItem> {
        let obj = value.as_object().ok_or(MalformedItem::NotAnObject)?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(MalformedItem::MissingName)?;

        let price = match obj.get("price") {
            None | Some(Value::Null) => return Err(MalformedItem::MissingPrice),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        let price = match price {
            Some(p) if p.is_finite() && p >= 0.0 => p,
            _ => {
                let raw = obj.get("price").map(Value::to_string).unwrap_or_default();
                return Err(MalformedItem::InvalidPrice(raw));
            }
        };

        Ok(Self {
            name: name.to_string(),
            price,
            quantity: scalar_text(obj.get("quantity")),
            category: scalar_text(obj.get("category")),
        })
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Dietary and budget preferences supplied with each request
///
/// Missing, null or unknown flags are treated as `false`. Non-boolean values
/// never fail the decode; they are read by JavaScript truthiness, so `"true"`
/// and `1` switch a flag on while `""` and `0` leave it off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    #[serde(deserialize_with = "flag")]
    pub sulfate_free: bool,
    #[serde(deserialize_with = "flag")]
    pub organic_only: bool,
    #[serde(deserialize_with = "flag")]
    pub no_brand_swaps: bool,
    #[serde(deserialize_with = "flag")]
    pub vegetarian: bool,
    #[serde(deserialize_with = "flag")]
    pub gluten_free: bool,
    #[serde(deserialize_with = "flag")]
    pub budget_focus: bool,
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(truthy(&Value::deserialize(deserializer)?))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Individual preference flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceFlag {
    SulfateFree,
    OrganicOnly,
    NoBrandSwaps,
    Vegetarian,
    GlutenFree,
    BudgetFocus,
}

impl PreferenceFlag {
    /// Wire name of the flag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SulfateFree => "sulfateFree",
            Self::OrganicOnly => "organicOnly",
            Self::NoBrandSwaps => "noBrandSwaps",
            Self::Vegetarian => "vegetarian",
            Self::GlutenFree => "glutenFree",
            Self::BudgetFocus => "budgetFocus",
        }
    }

    pub fn all() -> &'static [PreferenceFlag] {
        &[
            Self::SulfateFree,
            Self::OrganicOnly,
            Self::NoBrandSwaps,
            Self::Vegetarian,
            Self::GlutenFree,
            Self::BudgetFocus,
        ]
    }
}

impl std::fmt::Display for PreferenceFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl UserPreferences {
    pub fn is_enabled(&self, flag: PreferenceFlag) -> bool {
        match flag {
            PreferenceFlag::SulfateFree => self.sulfate_free,
            PreferenceFlag::OrganicOnly => self.organic_only,
            PreferenceFlag::NoBrandSwaps => self.no_brand_swaps,
            PreferenceFlag::Vegetarian => self.vegetarian,
            PreferenceFlag::GlutenFree => self.gluten_free,
            PreferenceFlag::BudgetFocus => self.budget_focus,
        }
    }

    pub fn enabled_flags(&self) -> Vec<PreferenceFlag> {
        PreferenceFlag::all()
            .iter()
            .copied()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }
}

/// Name/price/quantity/category view of a product, used on both sides of a swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub price: f64,
    pub quantity: String,
    pub category: String,
}

impl From<&PurchasedItem> for ItemSnapshot {
    fn from(item: &PurchasedItem) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity.clone(),
            category: item.category.clone(),
        }
    }
}

/// A cheaper catalog product proposed in place of a purchased item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub original: ItemSnapshot,
    pub alternative: ItemSnapshot,
    /// Store offering the alternative at its cheapest price
    pub store: String,
    pub reason: String,
    /// Always positive: original price minus alternative price
    pub savings: f64,
    pub tags: Vec<String>,
    /// Position of the purchased item in the analyzed basket
    #[serde(skip)]
    pub item_index: usize,
}

/// Result of analyzing one basket of purchased items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_original: f64,
    pub total_savings: f64,
    pub percentage_saved: f64,
    pub substitutions: Vec<Substitution>,
}
