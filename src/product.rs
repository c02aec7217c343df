//! Product Snapshots - Read-Only Catalog View
//!
//! Supplied by the catalog source. The engine never mutates a snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::renderer::FeedError;

fn default_currency() -> String { "USD".to_string() }

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock_items: Vec<StockItem>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variant_images: Vec<String>,
    #[serde(default)]
    pub shipping_category: Option<ShippingCategory>,
    #[serde(default)]
    pub tax_category: Option<TaxCategory>,
    /// Tax adjustments recorded on order lines, across all variants.
    #[serde(default)]
    pub tax_adjustments: Vec<TaxAdjustment>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub master_variant_id: u64,
}

impl ProductSnapshot {
    /// Property value by case-insensitive name, if present and non-blank.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Representation used in diagnostics when an entry is skipped.
    pub fn inspect(&self) -> String {
        format!("Product {{ sku: {:?}, name: {:?} }}", self.sku, self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(default)]
    pub count_on_hand: i64,
    #[serde(default)]
    pub backorderable: bool,
}

impl StockItem {
    pub fn available(&self) -> bool {
        self.count_on_hand > 0 || self.backorderable
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub methods: Vec<ShippingMethod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingMethod {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rates: Vec<ShippingRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRate {
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rates: Vec<TaxRateRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRateRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Fractional rate, e.g. `0.05` for five percent.
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxAdjustment {
    pub variant_id: u64,
    pub rate: TaxRateRecord,
}

/// Product properties with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// All entries, names lower-cased, blank values included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for Properties {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut properties = Self::new();
        for (name, value) in map {
            properties.insert(name, value);
        }
        properties
    }
}

impl From<Properties> for BTreeMap<String, String> {
    fn from(properties: Properties) -> Self {
        properties.0
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (name, value) in iter {
            properties.insert(name, value);
        }
        properties
    }
}

/// Load a catalog from a JSON array of snapshots.
pub fn load_catalog(path: &Path) -> Result<Vec<ProductSnapshot>, FeedError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
