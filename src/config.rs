//! Feed Configuration - Set Once, Read Many
//!
//! Loaded at process start and passed explicitly into the renderer.
//! Every key is optional.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BASE_CONDITION: &str = "new";
pub const DEFAULT_NAMESPACE_PREFIX: &str = "g";
pub const DEFAULT_NAMESPACE_URI: &str = "http://base.google.com/ns/1.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_condition: String,
    pub namespace_prefix: String,
    pub namespace_uri: String,
    pub channel: ChannelConfig,
    pub shipping_price_strategy: ShippingPriceStrategyKind,
    pub tax_rate_strategy: TaxRateStrategyKind,
    pub availability_strategy: AvailabilityStrategyKind,
    pub condition_strategy: ConditionStrategyKind,
    pub sale_strategy: SaleStrategyKind,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_condition: DEFAULT_BASE_CONDITION.to_string(),
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            namespace_uri: DEFAULT_NAMESPACE_URI.to_string(),
            channel: ChannelConfig::default(),
            shipping_price_strategy: ShippingPriceStrategyKind::default(),
            tax_rate_strategy: TaxRateStrategyKind::default(),
            availability_strategy: AvailabilityStrategyKind::default(),
            condition_strategy: ConditionStrategyKind::default(),
            sale_strategy: SaleStrategyKind::default(),
        }
    }
}

impl FeedConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Channel envelope metadata for the feed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub title: String,
    /// Store front URL; product links are built beneath it.
    pub link: String,
    pub description: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "Products".to_string(),
            link: String::new(),
            description: "Product feed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShippingPriceStrategyKind {
    #[default]
    Cheapest,
    Fixed { amount: Decimal },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxRateStrategyKind {
    #[default]
    MostApplied,
    Category,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AvailabilityStrategyKind {
    #[default]
    Stock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionStrategyKind {
    #[default]
    Base,
    Property,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaleStrategyKind {
    #[default]
    None,
    Property,
}
