//! Field Values and Value Authority
//!
//! Records where a resolved value came from so overrides never get
//! confused with computed defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::MoneyFormatter;

/// ValueSource determines which authority produced a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Default computation (product data or a valuation strategy)
    Computed,
    /// `<field>_for_feed` product property
    Override,
}

impl Default for ValueSource {
    fn default() -> Self {
        Self::Computed
    }
}

/// A field value before stringification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Money { amount: Decimal, currency: String },
    /// Percentage, e.g. `5` for five percent.
    Percent(Decimal),
    YesNo(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn money(amount: Decimal, currency: impl Into<String>) -> Self {
        Self::Money { amount, currency: currency.into() }
    }

    /// Blank values count as missing.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Money { currency, .. } => currency.trim().is_empty(),
            Self::Percent(_) | Self::YesNo(_) => false,
        }
    }

    pub fn render(&self, money: &dyn MoneyFormatter) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Money { amount, currency } => money.format(*amount, currency),
            Self::Percent(rate) => rate.normalize().to_string(),
            Self::YesNo(true) => "yes".to_string(),
            Self::YesNo(false) => "no".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub value: FieldValue,
    pub source: ValueSource,
}

impl ResolvedValue {
    pub fn computed(value: FieldValue) -> Self {
        Self { value, source: ValueSource::Computed }
    }

    pub fn overridden(raw: impl Into<String>) -> Self {
        Self { value: FieldValue::Text(raw.into()), source: ValueSource::Override }
    }
}
