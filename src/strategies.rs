//! Valuation Strategies - Replaceable Default Policies
//!
//! Each strategy computes a default field value from a product snapshot.
//! Callers depend on the trait only; the active implementation is chosen
//! by configuration or injected directly.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::{
    AvailabilityStrategyKind, ConditionStrategyKind, FeedConfig, SaleStrategyKind,
    ShippingPriceStrategyKind, TaxRateStrategyKind,
};
use crate::product::ProductSnapshot;

pub const SALE_PRICE_PROPERTY: &str = "sale_price";
pub const SALE_EFFECTIVE_DATE_PROPERTY: &str = "sale_price_effective_date";
pub const CONDITION_PROPERTY: &str = "condition";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    InStock,
    OutOfStock,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InStock => f.write_str("in stock"),
            Self::OutOfStock => f.write_str("out of stock"),
        }
    }
}

/// Sale price with its ISO-8601 effective date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    pub price: Decimal,
    pub effective_date: String,
}

pub trait AvailabilityStrategy: Send + Sync {
    fn availability(&self, product: &ProductSnapshot) -> Availability;
}

pub trait ConditionStrategy: Send + Sync {
    /// `None` defers to the configured base condition.
    fn condition(&self, product: &ProductSnapshot) -> Option<String>;

    fn condition_or(&self, product: &ProductSnapshot, base_condition: &str) -> String {
        self.condition(product).unwrap_or_else(|| base_condition.to_string())
    }
}

pub trait TaxRateStrategy: Send + Sync {
    /// Tax rate as a percentage.
    fn tax_rate(&self, product: &ProductSnapshot) -> Option<Decimal>;
}

pub trait ShippingPriceStrategy: Send + Sync {
    fn shipping_price(&self, product: &ProductSnapshot) -> Option<Decimal>;
}

pub trait SaleStrategy: Send + Sync {
    fn price(&self, product: &ProductSnapshot) -> Option<Decimal>;
    fn effective_date(&self, product: &ProductSnapshot) -> Option<String>;

    fn sale(&self, product: &ProductSnapshot) -> Option<Sale> {
        Some(Sale {
            price: self.price(product)?,
            effective_date: self.effective_date(product)?,
        })
    }

    fn is_present(&self, product: &ProductSnapshot) -> bool {
        self.price(product).is_some() && self.effective_date(product).is_some()
    }
}

// --- Availability ---

/// In stock when any stock item is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockAvailability;

impl AvailabilityStrategy for StockAvailability {
    fn availability(&self, product: &ProductSnapshot) -> Availability {
        if product.stock_items.iter().any(|item| item.available()) {
            Availability::InStock
        } else {
            Availability::OutOfStock
        }
    }
}

// --- Condition ---

#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCondition;

impl ConditionStrategy for BaseCondition {
    fn condition(&self, _product: &ProductSnapshot) -> Option<String> {
        None
    }
}

/// Reads the product's `condition` property.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyCondition;

impl ConditionStrategy for PropertyCondition {
    fn condition(&self, product: &ProductSnapshot) -> Option<String> {
        product.property(CONDITION_PROPERTY).map(str::to_string)
    }
}

// --- Tax rate ---

/// Most frequently applied rate on the master variant's order lines,
/// falling back to the first rate of the tax category.
///
/// Equal counts resolve to the lowest rate id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostAppliedTaxRate;

impl TaxRateStrategy for MostAppliedTaxRate {
    fn tax_rate(&self, product: &ProductSnapshot) -> Option<Decimal> {
        let mut counts: BTreeMap<u64, (usize, Decimal)> = BTreeMap::new();
        for adjustment in product
            .tax_adjustments
            .iter()
            .filter(|a| a.variant_id == product.master_variant_id)
        {
            counts
                .entry(adjustment.rate.id)
                .or_insert((0, adjustment.rate.amount))
                .0 += 1;
        }

        let mut best: Option<(usize, Decimal)> = None;
        for (count, amount) in counts.into_values() {
            if best.map_or(true, |(top, _)| count > top) {
                best = Some((count, amount));
            }
        }

        match best {
            Some((_, amount)) => Some(amount * Decimal::ONE_HUNDRED),
            None => CategoryTaxRate.tax_rate(product),
        }
    }
}

/// First rate of the product's tax category.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryTaxRate;

impl TaxRateStrategy for CategoryTaxRate {
    fn tax_rate(&self, product: &ProductSnapshot) -> Option<Decimal> {
        let rate = product.tax_category.as_ref()?.rates.first()?;
        Some(rate.amount * Decimal::ONE_HUNDRED)
    }
}

// --- Shipping price ---

/// Cheapest rate across the shipping category's methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestShippingRate;

impl ShippingPriceStrategy for CheapestShippingRate {
    fn shipping_price(&self, product: &ProductSnapshot) -> Option<Decimal> {
        product
            .shipping_category
            .as_ref()?
            .methods
            .iter()
            .flat_map(|method| method.rates.iter())
            .map(|rate| rate.cost)
            .min()
    }
}

/// Flat shipping price for every product.
#[derive(Debug, Clone, Copy)]
pub struct FixedShippingPrice(pub Decimal);

impl ShippingPriceStrategy for FixedShippingPrice {
    fn shipping_price(&self, _product: &ProductSnapshot) -> Option<Decimal> {
        Some(self.0)
    }
}

// --- Sale ---

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSale;

impl SaleStrategy for NoSale {
    fn price(&self, _product: &ProductSnapshot) -> Option<Decimal> {
        None
    }

    fn effective_date(&self, _product: &ProductSnapshot) -> Option<String> {
        None
    }
}

/// Sale data from the `sale_price` and `sale_price_effective_date` properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertySale;

impl SaleStrategy for PropertySale {
    fn price(&self, product: &ProductSnapshot) -> Option<Decimal> {
        let raw = product.property(SALE_PRICE_PROPERTY)?;
        match raw.trim().parse::<Decimal>() {
            Ok(price) => Some(price),
            Err(e) => {
                debug!(sku = %product.sku, value = raw, error = %e, "unparseable sale price");
                None
            }
        }
    }

    fn effective_date(&self, product: &ProductSnapshot) -> Option<String> {
        let raw = product.property(SALE_EFFECTIVE_DATE_PROPERTY)?.trim();
        if is_iso8601_range(raw) {
            Some(raw.to_string())
        } else {
            debug!(sku = %product.sku, value = raw, "unparseable sale effective date");
            None
        }
    }
}

/// `start/end`, each a calendar date or an RFC 3339 date-time.
fn is_iso8601_range(raw: &str) -> bool {
    let Some((start, end)) = raw.split_once('/') else {
        return false;
    };
    is_iso8601_instant(start) && is_iso8601_instant(end)
}

fn is_iso8601_instant(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(raw).is_ok()
}

// --- Bundle ---

/// The active set of valuation strategies, shared read-only across entries.
#[derive(Clone)]
pub struct Strategies {
    pub availability: Arc<dyn AvailabilityStrategy>,
    pub condition: Arc<dyn ConditionStrategy>,
    pub tax_rate: Arc<dyn TaxRateStrategy>,
    pub shipping_price: Arc<dyn ShippingPriceStrategy>,
    pub sale: Arc<dyn SaleStrategy>,
}

impl Strategies {
    pub fn from_config(config: &FeedConfig) -> Self {
        let availability: Arc<dyn AvailabilityStrategy> = match config.availability_strategy {
            AvailabilityStrategyKind::Stock => Arc::new(StockAvailability),
        };
        let condition: Arc<dyn ConditionStrategy> = match config.condition_strategy {
            ConditionStrategyKind::Base => Arc::new(BaseCondition),
            ConditionStrategyKind::Property => Arc::new(PropertyCondition),
        };
        let tax_rate: Arc<dyn TaxRateStrategy> = match config.tax_rate_strategy {
            TaxRateStrategyKind::MostApplied => Arc::new(MostAppliedTaxRate),
            TaxRateStrategyKind::Category => Arc::new(CategoryTaxRate),
        };
        let shipping_price: Arc<dyn ShippingPriceStrategy> = match &config.shipping_price_strategy {
            ShippingPriceStrategyKind::Cheapest => Arc::new(CheapestShippingRate),
            ShippingPriceStrategyKind::Fixed { amount } => Arc::new(FixedShippingPrice(*amount)),
        };
        let sale: Arc<dyn SaleStrategy> = match config.sale_strategy {
            SaleStrategyKind::None => Arc::new(NoSale),
            SaleStrategyKind::Property => Arc::new(PropertySale),
        };

        Self { availability, condition, tax_rate, shipping_price, sale }
    }

    pub fn with_availability(mut self, strategy: impl AvailabilityStrategy + 'static) -> Self {
        self.availability = Arc::new(strategy);
        self
    }

    pub fn with_condition(mut self, strategy: impl ConditionStrategy + 'static) -> Self {
        self.condition = Arc::new(strategy);
        self
    }

    pub fn with_tax_rate(mut self, strategy: impl TaxRateStrategy + 'static) -> Self {
        self.tax_rate = Arc::new(strategy);
        self
    }

    pub fn with_shipping_price(mut self, strategy: impl ShippingPriceStrategy + 'static) -> Self {
        self.shipping_price = Arc::new(strategy);
        self
    }

    pub fn with_sale(mut self, strategy: impl SaleStrategy + 'static) -> Self {
        self.sale = Arc::new(strategy);
        self
    }
}

impl Default for Strategies {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}
