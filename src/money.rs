//! Money Formatting - Symbol-Free, Currency-Qualified

use rust_decimal::{Decimal, RoundingStrategy};

/// Renders monetary amounts for feed fields.
pub trait MoneyFormatter: Send + Sync {
    fn format(&self, amount: Decimal, currency: &str) -> String;
}

/// `20.00 USD` style amounts, rounded half away from zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyQualified;

impl MoneyFormatter for CurrencyQualified {
    fn format(&self, amount: Decimal, currency: &str) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.2} {}", rounded, currency)
    }
}
