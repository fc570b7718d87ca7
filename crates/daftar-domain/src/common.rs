//! Shared traits, currency helpers, and enums for bookkeeping primitives.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit of account used when a request does not name a currency.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Exposes a stable identifier for entities stored in the book.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Canonical form of a currency code (`" usd"` -> `"USD"`).
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Canonical form used when comparing account codes for uniqueness.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Fixed display-only conversion from the unit of account into another currency.
///
/// Converted figures are never stored; ledgers always hold the unit of account.
pub struct DisplayRate {
    pub currency: String,
    pub per_unit: Decimal,
}

impl DisplayRate {
    pub fn new(currency: impl Into<String>, per_unit: Decimal) -> Self {
        Self {
            currency: normalize_currency(&currency.into()),
            per_unit,
        }
    }

    /// Saudi riyal at the pegged 3.75 per US dollar.
    pub fn sar() -> Self {
        Self::new("SAR", Decimal::new(375, 2))
    }

    /// `None` when the converted figure does not fit in a `Decimal`.
    pub fn convert(&self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.per_unit)
            .map(|converted| converted.round_dp(2))
    }
}

impl Default for DisplayRate {
    fn default() -> Self {
        Self::sar()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
/// Order in which statement rows are presented. Folding is always oldest-first.
pub enum DisplayOrder {
    OldestFirst,
    #[default]
    NewestFirst,
}

impl fmt::Display for DisplayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DisplayOrder::OldestFirst => "oldest_first",
            DisplayOrder::NewestFirst => "newest_first",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sar_conversion_uses_pegged_rate() {
        let rate = DisplayRate::sar();
        assert_eq!(rate.currency, "SAR");
        assert_eq!(rate.convert(dec!(400)), Some(dec!(1500.00)));
    }

    #[test]
    fn conversion_past_decimal_range_is_none() {
        let rate = DisplayRate::sar();
        assert_eq!(rate.convert(Decimal::MAX), None);
    }

    #[test]
    fn codes_and_currencies_are_normalized() {
        assert_eq!(normalize_currency(" usd "), "USD");
        assert_eq!(normalize_code("  CUST-01 "), "cust-01");
    }
}
