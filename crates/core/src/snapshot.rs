//! Cart snapshots
//!
//! The server-authoritative cart summary returned after a mutation. Snapshots are projected
//! onto the page and then dropped; nothing is cached between actions.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors raised while building a snapshot from server amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// An amount does not fit in the currency's minor units.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(Decimal),
}

/// Convert a decimal amount in major units into minor units of `currency`, rounding half away
/// from zero.
///
/// # Errors
///
/// Returns [`SnapshotError::AmountOutOfRange`] if the result does not fit in an `i64`.
pub fn minor_units(amount: Decimal, currency: &Currency) -> Result<i64, SnapshotError> {
    10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .and_then(|scale| amount.checked_mul(scale))
        .and_then(|scaled| {
            scaled
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .ok_or(SnapshotError::AmountOutOfRange(amount))
}

/// Pricing block of a snapshot.
///
/// Always satisfies `0 <= discount <= subtotal` and `total == subtotal - discount`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    subtotal: Money<'static, Currency>,
    discount: Money<'static, Currency>,
    total: Money<'static, Currency>,
}

impl CartTotals {
    /// Build totals from minor-unit amounts. Negative amounts clamp to zero and the discount
    /// clamps to the subtotal.
    pub fn from_minor(subtotal: i64, discount: i64, currency: &'static Currency) -> Self {
        let subtotal = subtotal.max(0);
        let discount = discount.clamp(0, subtotal);

        Self {
            subtotal: Money::from_minor(subtotal, currency),
            discount: Money::from_minor(discount, currency),
            total: Money::from_minor(subtotal - discount, currency),
        }
    }

    /// Build totals from major-unit decimal amounts.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::AmountOutOfRange`] if an amount overflows minor units.
    pub fn from_decimal(
        subtotal: Decimal,
        discount: Decimal,
        currency: &'static Currency,
    ) -> Result<Self, SnapshotError> {
        Ok(Self::from_minor(
            minor_units(subtotal, currency)?,
            minor_units(discount, currency)?,
            currency,
        ))
    }

    /// Pre-discount amount.
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Discount taken off the subtotal (zero when no coupon applies).
    pub fn discount(&self) -> Money<'static, Currency> {
        self.discount
    }

    /// Amount payable.
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Whether a non-zero discount applies.
    pub fn has_discount(&self) -> bool {
        self.discount.to_minor_units() > 0
    }
}

/// Summary returned by the server after an action. Fields the response did not carry are
/// `None` and leave the matching page regions untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartSnapshot {
    /// Number of items in the cart.
    pub quantity: Option<u32>,

    /// Pricing, when the response carried amounts.
    pub totals: Option<CartTotals>,
}

impl CartSnapshot {
    /// Snapshot carrying only a quantity.
    pub fn with_quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            totals: None,
        }
    }

    /// Whether the snapshot carries nothing to project.
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.totals.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn totals_subtract_discount() {
        let totals = CartTotals::from_minor(100_000, 10_000, iso::IRR);

        assert_eq!(totals.total(), Money::from_minor(90_000, iso::IRR));
        assert!(totals.has_discount());
    }

    #[test]
    fn discount_is_clamped_to_subtotal() {
        let totals = CartTotals::from_minor(500, 900, iso::USD);

        assert_eq!(totals.discount().to_minor_units(), 500);
        assert_eq!(totals.total().to_minor_units(), 0);
    }

    #[test]
    fn negative_amounts_clamp_to_zero() {
        let totals = CartTotals::from_minor(-100, -5, iso::USD);

        assert_eq!(totals.subtotal().to_minor_units(), 0);
        assert_eq!(totals.discount().to_minor_units(), 0);
        assert!(!totals.has_discount());
    }

    #[test]
    fn decimal_amounts_convert_by_currency_exponent() -> TestResult {
        assert_eq!(minor_units(Decimal::new(1999, 2), iso::USD)?, 1999);
        assert_eq!(minor_units(Decimal::new(1000, 0), iso::USD)?, 100_000);
        assert_eq!(minor_units(Decimal::new(5, 1), iso::JPY)?, 1);

        let totals = CartTotals::from_decimal(Decimal::new(1000, 0), Decimal::new(100, 0), iso::USD)?;

        assert_eq!(totals.total().to_minor_units(), 90_000);

        Ok(())
    }

    #[test]
    fn overflowing_amount_is_an_error() {
        let amount = Decimal::MAX;

        assert_eq!(
            minor_units(amount, iso::USD),
            Err(SnapshotError::AmountOutOfRange(amount))
        );
    }

    #[test]
    fn empty_snapshot_has_nothing_to_project() {
        assert!(CartSnapshot::default().is_empty());
        assert!(!CartSnapshot::with_quantity(0).is_empty());
    }
}
