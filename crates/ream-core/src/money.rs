//! # Money
//!
//! Paper prices and order totals are integer cents, never floats.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Paper.price_cents ──► OrderEntry.unit_price_cents (snapshot)           │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                     line total = unit × quantity                        │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                     Order.total_amount_cents (fixed at creation)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Arithmetic is checked: a total that cannot be represented rejects the
//! order rather than wrapping.
//!
//! ```rust
//! use ream_core::money::Money;
//!
//! let line = Money::from_cents(1099).checked_line_total(3).unwrap();
//! assert_eq!(line.cents(), 3297);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Amount in cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Unit price times quantity, `None` if it leaves `i64`.
    ///
    /// ```rust
    /// use ream_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_line_total(4), Some(Money::from_cents(1000)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_line_total(2), None);
    /// ```
    #[inline]
    pub fn checked_line_total(&self, quantity: i32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// `1099` renders as `10.99`. Currency symbols are the client's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::default().to_string(), "0.00");
    }

    #[test]
    fn test_order_total_accumulates() {
        let total = Money::from_cents(299)
            .checked_line_total(3)
            .and_then(|a| Money::from_cents(1000).checked_line_total(1).and_then(|b| a.checked_add(b)))
            .unwrap();
        assert_eq!(total.cents(), 1897);
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        let huge = Money::from_cents(i64::MAX - 1);
        assert!(huge.checked_line_total(i32::MAX).is_none());
        assert!(huge.checked_add(Money::from_cents(5)).is_none());
        assert_eq!(
            huge.checked_add(Money::from_cents(1)),
            Some(Money::from_cents(i64::MAX))
        );
    }

    #[test]
    fn test_display_extreme_negative() {
        assert_eq!(Money::from_cents(i64::MIN).to_string(), "-92233720368547758.08");
    }
}
