//! # Money Module
//!
//! Provides the `Rupiah` type for whole-rupiah prices.
//!
//! ## Why Integer Rupiah?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rupiah has no minor unit in everyday pricing.                          │
//! │                                                                         │
//! │  Stored:    150000                                                      │
//! │  Displayed: "Rp 150.000"   ('.' groups thousands)                       │
//! │                                                                         │
//! │  Stock value = price × quantity, computed with checked arithmetic so   │
//! │  an absurd quantity reports overflow instead of wrapping.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Rupiah;
//!
//! let price = Rupiah::new(12_500);
//! assert_eq!(price.to_string(), "Rp 12.500");
//! assert_eq!(Rupiah::new(0).to_string(), "Rp 0");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::Product;

/// A whole-rupiah amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rupiah(i64);

impl Rupiah {
    /// Zero rupiah.
    pub const ZERO: Rupiah = Rupiah(0);

    /// Creates an amount from whole rupiah.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Rupiah(amount)
    }

    /// Returns the amount in whole rupiah.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ```rust
    /// use storefront_core::money::Rupiah;
    ///
    /// assert_eq!(Rupiah::new(50_000).checked_mul(3), Some(Rupiah::new(150_000)));
    /// assert_eq!(Rupiah::new(i64::MAX).checked_mul(2), None);
    /// ```
    #[inline]
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Rupiah)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Rupiah) -> Option<Self> {
        self.0.checked_add(other.0).map(Rupiah)
    }
}

impl From<i64> for Rupiah {
    fn from(amount: i64) -> Self {
        Rupiah(amount)
    }
}

/// Formats as `Rp 12.500`; negative amounts as `-Rp 12.500`.
impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if self.0 < 0 {
            write!(f, "-Rp {}", grouped)
        } else {
            write!(f, "Rp {}", grouped)
        }
    }
}

/// Total stock value (price × quantity) across products.
///
/// Returns `None` if any multiplication or the sum overflows.
pub fn stock_value(products: &[Product]) -> Option<Rupiah> {
    products.iter().try_fold(Rupiah::ZERO, |total, product| {
        Rupiah::new(product.price)
            .checked_mul(product.quantity)
            .and_then(|line| total.checked_add(line))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Rupiah::new(0).to_string(), "Rp 0");
        assert_eq!(Rupiah::new(500).to_string(), "Rp 500");
        assert_eq!(Rupiah::new(1_000).to_string(), "Rp 1.000");
        assert_eq!(Rupiah::new(150_000).to_string(), "Rp 150.000");
        assert_eq!(Rupiah::new(12_500_000).to_string(), "Rp 12.500.000");
        assert_eq!(Rupiah::new(-2_500).to_string(), "-Rp 2.500");
    }

    #[test]
    fn test_stock_value() {
        let products = vec![
            Product {
                id: ProductId::Remote(1),
                name: "Keyboard".into(),
                price: 150_000,
                quantity: 2,
                category: "Peripherals".into(),
                purchased: false,
            },
            Product {
                id: ProductId::Remote(2),
                name: "Mouse".into(),
                price: 50_000,
                quantity: 3,
                category: "Peripherals".into(),
                purchased: true,
            },
        ];

        assert_eq!(stock_value(&products), Some(Rupiah::new(450_000)));
        assert_eq!(stock_value(&[]), Some(Rupiah::ZERO));
    }

    #[test]
    fn test_stock_value_overflow() {
        let products = vec![Product {
            id: ProductId::Remote(1),
            name: "Server".into(),
            price: i64::MAX,
            quantity: 2,
            category: "Hardware".into(),
            purchased: false,
        }];
        assert_eq!(stock_value(&products), None);
    }
}
