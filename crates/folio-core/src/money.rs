//! # Money
//!
//! Whole-cent amounts and the exact arithmetic the pricing engine runs on.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CENTS IN, CENTS OUT                                                    │
//! │                                                                         │
//! │  Float totals drift:   40 * 0.08 + 5 = 8.200000000000001                │
//! │                                                                         │
//! │  Folio keeps every stored amount as i64 cents. Rate products are        │
//! │  carried as exact i128 "cents × 10000" values and only turned back      │
//! │  into cents once, with round-half-to-even.                              │
//! │                                                                         │
//! │    Money ──scaled()──►  i128  ──(+ − tax, shipping, discount)──►        │
//! │           scaled_bps()          round_half_even(n, BPS_SCALE) ──► Money │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use folio_core::money::Money;
//!
//! let copy = Money::from_cents(1250);
//! let line = copy * 3 + Money::from_cents(99);
//! assert_eq!(line.cents(), 3849);
//! assert_eq!(line.to_string(), "$38.49");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// 10000 basis points make a whole; also the scale of exact intermediates.
pub const BPS_SCALE: i128 = 10_000;

/// An amount of the store currency in its minor unit.
///
/// Signed so a discount can be subtracted before the grand total is floored.
/// Arithmetic saturates at the `i64` bounds instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::ZERO
    }

    /// Parses a decimal major-unit price such as `19.99` from a raw catalog
    /// record. Ties go to the even cent; non-finite or out-of-range input
    /// yields `None`.
    ///
    /// ```rust
    /// use folio_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(19.99), Some(Money::from_cents(1999)));
    /// assert_eq!(Money::from_major_f64(f64::NAN), None);
    /// ```
    pub fn from_major_f64(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round_ties_even();
        if !(i64::MIN as f64..=i64::MAX as f64).contains(&cents) {
            return None;
        }
        Some(Money(cents as i64))
    }

    /// Turns the exact quantity `numerator / denominator` cents into whole
    /// cents. Ties go to the even neighbour, negatives included.
    ///
    /// ```rust
    /// use folio_core::money::Money;
    ///
    /// let halves: Vec<i64> = [5, 15, 25, 35, -25]
    ///     .iter()
    ///     .map(|n| Money::round_half_even(*n, 10).cents())
    ///     .collect();
    /// assert_eq!(halves, vec![0, 2, 2, 4, -2]);
    /// ```
    ///
    /// `denominator` must be positive. Results beyond the `i64` range
    /// saturate.
    pub fn round_half_even(numerator: i128, denominator: i128) -> Money {
        debug_assert!(denominator > 0, "denominator must be positive");
        let floor = numerator.div_euclid(denominator);
        let twice_rem = numerator.rem_euclid(denominator) * 2;

        let round_up = match twice_rem.cmp(&denominator) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => floor % 2 != 0,
            std::cmp::Ordering::Less => false,
        };

        let rounded = if round_up { floor + 1 } else { floor };
        Money(i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX }))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Floors the amount at zero.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Self::ZERO
        } else {
            *self
        }
    }

    /// The amount as an exact "cents × 10000" intermediate.
    #[inline]
    pub const fn scaled(&self) -> i128 {
        self.0 as i128 * BPS_SCALE
    }

    /// `self × bps`, unrounded, in "cents × 10000".
    #[inline]
    pub const fn scaled_bps(&self, bps: u32) -> i128 {
        self.0 as i128 * bps as i128
    }

    /// Tax on this amount at `rate`, rounded half to even.
    ///
    /// ```rust
    /// use folio_core::money::Money;
    /// use folio_core::types::TaxRate;
    ///
    /// assert_eq!(Money::from_cents(4000).tax_at(TaxRate::from_bps(800)).cents(), 320);
    /// // 82.5¢ lands on the even cent
    /// assert_eq!(Money::from_cents(1000).tax_at(TaxRate::from_bps(825)).cents(), 82);
    /// ```
    pub fn tax_at(&self, rate: TaxRate) -> Money {
        Money::round_half_even(self.scaled_bps(rate.bps()), BPS_SCALE)
    }

    #[inline]
    pub const fn multiply_quantity(&self, quantity: i64) -> Self {
        Money(self.0.saturating_mul(quantity))
    }
}

/// `$12.34` style, for logs and messages. Shop-facing text goes through
/// `CurrencyConfig::format`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, quantity: i64) -> Money {
        self.multiply_quantity(quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}
