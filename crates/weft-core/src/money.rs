//! # Money Module
//!
//! Monetary values in integer paise, same doctrine as [`crate::weight`]:
//! the smallest unit, never floating point. Used for lot rates, bale values
//! and invoice amounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::weight::Weight;

/// Reconciliation tolerance for money aggregates: one paisa.
pub const AMOUNT_TOLERANCE: Money = Money::from_paise(1);

/// A monetary value in paise (1/100 rupee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Line amount for a per-kilogram rate applied to a weight.
    ///
    /// Rounded to the nearest paisa; i128 widening prevents overflow on
    /// season-sized weights.
    ///
    /// ## Example
    /// ```rust
    /// use weft_core::money::Money;
    /// use weft_core::weight::Weight;
    ///
    /// let rate = Money::from_rupees(52);           // Rs 52.00 / kg
    /// let nett = Weight::from_grams(100_500);      // 100.50 kg
    /// assert_eq!(rate.for_weight(nett).paise(), 522_600);
    /// ```
    pub fn for_weight(&self, weight: Weight) -> Money {
        let paise = (self.0 as i128 * weight.grams() as i128 + 500) / 1000;
        Money::from_paise(paise as i64)
    }

    /// Checks whether this value is within `tolerance` of `other`.
    #[inline]
    pub const fn within(&self, other: Money, tolerance: Money) -> bool {
        (self.0 - other.0).abs() <= tolerance.0
    }
}

/// Display for audit messages, e.g. `"Rs 522.60"`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rs {}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let m = Money::from_paise(522_660);
        assert_eq!(m.paise(), 522_660);
        assert_eq!(m.rupees(), 5_226);
        assert_eq!(m.paise_part(), 60);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(522_660)), "Rs 5226.60");
        assert_eq!(format!("{}", Money::from_rupees(52)), "Rs 52.00");
        assert_eq!(format!("{}", Money::from_paise(-550)), "-Rs 5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1_000);
        let b = Money::from_paise(500);
        assert_eq!((a + b).paise(), 1_500);
        assert_eq!((a - b).paise(), 500);

        let total: Money = [a, b].into_iter().sum();
        assert_eq!(total.paise(), 1_500);
    }

    #[test]
    fn test_for_weight() {
        // Rs 52.00/kg over 100.50 kg = Rs 5226.00
        let rate = Money::from_rupees(52);
        assert_eq!(rate.for_weight(Weight::from_grams(100_500)).paise(), 522_600);

        // Rounding: Rs 0.01/kg over 1.50 kg = 1.5 paise -> 2 paise
        let tiny = Money::from_paise(1);
        assert_eq!(tiny.for_weight(Weight::from_grams(1_500)).paise(), 2);
    }

    #[test]
    fn test_within_tolerance() {
        let declared = Money::from_rupees(100);
        assert!(declared.within(Money::from_paise(10_001), AMOUNT_TOLERANCE));
        assert!(!declared.within(Money::from_paise(10_002), AMOUNT_TOLERANCE));
    }
}
