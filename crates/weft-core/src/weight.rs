//! # Weight Module
//!
//! Provides the `Weight` type for handling weighbridge values safely.
//!
//! ## Why Integer Weight?
//! ```text
//! In floating point:
//!   0.1 + 0.2 = 0.30000000000000004  -> a reconciliation that never balances
//!
//! OUR SOLUTION: integer grams
//!   40.00 kg + 60.00 kg = 40_000 g + 60_000 g = 100_000 g, exactly
//! ```
//!
//! Weighbridge tickets carry 0.01 kg resolution, so every captured value is a
//! whole number of grams and detail-line sums stay exact. The reconciliation
//! tolerance of 0.01 kg is exactly [`WEIGHT_TOLERANCE`] = 10 g.
//!
//! ## Usage
//! ```rust
//! use weft_core::weight::Weight;
//!
//! let gross = Weight::from_kg(102);        // 102.00 kg
//! let tare = Weight::from_grams(1_500);    // 1.50 kg
//! let net = gross.less_tare(tare);
//! assert_eq!(net.grams(), 100_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Reconciliation tolerance for weight aggregates: 0.01 kg.
pub const WEIGHT_TOLERANCE: Weight = Weight::from_grams(10);

// =============================================================================
// Weight Type
// =============================================================================

/// A weight in grams, the smallest unit the system records.
///
/// ## Design Decisions
/// - **i64 (signed)**: a nett weight computed from a bad ticket can go
///   negative; validation catches it instead of a panic
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
///
/// Every weight in the system flows through this type: bale gross/tare/nett,
/// issue-line weights, detail-set aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Weight(i64);

impl Weight {
    /// Creates a Weight from grams.
    ///
    /// ## Example
    /// ```rust
    /// use weft_core::weight::Weight;
    ///
    /// let w = Weight::from_grams(100_500); // 100.50 kg
    /// assert_eq!(w.grams(), 100_500);
    /// ```
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    /// Creates a Weight from whole kilograms.
    #[inline]
    pub const fn from_kg(kg: i64) -> Self {
        Weight(kg * 1000)
    }

    /// Creates a Weight from kilograms and hundredths (weighbridge ticket
    /// resolution).
    ///
    /// ## Example
    /// ```rust
    /// use weft_core::weight::Weight;
    ///
    /// let w = Weight::from_kg_hundredths(102, 50); // 102.50 kg
    /// assert_eq!(w.grams(), 102_500);
    /// ```
    #[inline]
    pub const fn from_kg_hundredths(kg: i64, hundredths: i64) -> Self {
        if kg < 0 {
            Weight(kg * 1000 - hundredths * 10)
        } else {
            Weight(kg * 1000 + hundredths * 10)
        }
    }

    /// Returns the value in grams.
    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    /// Returns the whole-kilogram portion.
    #[inline]
    pub const fn kilograms(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns the hundredths-of-a-kilogram portion (always 0-99).
    #[inline]
    pub const fn hundredths_part(&self) -> i64 {
        ((self.0 % 1000) / 10).abs()
    }

    /// Zero weight.
    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Weight(self.0.abs())
    }

    /// Nett weight after deducting tare.
    ///
    /// ## Example
    /// ```rust
    /// use weft_core::weight::Weight;
    ///
    /// let gross = Weight::from_grams(102_500);
    /// let tare = Weight::from_grams(2_500);
    /// assert_eq!(gross.less_tare(tare).grams(), 100_000);
    /// ```
    #[inline]
    pub const fn less_tare(&self, tare: Weight) -> Self {
        Weight(self.0 - tare.0)
    }

    /// Checks whether this value is within `tolerance` of `other`.
    ///
    /// Used by the detail-set reconciler: a declared header aggregate and a
    /// computed line sum agree when their difference does not exceed the
    /// tolerance.
    #[inline]
    pub const fn within(&self, other: Weight, tolerance: Weight) -> bool {
        (self.0 - other.0).abs() <= tolerance.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display at weighbridge resolution (two decimals), e.g. `"102.50 kg"`.
///
/// ## Note
/// This is the form reconciliation mismatches are reported in.
impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} kg",
            sign,
            self.kilograms().abs(),
            self.hundredths_part()
        )
    }
}

/// Default weight is zero.
impl Default for Weight {
    fn default() -> Self {
        Weight::zero()
    }
}

impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Weight {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Weight(self.0 - other.0)
    }
}

impl SubAssign for Weight {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Summing an iterator of weights (detail-line totals).
impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), |acc, w| acc + w)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grams() {
        let w = Weight::from_grams(102_500);
        assert_eq!(w.grams(), 102_500);
        assert_eq!(w.kilograms(), 102);
        assert_eq!(w.hundredths_part(), 50);
    }

    #[test]
    fn test_from_kg_hundredths() {
        let w = Weight::from_kg_hundredths(102, 50);
        assert_eq!(w.grams(), 102_500);

        let negative = Weight::from_kg_hundredths(-5, 50);
        assert_eq!(negative.grams(), -5_500);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Weight::from_grams(102_500)), "102.50 kg");
        assert_eq!(format!("{}", Weight::from_grams(100_000)), "100.00 kg");
        assert_eq!(format!("{}", Weight::from_grams(-5_500)), "-5.50 kg");
        assert_eq!(format!("{}", Weight::zero()), "0.00 kg");
    }

    #[test]
    fn test_arithmetic() {
        let a = Weight::from_grams(40_000);
        let b = Weight::from_grams(60_000);

        assert_eq!((a + b).grams(), 100_000);
        assert_eq!((b - a).grams(), 20_000);

        let total: Weight = [a, b, Weight::from_grams(500)].into_iter().sum();
        assert_eq!(total.grams(), 100_500);
    }

    #[test]
    fn test_less_tare() {
        let gross = Weight::from_grams(102_500);
        let tare = Weight::from_grams(2_500);
        assert_eq!(gross.less_tare(tare).grams(), 100_000);

        // A bad ticket can produce a negative nett; validation rejects it
        // upstream, the type itself stays total.
        let bad = Weight::from_grams(1_000).less_tare(Weight::from_grams(2_000));
        assert!(bad.is_negative());
    }

    #[test]
    fn test_within_tolerance() {
        let declared = Weight::from_kg(100);
        assert!(declared.within(Weight::from_grams(100_010), WEIGHT_TOLERANCE));
        assert!(declared.within(Weight::from_grams(99_990), WEIGHT_TOLERANCE));
        assert!(!declared.within(Weight::from_grams(100_011), WEIGHT_TOLERANCE));
        assert!(!declared.within(Weight::from_kg(101), WEIGHT_TOLERANCE));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Weight::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Weight::from_grams(1).is_positive());
        assert!(Weight::from_grams(-1).is_negative());
        assert_eq!(Weight::from_grams(-1).abs().grams(), 1);
    }
}
