//! # Money Module
//!
//! `Money` and `TaxRate`, the two numeric types every price, line total and
//! invoice amount flows through.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Float prices:  0.1 + 0.2 = 0.30000000000000004  ❌                     │
//! │                                                                         │
//! │  Invoice totals summed from floats drift by fractions of a cent, and    │
//! │  the drift differs between the cart page and the printed invoice.       │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units + tax in basis points                │
//! │    price 100 × qty 2 = 200                                              │
//! │    tax 200 × 1900 bps = 38 (rounded half-up once, at the end)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use facturo_core::money::{Money, TaxRate};
//!
//! let price = Money::from_cents(1099);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! let tax = line.calculate_tax(TaxRate::from_bps(1900));
//! assert_eq!(tax.cents(), 626);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100%.
pub const BPS_SCALE: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit ("cents").
///
/// ## Design Decisions
/// - **i64 (signed)**: the invoice calculator may legitimately produce a
///   negative total when a discount exceeds subtotal + tax; callers decide
///   whether to accept it.
/// - **Transparent serde**: serializes as a bare integer.
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► CartItem.unit_price ──► Cart.total()
///        │
///        └──► InvoiceItem.unit_price ──► InvoiceTotals { subtotal, tax, total }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use facturo_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount, rounding half-up to the minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so large
    /// invoices cannot overflow mid-calculation.
    ///
    /// ```rust
    /// use facturo_core::money::{Money, TaxRate};
    ///
    /// // 200 at 19% = 38
    /// assert_eq!(Money::from_cents(200).calculate_tax(TaxRate::from_bps(1900)).cents(), 38);
    /// // 1000 at 8.25% = 82.5 → 83
    /// assert_eq!(Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825)).cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        let half = (BPS_SCALE / 2) as i128;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_SCALE as i128
        } else {
            (scaled - half) / BPS_SCALE as i128
        };
        Money::from_cents(rounded as i64)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// Unchecked: only for amounts already bounded by validation. Use
    /// [`Money::checked_multiply_quantity`] on anything else.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `None` when the line total does not fit in `i64`.
    ///
    /// ```rust
    /// use facturo_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(4).checked_multiply_quantity(3), Some(Money::from_cents(12)));
    /// assert_eq!(Money::from_cents(4).checked_multiply_quantity(1 << 62), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Debug-oriented display; the frontend formats for the user's locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points: 1 bps = 0.01%, so 1900 bps = 19% = 0.19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let money = Money::from_cents(1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);

        let negative = Money::from_cents(-550);
        assert_eq!(negative.major(), -5);
        assert_eq!(negative.minor(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        assert_eq!(Money::from_cents(200).calculate_tax(TaxRate::from_bps(1900)).cents(), 38);
        assert_eq!(Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825)).cents(), 83);
        // 10 × 19% = 1.9 → 2
        assert_eq!(Money::from_cents(10).calculate_tax(TaxRate::from_bps(1900)).cents(), 2);
        assert_eq!(Money::from_cents(12345).calculate_tax(TaxRate::zero()).cents(), 0);
    }

    #[test]
    fn test_tax_rounding_is_symmetric_for_negatives() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(Money::from_cents(-1000).calculate_tax(rate).cents(), -83);
    }

    #[test]
    fn test_tax_rate_percentage() {
        assert!((TaxRate::from_bps(1900).percentage() - 19.0).abs() < 1e-9);
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 1e-9);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let price = Money::from_cents(4);
        assert_eq!(price.checked_multiply_quantity(1 << 62), None);
        assert_eq!(price.checked_multiply_quantity(-(1 << 62)), None);

        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(500).checked_sub(Money::from_cents(700)),
            Some(Money::from_cents(-200))
        );
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_cents(4200)).unwrap();
        assert_eq!(json, "4200");
        let back: TaxRate = serde_json::from_str("1900").unwrap();
        assert_eq!(back.bps(), 1900);
    }
}
