//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Money
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004                                  │
//! │                                                                     │
//! │  OUR REPRESENTATION: whole đồng as i64                              │
//! │    Vietnamese đồng has no minor unit in circulation, so the         │
//! │    smallest settleable amount is 1 ₫ and every value fits an        │
//! │    integer exactly.                                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! Wherever a calculation can produce a fractional đồng (VAT application),
//! the result is rounded **half up to the nearest whole đồng**, in integer
//! math. This is the single rounding policy of the whole system.
//!
//! ## Usage
//! ```rust
//! use voltbill_core::money::Money;
//! use voltbill_core::types::VatRate;
//!
//! let net = Money::from_dong(99_250);
//! let vat = VatRate::from_bps(1000); // 10%
//!
//! assert_eq!(net.vat_amount(vat).dong(), 9_925);
//! assert_eq!(net.with_vat(vat).dong(), 109_175);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::VatRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole Vietnamese đồng.
///
/// - **i64 (signed)**: negative values represent corrections and refunds
/// - **Newtype over i64**: zero-cost, serializes as a plain integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole đồng.
    ///
    /// ## Example
    /// ```rust
    /// use voltbill_core::money::Money;
    ///
    /// let price = Money::from_dong(1985);
    /// assert_eq!(price.dong(), 1985);
    /// ```
    #[inline]
    pub const fn from_dong(dong: i64) -> Self {
        Money(dong)
    }

    /// Returns the value in whole đồng.
    #[inline]
    pub const fn dong(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
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
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity (e.g. đồng/kWh × kWh).
    ///
    /// ## Example
    /// ```rust
    /// use voltbill_core::money::Money;
    ///
    /// let unit_price = Money::from_dong(1985); // 1985 ₫/kWh
    /// let line_total = unit_price.multiply_quantity(50);
    /// assert_eq!(line_total.dong(), 99_250);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates the VAT amount on this (net) value.
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// Intermediate products use i128 so large invoices cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use voltbill_core::money::Money;
    /// use voltbill_core::types::VatRate;
    ///
    /// let net = Money::from_dong(320_850);
    /// let vat = net.vat_amount(VatRate::from_bps(1000)); // 10%
    /// assert_eq!(vat.dong(), 32_085);
    /// ```
    pub fn vat_amount(&self, rate: VatRate) -> Money {
        // rate.bps() is basis points: 1000 = 10.00%
        let vat = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_dong(vat as i64)
    }

    /// Returns the gross value: this (net) value plus VAT.
    ///
    /// ## Example
    /// ```rust
    /// use voltbill_core::money::Money;
    /// use voltbill_core::types::VatRate;
    ///
    /// let net = Money::from_dong(59_550);
    /// assert_eq!(net.with_vat(VatRate::from_bps(1000)).dong(), 65_505);
    /// ```
    pub fn with_vat(&self, rate: VatRate) -> Money {
        *self + self.vat_amount(rate)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money with dot thousand separators, the
/// customary Vietnamese format: `1.421.000 ₫`.
///
/// This is for logs and debugging. Presentation layers own final formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} \u{20ab}", sign, group_thousands(self.0.unsigned_abs()))
    }
}

/// Groups digits in threes with `.` separators.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
