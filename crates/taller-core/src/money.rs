//! # Money Module
//!
//! Provides the `Money` type for monetary values on a purchase.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A purchase line of 3 × 0.10 with 21% IVA must come out the same       │
//! │  on the form, on the submitted payload and on the supplier invoice.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of cents. Products with quantities     │
//! │    and tax rates are computed in i128 and rounded exactly once.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taller_core::money::Money;
//! use taller_core::types::{Quantity, TaxRate};
//!
//! let price = Money::from_cents(10_000); // 100.00
//! let qty = Quantity::units(2);
//!
//! assert_eq!(price.checked_multiply_quantity(qty).unwrap().cents(), 20_000);
//! assert_eq!(
//!     price.checked_tax_for_quantity(qty, TaxRate::from_bps(1000)).unwrap().cents(),
//!     2_000
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::{Quantity, TaxRate};

/// Basis points in one whole (100%).
const BPS_SCALE: i128 = 10_000;

/// Milli-units in one whole quantity unit.
const QTY_SCALE: i128 = 1_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Aggregates and differences may go negative in tests
///   and reports, even though line prices never do
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  ProductSummary.default_unit_price ──► LineItem.unit_price             │
/// │                                             │                           │
/// │                       quantity × price ─────┼──► LineItem.iva_amount    │
/// │                                             └──► LineItem.line_total    │
/// │                                                        │                │
/// │                                   PurchaseTotals.total ◄┘                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use taller_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    ///
    /// ```rust
    /// use taller_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// The result is rounded half away from zero to whole cents. `None`
    /// when it does not fit in `i64` cents.
    ///
    /// ## Example
    /// ```rust
    /// use taller_core::money::Money;
    /// use taller_core::types::Quantity;
    ///
    /// let hourly = Money::from_cents(3_333);
    /// // 1.5 hours of labour = 49.995 → 50.00
    /// let net = hourly.checked_multiply_quantity(Quantity::from_milli(1_500)).unwrap();
    /// assert_eq!(net.cents(), 5_000);
    ///
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(Quantity::units(2)), None);
    /// ```
    pub fn checked_multiply_quantity(&self, qty: Quantity) -> Option<Money> {
        let exact = self.0 as i128 * qty.milli() as i128;
        narrow(round_div(exact, QTY_SCALE))
    }

    /// Calculates the IVA owed on `qty × self` at `rate`.
    ///
    /// ## Implementation
    /// The tax is taken from the exact product `cents × milli × bps`, not
    /// from the already-rounded net amount, so rounding happens exactly once:
    /// `round(cents × milli × bps / (1000 × 10000))`.
    ///
    /// ## Example
    /// ```rust
    /// use taller_core::money::Money;
    /// use taller_core::types::{Quantity, TaxRate};
    ///
    /// let price = Money::from_cents(1000);
    /// let tax = price.checked_tax_for_quantity(Quantity::units(1), TaxRate::from_bps(825));
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// assert_eq!(tax.map(|t| t.cents()), Some(83));
    /// ```
    pub fn checked_tax_for_quantity(&self, qty: Quantity, rate: TaxRate) -> Option<Money> {
        // cents × milli × bps can exceed i128 for unvalidated inputs.
        let exact = (self.0 as i128)
            .checked_mul(qty.milli() as i128)?
            .checked_mul(rate.bps() as i128)?;
        narrow(round_div(exact, QTY_SCALE * BPS_SCALE))
    }
}

fn narrow(cents: i128) -> Option<Money> {
    i64::try_from(cents).ok().map(Money)
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`12.34`). Currency symbols are applied by the
/// session's configured formatter.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

/// Multiplication by a whole count.
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

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
