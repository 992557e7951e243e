//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    180 × 18% = 32.400000000000006  ❌ WRONG!                            │
//! │                                                                         │
//! │  THE EARLY-ROUNDING PROBLEM                                             │
//! │    Tax 0.33 rounded to paise, halved → 0.16 + 0.16 = 0.32 (lost 0.01)  │
//! │                                                                         │
//! │  OUR SOLUTION: Exact decimals, round only at the edge                   │
//! │    0.33 / 2 = 0.165 exactly; CGST + SGST == total tax, always           │
//! │    Rounding (half-up, to paise) happens on display and persistence      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bahi_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let rate = Money::from_rupees(100);
//! let value = rate.multiply_quantity(Decimal::from(2)).apply_discount(Decimal::from(10));
//! assert_eq!(value, Money::from_rupees(180));
//!
//! let tax = value.percent(Decimal::from(18));
//! assert_eq!(tax, Money::from_paise(3240));
//! assert_eq!(tax.half(), Money::from_paise(1620));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Number of decimal places a rupee amount is rounded to (paise).
pub const CURRENCY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// An exact rupee amount.
///
/// ## Design Decisions
/// - **Decimal (signed)**: line values, taxes and totals stay exact through
///   every multiplication, discount and split
/// - **Single field tuple struct**: zero-cost wrapper
/// - **Transparent serde**: serialized the same way as the decimal itself
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  StockItem.rate ──► CartLine.rate ──► line value ──► taxable value      │
/// │                                           │                              │
/// │                                           └──► line tax ──► CGST/SGST   │
/// │                                                              or IGST     │
/// │  OtherCharge.amount ──► other subtotal + other GST ──► grand total      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal rupee amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use bahi_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.to_string(), "₹10.99");
    /// ```
    #[inline]
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, CURRENCY_SCALE))
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub fn from_rupees(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the exact decimal amount in rupees.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Rounds to paise, half-up (midpoint away from zero).
    ///
    /// ## Example
    /// ```rust
    /// use bahi_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let half_paisa = Money::new(Decimal::new(165, 3)); // 0.165
    /// assert_eq!(half_paisa.round_half_up(), Money::from_paise(17));
    /// ```
    pub fn round_half_up(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns the amount in paise after half-up rounding.
    pub fn paise(&self) -> i64 {
        (self.round_half_up().0 * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or_default()
    }

    /// Multiplies a unit rate by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: Decimal) -> Money {
        Money(self.0 * qty)
    }

    /// Returns `percent`% of this amount, exactly.
    ///
    /// Used for GST: `line_value.percent(grate)`.
    #[inline]
    pub fn percent(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use bahi_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let gross = Money::from_rupees(200);
    /// assert_eq!(gross.apply_discount(Decimal::from(10)), Money::from_rupees(180));
    /// ```
    #[inline]
    pub fn apply_discount(&self, discount_percent: Decimal) -> Money {
        Money(self.0 * (Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED))
    }

    /// Splits the amount into two exactly equal halves (CGST / SGST).
    #[inline]
    pub fn half(&self) -> Money {
        Money(self.0 / Decimal::TWO)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the paise-rounded amount with a rupee sign.
///
/// ## Note
/// This is for logs and debugging. Tenant-facing output goes through
/// [`crate::totals::CurrencyFormat`], which adds digit grouping.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_half_up().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}₹{:.2}", sign, rounded.abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

/// Multiplication by a decimal quantity.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
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
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
