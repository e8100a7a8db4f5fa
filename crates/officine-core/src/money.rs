//! # Money Module
//!
//! Provides the `Money`, `Rate` and `SaleCoefficient` types used by every
//! monetary computation in Officine POS.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a pharmacy, the TVA and the additional centime are levied on        │
//! │  every line of every ticket. Accumulated float error shows up on the    │
//! │  daily Z report as money that never existed.                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (centimes)                           │
//! │    100000 = 1000.00 FC. Every rounding step is explicit, half-up,       │
//! │    and happens exactly once per derived amount.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use officine_core::money::{Money, Rate};
//!
//! // 1000.00 in minor units
//! let price_ht = Money::from_cents(100_000);
//!
//! // TVA at 18% = 180.00
//! let tva = price_ht.apply_rate(Rate::from_bps(1800));
//! assert_eq!(tva.cents(), 18_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centimes).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds and ledger reversals
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// Every monetary value in the system flows through this type: catalog
/// prices, line totals, the insurance split, caution balances, change due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn subunits(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// Applies a percentage rate with half-up rounding.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  HALF-UP ROUNDING IN INTEGER MATH                                   │
    /// │                                                                     │
    /// │  rate is in basis points: 1800 = 18.00%                             │
    /// │  Formula: (amount_cents * bps + 5000) / 10000                       │
    /// │  The +5000 provides the rounding (5000/10000 = 0.5)                 │
    /// │                                                                     │
    /// │  Each derived amount (TVA, centime, couverture, remise) is rounded  │
    /// │  exactly once, at the point it becomes a display amount. No error   │
    /// │  ever compounds across steps.                                       │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use officine_core::money::{Money, Rate};
    ///
    /// let subtotal = Money::from_cents(246_000); // 2460.00
    /// let couverture = subtotal.apply_rate(Rate::from_bps(7000)); // 70%
    /// assert_eq!(couverture.cents(), 172_200); // 1722.00
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        // i128 prevents overflow on large amounts
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10_000;
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage rate in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (TVA), 500 bps = 5% (centime additionnel)
///
/// All business rates in the system (TVA, centime additionnel, insurance
/// coverage, ticket modérateur, automatic discount) are percentages in
/// [0, 100]%, i.e. bps in [0, 10000].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Maximum representable business rate: 100% = 10000 bps.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks the rate is a valid business percentage (0-100%).
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 <= Self::MAX_BPS
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Sale Coefficient
// =============================================================================

/// Multiplier applied to a purchase cost to obtain the HT sale price,
/// expressed in basis points of unity: 10000 = ×1.00, 12500 = ×1.25.
///
/// Owned by a pricing category; a coefficient of zero is invalid and is
/// rejected by the reverse pricing resolver before any division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCoefficient(u32);

impl SaleCoefficient {
    /// Identity coefficient (×1.00).
    pub const UNIT_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        SaleCoefficient(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the coefficient as a plain multiplier (for display only).
    #[inline]
    pub fn multiplier(&self) -> f64 {
        self.0 as f64 / Self::UNIT_BPS as f64
    }

    /// Applies the coefficient: purchase cost → HT price, half-up.
    pub fn apply(&self, cost: Money) -> Money {
        let cents = (cost.cents() as i128 * self.0 as i128 + 5000) / 10_000;
        Money::from_cents(cents as i64)
    }

    /// Inverts the coefficient: HT price → implied purchase cost, half-up.
    ///
    /// Caller must reject a zero coefficient first; this divides by it.
    pub fn invert(&self, price_ht: Money) -> Money {
        let bps = self.0 as i128;
        let cents = (price_ht.cents() as i128 * 10_000 + bps / 2) / bps;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount in major.minor form without a currency symbol.
/// Symbol and locale belong to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.subunits())
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

// =============================================================================
// Unit Tests
// =============================================================================
