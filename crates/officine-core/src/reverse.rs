//! # Reverse Pricing Resolver
//!
//! Inverts a desired TTC shelf price back into its cost components.
//!
//! The forward computation prices a product as:
//!
//! ```text
//! HT  = purchase cost × sale coefficient
//! TTC = HT + HT × taux TVA + HT × taux centime
//!     = HT × k        where k = 1 + taux TVA + taux centime
//! ```
//!
//! Both levies are assessed on the HT base (the centime additionnel is not
//! compounded on top of the TVA), so a single combined divisor inverts the
//! whole chain:
//!
//! ```text
//! HT             = TTC / k
//! TVA amount     = HT × taux TVA
//! centime amount = HT × taux centime
//! purchase cost  = HT / coefficient
//! ```
//!
//! The pharmacist types the shelf price they want; the system answers what
//! the product must be bought at for that price to hold. Feeding the implied
//! purchase cost back through [`shelf_price`] reproduces the desired TTC
//! within one minor unit of rounding.

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, PricingResult};
use crate::money::Money;
use crate::types::PricingCategory;

/// Cost components recovered from a desired TTC price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversePricing {
    /// Price excluding taxes.
    pub price_ht_cents: i64,
    /// TVA portion of the desired TTC.
    pub vat_cents: i64,
    /// Centime additionnel portion.
    pub centime_cents: i64,
    /// Purchase cost implied by the category's sale coefficient.
    pub purchase_cost_cents: i64,
}

/// Forward shelf pricing from a purchase cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfPrice {
    pub price_ht_cents: i64,
    pub vat_cents: i64,
    pub centime_cents: i64,
    pub price_ttc_cents: i64,
}

/// Inverts a desired TTC price under a pricing category.
///
/// ## Errors
/// - `InvalidPrice` when `desired_ttc <= 0`
/// - `InvalidRate` when a category rate exceeds 100%
/// - `InvalidCoefficient` when the sale coefficient is zero
///
/// ## Example
/// ```rust
/// use officine_core::money::Money;
/// use officine_core::reverse::reverse_price;
/// use officine_core::types::PricingCategory;
/// use chrono::Utc;
///
/// let category = PricingCategory {
///     id: "cat-1".into(),
///     name: "Spécialités 18%".into(),
///     vat_rate_bps: 1800,
///     centime_rate_bps: 0,
///     sale_coefficient_bps: 12_500,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let components = reverse_price(Money::from_cents(100_000), &category).unwrap();
/// assert_eq!(components.price_ht_cents, 84_746);      // 847.46
/// assert_eq!(components.vat_cents, 15_254);           // 152.54
/// assert_eq!(components.purchase_cost_cents, 67_797); // 677.97
/// ```
pub fn reverse_price(
    desired_ttc: Money,
    category: &PricingCategory,
) -> PricingResult<ReversePricing> {
    if !desired_ttc.is_positive() {
        return Err(PricingError::InvalidPrice {
            cents: desired_ttc.cents(),
        });
    }
    validate_category(category)?;

    // Combined divisor k, scaled to basis points.
    let k_bps = 10_000_i128 + category.vat_rate_bps as i128 + category.centime_rate_bps as i128;

    let price_ht = Money::from_cents(div_half_up(desired_ttc.cents() as i128 * 10_000, k_bps));
    let vat = price_ht.apply_rate(category.vat_rate());
    let centime = price_ht.apply_rate(category.centime_rate());
    let purchase_cost = category.sale_coefficient().invert(price_ht);

    Ok(ReversePricing {
        price_ht_cents: price_ht.cents(),
        vat_cents: vat.cents(),
        centime_cents: centime.cents(),
        purchase_cost_cents: purchase_cost.cents(),
    })
}

/// Forward shelf pricing: purchase cost → HT → taxed TTC.
///
/// Used when receiving stock at a known cost, and as the round-trip check
/// for [`reverse_price`].
pub fn shelf_price(
    purchase_cost: Money,
    category: &PricingCategory,
) -> PricingResult<ShelfPrice> {
    if purchase_cost.is_negative() {
        return Err(PricingError::InvalidPrice {
            cents: purchase_cost.cents(),
        });
    }
    validate_category(category)?;

    let price_ht = category.sale_coefficient().apply(purchase_cost);
    let vat = price_ht.apply_rate(category.vat_rate());
    let centime = price_ht.apply_rate(category.centime_rate());
    let price_ttc = price_ht + vat + centime;

    Ok(ShelfPrice {
        price_ht_cents: price_ht.cents(),
        vat_cents: vat.cents(),
        centime_cents: centime.cents(),
        price_ttc_cents: price_ttc.cents(),
    })
}

fn validate_category(category: &PricingCategory) -> PricingResult<()> {
    if !category.vat_rate().is_valid() {
        return Err(PricingError::InvalidRate {
            field: "vat_rate",
            bps: category.vat_rate_bps,
        });
    }
    if !category.centime_rate().is_valid() {
        return Err(PricingError::InvalidRate {
            field: "centime_rate",
            bps: category.centime_rate_bps,
        });
    }
    if category.sale_coefficient().is_zero() {
        return Err(PricingError::InvalidCoefficient {
            bps: category.sale_coefficient_bps,
        });
    }
    Ok(())
}

/// Half-up integer division for non-negative numerators.
#[inline]
fn div_half_up(num: i128, den: i128) -> i64 {
    ((num + den / 2) / den) as i64
}

// =============================================================================
// Unit Tests
// =============================================================================
