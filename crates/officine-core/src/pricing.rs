//! # Pricing Calculator
//!
//! Computes the complete taxed totals of a cart for a given payer.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      compute_totals()                                   │
//! │                                                                         │
//! │  1. total HT      = Σ (unit HT × qty)                                  │
//! │  2. TVA           = Σ line TVA        centime = Σ line centime         │
//! │  3. subtotal TTC  = HT + TVA + centime                                 │
//! │  4. payer split   ┌── insured ──► couverture = TTC × taux             │
//! │     (exclusive)   │              payer share = TTC − couverture        │
//! │                   ├── ticket modérateur > 0 (non-insured)             │
//! │                   │              TM = TTC × taux                       │
//! │                   │              payer share = TTC − TM                │
//! │                   └── otherwise  payer share = TTC                     │
//! │  5. remise auto (special only): payer share −= share × taux           │
//! │  6. amount due    = payer share                                        │
//! │                                                                         │
//! │  settle() then fills change for immediate tender:                      │
//! │  7. change        = max(0, tendered − due)   [cash/card must cover]   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Insurance coverage and ticket modérateur are mutually exclusive by
//! construction: coverage exists only inside `PayerKind::Insured`, and the
//! TM branch is only reachable for the other variants.
//!
//! The calculator is pure: no I/O, no clock, no state between calls. Every
//! call produces a fresh [`TransactionTotals`].

use crate::error::{PricingError, PricingResult};
use crate::money::{Money, Rate};
use crate::types::{CartLine, PayerKind, PayerProfile, PaymentMethod, TransactionTotals};

/// Computes the taxed totals, payer split and amount due for one cart.
///
/// Rejects before computing anything:
/// - an empty cart (`EmptyCart`)
/// - non-positive quantities, negative prices, or an HT/TTC pair that does
///   not match the line's rates (`InvalidLine`)
/// - any rate above 100% on a line or on the payer profile (`InvalidRate`)
///
/// ## Example
/// ```rust
/// use officine_core::pricing::compute_totals;
/// use officine_core::types::{CartLine, PayerProfile};
///
/// let line = CartLine {
///     product_id: "p-1".into(),
///     quantity: 2,
///     unit_price_ht_cents: 100_000,
///     unit_price_ttc_cents: 123_000,
///     vat_rate_bps: 1800,
///     centime_rate_bps: 500,
/// };
///
/// let totals = compute_totals(&[line], &PayerProfile::ordinary()).unwrap();
/// assert_eq!(totals.subtotal_ttc_cents, 246_000);
/// assert_eq!(totals.amount_due_cents, 246_000);
/// ```
pub fn compute_totals(
    lines: &[CartLine],
    payer: &PayerProfile,
) -> PricingResult<TransactionTotals> {
    if lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }

    for line in lines {
        validate_line(line)?;
    }
    validate_payer(payer)?;

    // Steps 1-3: tax bases, summed line by line so each line's TVA and
    // centime are rounded exactly once.
    let mut total_ht = Money::zero();
    let mut vat = Money::zero();
    let mut centime = Money::zero();

    for line in lines {
        total_ht += line.line_total_ht();
        vat += line.vat_amount();
        centime += line.centime_amount();
    }

    let subtotal_ttc = total_ht + vat + centime;

    // Step 4: payer split. Exactly one branch applies.
    let mut insurance = Money::zero();
    let mut ticket_moderateur = Money::zero();
    let mut payer_share = subtotal_ttc;

    match payer.kind {
        PayerKind::Insured { coverage_bps } => {
            insurance = subtotal_ttc.apply_rate(Rate::from_bps(coverage_bps));
            payer_share = subtotal_ttc - insurance;
        }
        PayerKind::Ordinary | PayerKind::Special { .. } => {
            if payer.ticket_moderateur_bps > 0 {
                ticket_moderateur =
                    subtotal_ttc.apply_rate(Rate::from_bps(payer.ticket_moderateur_bps));
                payer_share = subtotal_ttc - ticket_moderateur;
            }
        }
    }

    // Step 5: automatic discount on the payer share, special payers only.
    let mut discount = Money::zero();
    if let PayerKind::Special { discount_bps } = payer.kind {
        discount = payer_share.apply_rate(Rate::from_bps(discount_bps));
        payer_share -= discount;
    }

    // Step 6: the share is already in minor units; nothing left to round.
    let amount_due = payer_share;

    Ok(TransactionTotals {
        total_ht_cents: total_ht.cents(),
        vat_cents: vat.cents(),
        centime_cents: centime.cents(),
        subtotal_ttc_cents: subtotal_ttc.cents(),
        insurance_cents: insurance.cents(),
        ticket_moderateur_cents: ticket_moderateur.cents(),
        discount_cents: discount.cents(),
        payer_share_cents: payer_share.cents(),
        amount_due_cents: amount_due.cents(),
        change_cents: 0,
    })
}

/// Settles a tender against computed totals.
///
/// Returns a fresh totals structure with `change_cents` filled in.
/// Immediate methods (cash, card) must cover the amount due; a short
/// tender is rejected with `InsufficientTender`. Deferred methods accept
/// any non-negative tender - the uncovered remainder is the credit
/// guard's problem, not the calculator's.
pub fn settle(
    totals: &TransactionTotals,
    method: PaymentMethod,
    tendered: Money,
) -> PricingResult<TransactionTotals> {
    if tendered.is_negative() {
        return Err(PricingError::InvalidPrice {
            cents: tendered.cents(),
        });
    }

    let due = totals.amount_due();
    if !method.is_deferred() && tendered < due {
        return Err(PricingError::InsufficientTender {
            due_cents: due.cents(),
            tendered_cents: tendered.cents(),
        });
    }

    let change = (tendered - due).max(Money::zero());

    let mut settled = totals.clone();
    settled.change_cents = change.cents();
    Ok(settled)
}

/// The part of the amount due that a deferred tender leaves uncovered.
#[inline]
pub fn deferred_remainder(totals: &TransactionTotals, tendered: Money) -> Money {
    (totals.amount_due() - tendered).max(Money::zero())
}

fn validate_line(line: &CartLine) -> PricingResult<()> {
    if line.quantity <= 0 {
        return Err(PricingError::InvalidLine {
            product_id: line.product_id.clone(),
            reason: format!("quantity {} is not positive", line.quantity),
        });
    }

    if line.unit_price_ht_cents < 0 || line.unit_price_ttc_cents < 0 {
        return Err(PricingError::InvalidLine {
            product_id: line.product_id.clone(),
            reason: "negative unit price".to_string(),
        });
    }

    if !Rate::from_bps(line.vat_rate_bps).is_valid() {
        return Err(PricingError::InvalidRate {
            field: "vat_rate",
            bps: line.vat_rate_bps,
        });
    }

    if !Rate::from_bps(line.centime_rate_bps).is_valid() {
        return Err(PricingError::InvalidRate {
            field: "centime_rate",
            bps: line.centime_rate_bps,
        });
    }

    if !line.is_ttc_coherent() {
        return Err(PricingError::InvalidLine {
            product_id: line.product_id.clone(),
            reason: format!(
                "unit TTC {} does not match unit HT {} under the line rates",
                line.unit_price_ttc_cents, line.unit_price_ht_cents
            ),
        });
    }

    Ok(())
}

fn validate_payer(payer: &PayerProfile) -> PricingResult<()> {
    match payer.kind {
        PayerKind::Insured { coverage_bps } if !Rate::from_bps(coverage_bps).is_valid() => {
            return Err(PricingError::InvalidRate {
                field: "insurance_coverage",
                bps: coverage_bps,
            });
        }
        PayerKind::Special { discount_bps } if !Rate::from_bps(discount_bps).is_valid() => {
            return Err(PricingError::InvalidRate {
                field: "discount",
                bps: discount_bps,
            });
        }
        _ => {}
    }

    if !Rate::from_bps(payer.ticket_moderateur_bps).is_valid() {
        return Err(PricingError::InvalidRate {
            field: "ticket_moderateur",
            bps: payer.ticket_moderateur_bps,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 × (HT 1000.00, TVA 18%, centime 5%) - the reference cart used by
    /// most scenarios below.
    fn reference_cart() -> Vec<CartLine> {
        vec![CartLine {
            product_id: "p-1".to_string(),
            quantity: 2,
            unit_price_ht_cents: 100_000,
            unit_price_ttc_cents: 123_000,
            vat_rate_bps: 1800,
            centime_rate_bps: 500,
        }]
    }

    fn insured(coverage_bps: u32) -> PayerProfile {
        PayerProfile {
            kind: PayerKind::Insured { coverage_bps },
            ..PayerProfile::default()
        }
    }

    fn special(discount_bps: u32) -> PayerProfile {
        PayerProfile {
            kind: PayerKind::Special { discount_bps },
            ..PayerProfile::default()
        }
    }

    #[test]
    fn test_ordinary_cash_with_change() {
        let totals = compute_totals(&reference_cart(), &PayerProfile::ordinary()).unwrap();

        assert_eq!(totals.total_ht_cents, 200_000);
        assert_eq!(totals.vat_cents, 36_000);
        assert_eq!(totals.centime_cents, 10_000);
        assert_eq!(totals.subtotal_ttc_cents, 246_000);
        assert_eq!(totals.insurance_cents, 0);
        assert_eq!(totals.ticket_moderateur_cents, 0);
        assert_eq!(totals.amount_due_cents, 246_000);

        // Tender 2478.00 -> change 18.00
        let settled = settle(&totals, PaymentMethod::Cash, Money::from_cents(247_800)).unwrap();
        assert_eq!(settled.change_cents, 1_800);
    }

    #[test]
    fn test_insured_split() {
        let totals = compute_totals(&reference_cart(), &insured(7000)).unwrap();

        assert_eq!(totals.insurance_cents, 172_200);
        assert_eq!(totals.payer_share_cents, 73_800);
        assert_eq!(totals.ticket_moderateur_cents, 0);
        // Conservation: couverture + payer share == subtotal TTC
        assert_eq!(
            totals.insurance_cents + totals.payer_share_cents,
            totals.subtotal_ttc_cents
        );
    }

    #[test]
    fn test_special_discount() {
        let totals = compute_totals(&reference_cart(), &special(1000)).unwrap();

        assert_eq!(totals.payer_share_cents, 221_400);
        assert_eq!(totals.discount_cents, 24_600);
        assert_eq!(totals.amount_due_cents, 221_400);
        assert_eq!(totals.insurance_cents, 0);
    }

    #[test]
    fn test_ticket_moderateur_applies_to_non_insured_only() {
        let payer = PayerProfile {
            ticket_moderateur_bps: 2000,
            ..PayerProfile::ordinary()
        };
        let totals = compute_totals(&reference_cart(), &payer).unwrap();

        assert_eq!(totals.ticket_moderateur_cents, 49_200);
        assert_eq!(totals.payer_share_cents, 196_800);
        assert_eq!(totals.insurance_cents, 0);

        // Same TM rate on an insured payer: coverage wins, TM never fires.
        let payer = PayerProfile {
            ticket_moderateur_bps: 2000,
            ..insured(7000)
        };
        let totals = compute_totals(&reference_cart(), &payer).unwrap();
        assert_eq!(totals.ticket_moderateur_cents, 0);
        assert!(totals.insurance_cents > 0);
    }

    #[test]
    fn test_special_discount_applies_after_ticket_moderateur() {
        // TM 20% leaves 1968.00; remise 10% on that leaves 1771.20
        let payer = PayerProfile {
            ticket_moderateur_bps: 2000,
            ..special(1000)
        };
        let totals = compute_totals(&reference_cart(), &payer).unwrap();

        assert_eq!(totals.ticket_moderateur_cents, 49_200);
        assert_eq!(totals.discount_cents, 19_680);
        assert_eq!(totals.amount_due_cents, 177_120);
    }

    #[test]
    fn test_ht_plus_taxes_equals_ttc() {
        let lines = vec![
            CartLine {
                product_id: "p-1".to_string(),
                quantity: 3,
                unit_price_ht_cents: 33_333,
                unit_price_ttc_cents: 41_000,
                vat_rate_bps: 1800,
                centime_rate_bps: 500,
            },
            CartLine {
                product_id: "p-2".to_string(),
                quantity: 1,
                unit_price_ht_cents: 9_999,
                unit_price_ttc_cents: 11_599,
                vat_rate_bps: 1600,
                centime_rate_bps: 0,
            },
        ];

        let totals = compute_totals(&lines, &PayerProfile::ordinary()).unwrap();
        assert_eq!(
            totals.total_ht_cents + totals.vat_cents + totals.centime_cents,
            totals.subtotal_ttc_cents
        );
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert_eq!(
            compute_totals(&[], &PayerProfile::ordinary()),
            Err(PricingError::EmptyCart)
        );
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let mut lines = reference_cart();
        lines[0].quantity = 0;
        assert!(matches!(
            compute_totals(&lines, &PayerProfile::ordinary()),
            Err(PricingError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut lines = reference_cart();
        lines[0].unit_price_ht_cents = -1;
        assert!(matches!(
            compute_totals(&lines, &PayerProfile::ordinary()),
            Err(PricingError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_rate_above_hundred_percent_rejected() {
        let mut lines = reference_cart();
        lines[0].vat_rate_bps = 10_001;
        assert!(matches!(
            compute_totals(&lines, &PayerProfile::ordinary()),
            Err(PricingError::InvalidRate { field: "vat_rate", .. })
        ));

        let payer = insured(10_500);
        assert!(matches!(
            compute_totals(&reference_cart(), &payer),
            Err(PricingError::InvalidRate { field: "insurance_coverage", .. })
        ));
    }

    #[test]
    fn test_incoherent_ttc_rejected() {
        let mut lines = reference_cart();
        lines[0].unit_price_ttc_cents = 999_999;
        assert!(matches!(
            compute_totals(&lines, &PayerProfile::ordinary()),
            Err(PricingError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_settle_short_cash_rejected() {
        let totals = compute_totals(&reference_cart(), &PayerProfile::ordinary()).unwrap();
        let result = settle(&totals, PaymentMethod::Cash, Money::from_cents(100_000));
        assert_eq!(
            result,
            Err(PricingError::InsufficientTender {
                due_cents: 246_000,
                tendered_cents: 100_000,
            })
        );
    }

    #[test]
    fn test_settle_deferred_accepts_partial_tender() {
        let totals = compute_totals(&reference_cart(), &PayerProfile::ordinary()).unwrap();
        let settled = settle(&totals, PaymentMethod::Credit, Money::from_cents(100_000)).unwrap();
        assert_eq!(settled.change_cents, 0);
        assert_eq!(
            deferred_remainder(&settled, Money::from_cents(100_000)).cents(),
            146_000
        );
    }

    #[test]
    fn test_settle_does_not_mutate_input() {
        let totals = compute_totals(&reference_cart(), &PayerProfile::ordinary()).unwrap();
        let _ = settle(&totals, PaymentMethod::Cash, Money::from_cents(300_000)).unwrap();
        // Original stays untouched - settlement returns a fresh structure.
        assert_eq!(totals.change_cents, 0);
    }

    #[test]
    fn test_full_coverage_insured_owes_nothing() {
        let totals = compute_totals(&reference_cart(), &insured(10_000)).unwrap();
        assert_eq!(totals.insurance_cents, 246_000);
        assert_eq!(totals.amount_due_cents, 0);

        let settled = settle(&totals, PaymentMethod::Cash, Money::zero()).unwrap();
        assert_eq!(settled.change_cents, 0);
    }
}
