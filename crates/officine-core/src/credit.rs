//! # Credit & Caution Guard
//!
//! Decides whether the unpaid remainder of a transaction may be deferred
//! to the payer's credit account or deducted from their prepaid caution.
//!
//! The decision is pure: the guard reads a payer snapshot and a remainder,
//! and answers with an approval describing the ledger movement to apply,
//! or a typed rejection. It never touches the ledger itself - the commit
//! happens in the same database transaction as the sale record.
//!
//! Policy rejections are final for the attempt: they require an explicit
//! cashier override or a different payment method, never an automatic
//! retry.

use serde::{Deserialize, Serialize};

use crate::error::CreditError;
use crate::money::Money;
use crate::types::{PayerProfile, PaymentMethod};

// =============================================================================
// Deferral Method
// =============================================================================

/// The two ways a remainder can be deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferralMethod {
    /// Remainder is added to the customer's debt.
    Credit,
    /// Remainder is deducted from the customer's prepaid caution wallet.
    Caution,
}

impl PaymentMethod {
    /// The deferral channel behind a payment method, if any.
    pub const fn deferral(&self) -> Option<DeferralMethod> {
        match self {
            PaymentMethod::Credit => Some(DeferralMethod::Credit),
            PaymentMethod::Caution => Some(DeferralMethod::Caution),
            PaymentMethod::Cash | PaymentMethod::Card => None,
        }
    }
}

// =============================================================================
// Approval
// =============================================================================

/// A granted deferral and the ledger movement it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferralApproval {
    pub method: DeferralMethod,

    /// Amount approved for deferral, in minor units. Zero when the
    /// remainder was already covered.
    pub amount_cents: i64,

    /// For credit: the debt balance after applying the deferral.
    pub projected_debt_cents: Option<i64>,

    /// For caution: the wallet balance after the deduction.
    pub remaining_caution_cents: Option<i64>,
}

// =============================================================================
// Guard
// =============================================================================

/// Authorizes deferring `remainder` via `method` for the given payer.
///
/// ## Decision Table
/// ```text
/// remainder <= 0                          → approved, amount 0
/// credit, !may_use_credit                 → CreditNotAllowed
/// credit, debt + remainder > ceiling      → CreditLimitExceeded
/// credit, otherwise                       → approved, debt grows
/// caution, balance < remainder            → InsufficientCaution
/// caution, otherwise                      → approved, wallet shrinks
/// ```
///
/// A credit ceiling of zero therefore never approves a positive remainder,
/// which is exactly the "no credit allowed" configuration.
pub fn authorize_deferral(
    remainder: Money,
    method: DeferralMethod,
    payer: &PayerProfile,
) -> Result<DeferralApproval, CreditError> {
    if !remainder.is_positive() {
        // Nothing left to defer; the ledger stays where it is.
        return Ok(DeferralApproval {
            method,
            amount_cents: 0,
            projected_debt_cents: None,
            remaining_caution_cents: None,
        });
    }

    match method {
        DeferralMethod::Credit => {
            if !payer.may_use_credit {
                return Err(CreditError::CreditNotAllowed);
            }

            let projected_debt = payer.current_debt() + remainder;
            if projected_debt > payer.credit_ceiling() {
                return Err(CreditError::CreditLimitExceeded {
                    projected_debt_cents: projected_debt.cents(),
                    ceiling_cents: payer.credit_ceiling_cents,
                });
            }

            Ok(DeferralApproval {
                method,
                amount_cents: remainder.cents(),
                projected_debt_cents: Some(projected_debt.cents()),
                remaining_caution_cents: None,
            })
        }
        DeferralMethod::Caution => {
            if payer.caution_balance() < remainder {
                return Err(CreditError::InsufficientCaution {
                    required_cents: remainder.cents(),
                    available_cents: payer.caution_balance_cents,
                });
            }

            Ok(DeferralApproval {
                method,
                amount_cents: remainder.cents(),
                projected_debt_cents: None,
                remaining_caution_cents: Some(
                    (payer.caution_balance() - remainder).cents(),
                ),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn payer(ceiling: i64, debt: i64, caution: i64, may_use_credit: bool) -> PayerProfile {
        PayerProfile {
            credit_ceiling_cents: ceiling,
            current_debt_cents: debt,
            caution_balance_cents: caution,
            may_use_credit,
            ..PayerProfile::default()
        }
    }

    #[test]
    fn test_zero_remainder_trivially_approved() {
        let approval = authorize_deferral(
            Money::zero(),
            DeferralMethod::Credit,
            &payer(0, 0, 0, false),
        )
        .unwrap();
        assert_eq!(approval.amount_cents, 0);
        assert_eq!(approval.projected_debt_cents, None);
    }

    #[test]
    fn test_credit_requires_permission() {
        let err = authorize_deferral(
            Money::from_cents(10_000),
            DeferralMethod::Credit,
            &payer(100_000, 0, 0, false),
        )
        .unwrap_err();
        assert_eq!(err, CreditError::CreditNotAllowed);
    }

    #[test]
    fn test_credit_within_ceiling_approved() {
        let approval = authorize_deferral(
            Money::from_cents(40_000),
            DeferralMethod::Credit,
            &payer(100_000, 50_000, 0, true),
        )
        .unwrap();
        assert_eq!(approval.amount_cents, 40_000);
        assert_eq!(approval.projected_debt_cents, Some(90_000));
    }

    #[test]
    fn test_credit_exactly_at_ceiling_approved() {
        let approval = authorize_deferral(
            Money::from_cents(50_000),
            DeferralMethod::Credit,
            &payer(100_000, 50_000, 0, true),
        )
        .unwrap();
        assert_eq!(approval.projected_debt_cents, Some(100_000));
    }

    #[test]
    fn test_credit_over_ceiling_reports_both_values() {
        let err = authorize_deferral(
            Money::from_cents(60_000),
            DeferralMethod::Credit,
            &payer(100_000, 50_000, 0, true),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CreditError::CreditLimitExceeded {
                projected_debt_cents: 110_000,
                ceiling_cents: 100_000,
            }
        );
    }

    #[test]
    fn test_zero_ceiling_means_no_credit() {
        let err = authorize_deferral(
            Money::from_cents(1),
            DeferralMethod::Credit,
            &payer(0, 0, 0, true),
        )
        .unwrap_err();
        assert!(matches!(err, CreditError::CreditLimitExceeded { .. }));
    }

    #[test]
    fn test_caution_sufficient_balance_approved() {
        let approval = authorize_deferral(
            Money::from_cents(30_000),
            DeferralMethod::Caution,
            &payer(0, 0, 80_000, false),
        )
        .unwrap();
        assert_eq!(approval.amount_cents, 30_000);
        assert_eq!(approval.remaining_caution_cents, Some(50_000));
        // Caution never touches the debt side.
        assert_eq!(approval.projected_debt_cents, None);
    }

    #[test]
    fn test_caution_exact_balance_approved() {
        let approval = authorize_deferral(
            Money::from_cents(80_000),
            DeferralMethod::Caution,
            &payer(0, 0, 80_000, false),
        )
        .unwrap();
        assert_eq!(approval.remaining_caution_cents, Some(0));
    }

    #[test]
    fn test_caution_insufficient_rejected() {
        let err = authorize_deferral(
            Money::from_cents(90_000),
            DeferralMethod::Caution,
            &payer(0, 0, 80_000, false),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CreditError::InsufficientCaution {
                required_cents: 90_000,
                available_cents: 80_000,
            }
        );
    }

    #[test]
    fn test_caution_ignores_credit_permission() {
        // may_use_credit gates the credit channel only.
        let approval = authorize_deferral(
            Money::from_cents(10_000),
            DeferralMethod::Caution,
            &payer(0, 0, 20_000, false),
        );
        assert!(approval.is_ok());
    }

    #[test]
    fn test_payment_method_deferral_mapping() {
        assert_eq!(PaymentMethod::Credit.deferral(), Some(DeferralMethod::Credit));
        assert_eq!(PaymentMethod::Caution.deferral(), Some(DeferralMethod::Caution));
        assert_eq!(PaymentMethod::Cash.deferral(), None);
        assert_eq!(PaymentMethod::Card.deferral(), None);
    }
}
