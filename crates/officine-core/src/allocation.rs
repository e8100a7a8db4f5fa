//! # Lot Allocator
//!
//! Plans which physical lots satisfy a sale line, first-expiry-first-out.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  allocate(product, qty: 8)                                              │
//! │                                                                         │
//! │  Lots (expiry ascending):                                               │
//! │    LOT-A  qty 5   exp 2025-01-01   ──► take 5                          │
//! │    LOT-B  qty 10  exp 2025-03-01   ──► take 3                          │
//! │    LOT-C  qty 40  exp 2025-09-01   ──► untouched                       │
//! │                                                                         │
//! │  Plan: [(LOT-A, 5), (LOT-B, 3)]   Σ = 8 exactly                        │
//! │                                                                         │
//! │  Not enough across all lots? → InsufficientStock { shortfall }          │
//! │  and NO lot is touched: allocation is all-or-nothing per line.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The allocator is a pure planner. It never mutates lot state; the caller
//! applies the returned plan as a single atomic write (see officine-db,
//! where each decrement is conditional on the lot still holding the
//! quantity). `today` is a parameter, not a clock read, so the same inputs
//! always produce the same plan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, StockError, ValidationError};
use crate::types::Lot;

/// Default horizon for the `expiring_soon` flag, in days.
pub const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 30;

// =============================================================================
// Consumption Plan
// =============================================================================

/// One lot's contribution to a consumption plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub lot_id: String,

    /// Units taken from this lot. Never more than the lot held.
    pub quantity_taken: i64,

    /// The lot's expiry date is already in the past. The sale screen must
    /// surface this before the cashier confirms.
    pub expired: bool,

    /// The lot expires within the configured horizon.
    pub expiring_soon: bool,
}

/// An ordered consumption plan for one sale line.
///
/// Entries are in consumption order (earliest expiry first) and sum exactly
/// to the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionPlan {
    pub product_id: String,
    pub requested_quantity: i64,
    pub entries: Vec<PlanEntry>,
}

impl ConsumptionPlan {
    /// Total units the plan consumes. Equals `requested_quantity` by
    /// construction.
    pub fn total_taken(&self) -> i64 {
        self.entries.iter().map(|e| e.quantity_taken).sum()
    }

    /// True when the plan draws from an expired lot.
    pub fn touches_expired(&self) -> bool {
        self.entries.iter().any(|e| e.expired)
    }

    /// True when the plan draws from a lot expiring within the horizon.
    pub fn touches_expiring_soon(&self) -> bool {
        self.entries.iter().any(|e| e.expiring_soon)
    }
}

// =============================================================================
// Allocator
// =============================================================================

/// Plans FIFO consumption of `requested_quantity` units from the given lot
/// snapshot.
///
/// The snapshot is re-sorted by (expiry date, receipt time, id) before
/// planning, so callers do not have to guarantee ordering. Lots of other
/// products and empty lots in the snapshot are ignored.
///
/// ## Errors
/// - `Validation(MustBePositive)` for a non-positive request
/// - `Stock(InsufficientStock)` when eligible lots cannot cover the
///   request; the shortfall is reported and nothing is consumed
pub fn allocate(
    product_id: &str,
    requested_quantity: i64,
    lots: &[Lot],
    today: NaiveDate,
    expiry_horizon_days: i64,
) -> CoreResult<ConsumptionPlan> {
    if requested_quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "requested_quantity".to_string(),
        }
        .into());
    }

    let mut eligible: Vec<&Lot> = lots
        .iter()
        .filter(|lot| lot.product_id == product_id && lot.remaining_quantity > 0)
        .collect();
    eligible.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.received_at.cmp(&b.received_at))
            .then(a.id.cmp(&b.id))
    });

    // All-or-nothing: check aggregate availability before planning anything.
    let available: i64 = eligible.iter().map(|lot| lot.remaining_quantity).sum();
    if available < requested_quantity {
        return Err(StockError::InsufficientStock {
            product_id: product_id.to_string(),
            requested: requested_quantity,
            available,
            shortfall: requested_quantity - available,
        }
        .into());
    }

    let mut entries = Vec::new();
    let mut outstanding = requested_quantity;

    for lot in eligible {
        if outstanding == 0 {
            break;
        }

        let taken = outstanding.min(lot.remaining_quantity);
        entries.push(PlanEntry {
            lot_id: lot.id.clone(),
            quantity_taken: taken,
            expired: lot.is_expired(today),
            expiring_soon: lot.expires_within(today, expiry_horizon_days),
        });
        outstanding -= taken;
    }

    Ok(ConsumptionPlan {
        product_id: product_id.to_string(),
        requested_quantity,
        entries,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::{TimeZone, Utc};

    fn lot(id: &str, qty: i64, expiry: (i32, u32, u32), received_hour: u32) -> Lot {
        Lot {
            id: id.to_string(),
            product_id: "p-1".to_string(),
            lot_number: format!("N-{}", id),
            initial_quantity: qty,
            remaining_quantity: qty,
            unit_cost_cents: 50_000,
            expiry_date: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
            received_at: Utc.with_ymd_and_hms(2024, 6, 1, received_hour, 0, 0).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()
    }

    #[test]
    fn test_allocation_spans_lots_fifo() {
        let lots = vec![
            lot("l-1", 5, (2025, 1, 1), 8),
            lot("l-2", 10, (2025, 3, 1), 9),
        ];

        let plan = allocate("p-1", 8, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();

        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.entries[0].lot_id, "l-1");
        assert_eq!(plan.entries[0].quantity_taken, 5);
        assert_eq!(plan.entries[1].lot_id, "l-2");
        assert_eq!(plan.entries[1].quantity_taken, 3);
        assert_eq!(plan.total_taken(), 8);
    }

    #[test]
    fn test_allocation_ignores_input_order() {
        // Same lots presented latest-expiry first: plan must not change.
        let lots = vec![
            lot("l-2", 10, (2025, 3, 1), 9),
            lot("l-1", 5, (2025, 1, 1), 8),
        ];

        let plan = allocate("p-1", 8, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();
        assert_eq!(plan.entries[0].lot_id, "l-1");
        assert_eq!(plan.entries[1].lot_id, "l-2");
    }

    #[test]
    fn test_equal_expiry_ties_broken_by_receipt_order() {
        let lots = vec![
            lot("l-late", 5, (2025, 1, 1), 14),
            lot("l-early", 5, (2025, 1, 1), 7),
        ];

        let plan = allocate("p-1", 6, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();
        assert_eq!(plan.entries[0].lot_id, "l-early");
        assert_eq!(plan.entries[0].quantity_taken, 5);
        assert_eq!(plan.entries[1].lot_id, "l-late");
        assert_eq!(plan.entries[1].quantity_taken, 1);
    }

    #[test]
    fn test_single_lot_covers_request() {
        let lots = vec![
            lot("l-1", 5, (2025, 1, 1), 8),
            lot("l-2", 10, (2025, 3, 1), 9),
        ];

        let plan = allocate("p-1", 4, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].quantity_taken, 4);
    }

    #[test]
    fn test_insufficient_stock_reports_shortfall() {
        let lots = vec![
            lot("l-1", 5, (2025, 1, 1), 8),
            lot("l-2", 10, (2025, 3, 1), 9),
        ];

        let err = allocate("p-1", 20, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap_err();
        assert_eq!(
            err,
            CoreError::Stock(StockError::InsufficientStock {
                product_id: "p-1".to_string(),
                requested: 20,
                available: 15,
                shortfall: 5,
            })
        );
    }

    #[test]
    fn test_empty_and_foreign_lots_ignored() {
        let mut foreign = lot("l-x", 50, (2024, 12, 20), 8);
        foreign.product_id = "p-other".to_string();
        let mut empty = lot("l-0", 0, (2024, 12, 20), 8);
        empty.remaining_quantity = 0;
        let lots = vec![foreign, empty, lot("l-1", 3, (2025, 2, 1), 9)];

        let err = allocate("p-1", 4, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Stock(StockError::InsufficientStock { available: 3, .. })
        ));
    }

    #[test]
    fn test_expiry_flags() {
        let lots = vec![
            lot("l-expired", 2, (2024, 11, 30), 7),
            lot("l-soon", 5, (2025, 1, 5), 8),   // 21 days out
            lot("l-fresh", 10, (2025, 12, 1), 9),
        ];

        let plan = allocate("p-1", 10, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();

        assert!(plan.entries[0].expired);
        assert!(!plan.entries[0].expiring_soon);
        assert!(!plan.entries[1].expired);
        assert!(plan.entries[1].expiring_soon);
        assert!(!plan.entries[2].expired);
        assert!(!plan.entries[2].expiring_soon);

        assert!(plan.touches_expired());
        assert!(plan.touches_expiring_soon());
    }

    #[test]
    fn test_no_lot_overdrawn() {
        let lots = vec![
            lot("l-1", 5, (2025, 1, 1), 8),
            lot("l-2", 10, (2025, 3, 1), 9),
            lot("l-3", 7, (2025, 5, 1), 10),
        ];

        let plan = allocate("p-1", 22, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();
        for entry in &plan.entries {
            let source = lots.iter().find(|l| l.id == entry.lot_id).unwrap();
            assert!(entry.quantity_taken <= source.remaining_quantity);
            assert!(entry.quantity_taken > 0);
        }
        assert_eq!(plan.total_taken(), 22);
    }

    #[test]
    fn test_non_positive_request_rejected() {
        let lots = vec![lot("l-1", 5, (2025, 1, 1), 8)];
        assert!(matches!(
            allocate("p-1", 0, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            allocate("p-1", -2, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_allocation_does_not_mutate_lots() {
        let lots = vec![lot("l-1", 5, (2025, 1, 1), 8)];
        let before: Vec<i64> = lots.iter().map(|l| l.remaining_quantity).collect();

        let _ = allocate("p-1", 5, &lots, today(), DEFAULT_EXPIRY_HORIZON_DAYS).unwrap();

        let after: Vec<i64> = lots.iter().map(|l| l.remaining_quantity).collect();
        assert_eq!(before, after);
    }
}
