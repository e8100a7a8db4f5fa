//! # Checkout Service
//!
//! Drives a sale from cart to committed transaction.
//!
//! ## Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  finalize(cart, customer, tender)                                       │
//! │                                                                         │
//! │  1. compute_totals(lines, payer)          pure, officine-core          │
//! │  2. settle(totals, method, tendered)      pure                         │
//! │  3. remainder > 0 on credit/caution?                                   │
//! │        └── authorize_deferral(...)        pure guard                   │
//! │  4. RETRY LOOP (bounded):                                              │
//! │        snapshot lots ──► allocate(...)    pure FIFO plan               │
//! │        commit_sale(sale+lines+plans+payments+ledger)   ONE transaction │
//! │             ├── Ok        → receipt + post-commit stock alerts         │
//! │             ├── Conflict  → re-read, re-plan, retry                    │
//! │             └── other err → abort                                      │
//! │                                                                         │
//! │  No lock is held across pricing - only the final commit touches        │
//! │  guarded state, and a stale snapshot just means one more loop turn.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection leaves the system exactly as it was: pricing and
//! planning are pure, and the commit is all-or-nothing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use officine_core::{
    allocate, authorize_deferral, classify, compute_totals, deferred_remainder,
    resolve_product_thresholds, settle, Customer, DeferralMethod, Money, PayerProfile, Payment,
    PaymentMethod, Sale, SaleLine, SaleStatus, StockError, StockStatus, TransactionTotals,
};
use officine_db::repository::sale::{generate_receipt_number, generate_sale_id};
use officine_db::{Database, DbError, LedgerEffect, SaleCommit};

use crate::cart::Cart;
use crate::config::ConfigState;
use crate::error::{ApiError, ErrorCode};

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// What the payment screen hands over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderRequest {
    pub method: PaymentMethod,
    /// Amount physically handed over, in minor units. Zero for a fully
    /// deferred payment.
    pub tendered_cents: i64,
}

/// Stock alert raised right after a sale consumed quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub product_id: String,
    pub name: String,
    pub remaining_quantity: i64,
    pub status: StockStatus,
}

/// Expiry flag on a lot the sale consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryWarning {
    pub product_id: String,
    pub lot_id: String,
    pub quantity_taken: i64,
    pub expired: bool,
    pub expiring_soon: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub cip: String,
    pub quantity: i64,
    pub unit_price_ttc_cents: i64,
    pub line_total_ttc_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayment {
    pub method: PaymentMethod,
    pub amount_cents: i64,
}

/// Everything the ticket printer and the checkout screen need after a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub sale_id: String,
    pub receipt_number: String,
    pub pharmacy_name: String,
    pub timestamp: String,
    pub lines: Vec<ReceiptLine>,
    pub totals: TransactionTotals,
    pub payments: Vec<ReceiptPayment>,
    pub stock_alerts: Vec<StockAlert>,
    pub expiry_warnings: Vec<ExpiryWarning>,
}

impl CheckoutReceipt {
    /// JSON payload for the printing pipeline.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

// =============================================================================
// Checkout Service
// =============================================================================

/// The checkout orchestrator. Cloneable; holds no per-sale state.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    config: ConfigState,
}

impl CheckoutService {
    /// Creates a new checkout service.
    pub fn new(db: Database, config: ConfigState) -> Self {
        CheckoutService { db, config }
    }

    /// Prices the cart for a payer without touching anything.
    ///
    /// Called on every cart or customer change; the UI displays the
    /// returned totals directly.
    pub fn quote(
        &self,
        cart: &Cart,
        payer: &PayerProfile,
    ) -> Result<TransactionTotals, ApiError> {
        Ok(compute_totals(&cart.lines(), payer)?)
    }

    /// Finalizes the sale: prices, settles or authorizes the deferral,
    /// allocates stock FIFO, and commits everything atomically.
    pub async fn finalize(
        &self,
        cart: &Cart,
        customer: Option<&Customer>,
        tender: TenderRequest,
    ) -> Result<CheckoutReceipt, ApiError> {
        let lines = cart.lines();
        let payer = customer
            .map(Customer::profile)
            .unwrap_or_else(PayerProfile::ordinary);

        debug!(
            items = cart.item_count(),
            method = ?tender.method,
            "Finalizing sale"
        );

        // Pure phase: totals, settlement, deferral authorization.
        let totals = compute_totals(&lines, &payer)?;
        let tendered = Money::from_cents(tender.tendered_cents);
        let settled = settle(&totals, tender.method, tendered)?;
        let remainder = deferred_remainder(&settled, tendered);

        let ledger = self.authorize_ledger_effect(&payer, customer, tender.method, remainder)?;
        let payments = build_payments(&settled, &tender, remainder);

        // Sale skeleton; the same record is retried verbatim on conflict.
        let now = Utc::now();
        let sale_id = generate_sale_id();
        let sale = Sale {
            id: sale_id.clone(),
            tenant_id: self.config.tenant_id.clone(),
            receipt_number: generate_receipt_number(&self.config.till_id),
            customer_id: customer.map(|c| c.id.clone()),
            status: SaleStatus::Completed,
            total_ht_cents: settled.total_ht_cents,
            vat_cents: settled.vat_cents,
            centime_cents: settled.centime_cents,
            subtotal_ttc_cents: settled.subtotal_ttc_cents,
            insurance_cents: settled.insurance_cents,
            ticket_moderateur_cents: settled.ticket_moderateur_cents,
            discount_cents: settled.discount_cents,
            payer_share_cents: settled.payer_share_cents,
            amount_due_cents: settled.amount_due_cents,
            change_cents: settled.change_cents,
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        };

        let sale_lines = build_sale_lines(&sale.id, cart, now);
        let sale_payments: Vec<Payment> = payments
            .iter()
            .map(|p| p.to_payment(&sale.id, now))
            .collect();

        // Allocation + commit, with bounded re-planning on conflict.
        let today = now.date_naive();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let mut lines_with_plans = Vec::with_capacity(sale_lines.len());
            for line in &sale_lines {
                let lots = self.db.lots().available_for_product(&line.product_id).await?;
                let plan = allocate(
                    &line.product_id,
                    line.quantity,
                    &lots,
                    today,
                    self.config.expiry_horizon_days,
                )
                .map_err(ApiError::from)?;
                lines_with_plans.push((line.clone(), plan));
            }

            let commit = SaleCommit {
                sale: sale.clone(),
                lines: lines_with_plans,
                payments: sale_payments.clone(),
                ledger: ledger.clone(),
            };

            match self.db.sales().commit_sale(&commit).await {
                Ok(()) => {
                    info!(
                        sale_id = %sale.id,
                        receipt = %sale.receipt_number,
                        attempts,
                        "Sale finalized"
                    );
                    return self.build_receipt(cart, &sale, &settled, &commit).await;
                }
                Err(DbError::Conflict { entity, id }) if entity == "Customer caution" => {
                    // The wallet moved under us; re-planning lots will not
                    // fix that. Re-read and report the real balance.
                    let available = match self.db.customers().get_by_id(&id).await? {
                        Some(c) => c.caution_balance_cents,
                        None => 0,
                    };
                    return Err(officine_core::CreditError::InsufficientCaution {
                        required_cents: remainder.cents(),
                        available_cents: available,
                    }
                    .into());
                }
                Err(err) if err.is_conflict() && attempts < self.config.allocation_retries => {
                    warn!(
                        sale_id = %sale.id,
                        attempt = attempts,
                        "Sale commit conflicted, re-planning against fresh lot state"
                    );
                    continue;
                }
                Err(DbError::Conflict { id, .. }) => {
                    // Retry budget exhausted: name the product whose lot
                    // kept moving.
                    let product_id = commit
                        .lines
                        .iter()
                        .find(|(_, plan)| plan.entries.iter().any(|e| e.lot_id == id))
                        .map(|(line, _)| line.product_id.clone())
                        .unwrap_or(id);
                    return Err(StockError::AllocationConflict {
                        product_id,
                        attempts,
                    }
                    .into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Runs the deferral guard when the tender leaves a remainder on a
    /// credit/caution method, and translates the approval into the ledger
    /// write the commit must carry.
    fn authorize_ledger_effect(
        &self,
        payer: &PayerProfile,
        customer: Option<&Customer>,
        method: PaymentMethod,
        remainder: Money,
    ) -> Result<Option<LedgerEffect>, ApiError> {
        let Some(deferral_method) = method.deferral() else {
            return Ok(None);
        };

        if !remainder.is_positive() {
            return Ok(None);
        }

        let customer = customer.ok_or_else(|| {
            ApiError::new(
                ErrorCode::CreditRefused,
                "A customer account is required for deferred payment",
            )
        })?;

        let approval = authorize_deferral(remainder, deferral_method, payer)?;

        debug!(
            customer_id = %customer.id,
            method = ?deferral_method,
            amount = approval.amount_cents,
            "Deferral authorized"
        );

        Ok(Some(match deferral_method {
            DeferralMethod::Credit => LedgerEffect::AddDebt {
                customer_id: customer.id.clone(),
                amount_cents: approval.amount_cents,
            },
            DeferralMethod::Caution => LedgerEffect::DeductCaution {
                customer_id: customer.id.clone(),
                amount_cents: approval.amount_cents,
            },
        }))
    }

    /// Builds the receipt, re-classifying each touched product so the
    /// screen can flag stock that just went critical.
    async fn build_receipt(
        &self,
        cart: &Cart,
        sale: &Sale,
        totals: &TransactionTotals,
        commit: &SaleCommit,
    ) -> Result<CheckoutReceipt, ApiError> {
        let tenant = self.db.settings().get(&self.config.tenant_id).await?;

        let mut stock_alerts = Vec::new();
        for item in &cart.items {
            let Some(product) = self.db.products().get_by_id(&item.product_id).await? else {
                continue;
            };
            let remaining = self.db.lots().total_remaining(&item.product_id).await?;
            let resolved = resolve_product_thresholds(&product, tenant.threshold_override());
            let status = classify(remaining, &resolved.thresholds);

            if matches!(status, StockStatus::Rupture | StockStatus::Critique) {
                stock_alerts.push(StockAlert {
                    product_id: product.id,
                    name: product.name,
                    remaining_quantity: remaining,
                    status,
                });
            }
        }

        let expiry_warnings = commit
            .lines
            .iter()
            .flat_map(|(_, plan)| {
                plan.entries
                    .iter()
                    .filter(|e| e.expired || e.expiring_soon)
                    .map(|e| ExpiryWarning {
                        product_id: plan.product_id.clone(),
                        lot_id: e.lot_id.clone(),
                        quantity_taken: e.quantity_taken,
                        expired: e.expired,
                        expiring_soon: e.expiring_soon,
                    })
            })
            .collect();

        Ok(CheckoutReceipt {
            sale_id: sale.id.clone(),
            receipt_number: sale.receipt_number.clone(),
            pharmacy_name: self.config.pharmacy_name.clone(),
            timestamp: sale.completed_at.unwrap_or(sale.created_at).to_rfc3339(),
            lines: cart
                .items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.name.clone(),
                    cip: item.cip.clone(),
                    quantity: item.quantity,
                    unit_price_ttc_cents: item.unit_price_ttc_cents,
                    line_total_ttc_cents: item.line_total_ttc_cents(),
                })
                .collect(),
            totals: totals.clone(),
            payments: commit
                .payments
                .iter()
                .map(|p| ReceiptPayment {
                    method: p.method,
                    amount_cents: p.amount_cents,
                })
                .collect(),
            stock_alerts,
            expiry_warnings,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// A payment before it is stamped with the sale id.
struct PendingPayment {
    method: PaymentMethod,
    amount_cents: i64,
    tendered_cents: Option<i64>,
    change_cents: Option<i64>,
}

impl PendingPayment {
    fn to_payment(&self, sale_id: &str, now: chrono::DateTime<Utc>) -> Payment {
        Payment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            method: self.method,
            amount_cents: self.amount_cents,
            tendered_cents: self.tendered_cents,
            change_cents: self.change_cents,
            created_at: now,
        }
    }
}

/// Splits the settlement into payment records.
///
/// Immediate methods produce a single covering payment. A deferred method
/// with a partial tender produces a cash part plus the deferred remainder,
/// so the ticket shows both.
fn build_payments(
    totals: &TransactionTotals,
    tender: &TenderRequest,
    remainder: Money,
) -> Vec<PendingPayment> {
    if !tender.method.is_deferred() {
        return vec![PendingPayment {
            method: tender.method,
            amount_cents: totals.amount_due_cents,
            tendered_cents: Some(tender.tendered_cents),
            change_cents: Some(totals.change_cents),
        }];
    }

    let mut payments = Vec::new();
    let cash_part = totals.amount_due_cents - remainder.cents();

    if cash_part > 0 {
        payments.push(PendingPayment {
            method: PaymentMethod::Cash,
            amount_cents: cash_part,
            tendered_cents: Some(tender.tendered_cents),
            change_cents: Some(totals.change_cents),
        });
    }

    if remainder.is_positive() {
        payments.push(PendingPayment {
            method: tender.method,
            amount_cents: remainder.cents(),
            tendered_cents: None,
            change_cents: None,
        });
    }

    payments
}

/// Freezes the cart into sale lines.
fn build_sale_lines(sale_id: &str, cart: &Cart, now: chrono::DateTime<Utc>) -> Vec<SaleLine> {
    cart.items
        .iter()
        .map(|item| {
            let line = item.to_line();
            SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                product_id: item.product_id.clone(),
                cip_snapshot: item.cip.clone(),
                name_snapshot: item.name.clone(),
                unit_price_ht_cents: item.unit_price_ht_cents,
                unit_price_ttc_cents: item.unit_price_ttc_cents,
                vat_rate_bps: item.vat_rate_bps,
                centime_rate_bps: item.centime_rate_bps,
                quantity: item.quantity,
                line_total_ht_cents: line.line_total_ht().cents(),
                line_total_ttc_cents: line.line_total_ttc().cents(),
                created_at: now,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
