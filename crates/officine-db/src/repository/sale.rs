//! # Sale Repository
//!
//! Database operations for sales, their lines, lot consumptions and
//! payments.
//!
//! ## Sale Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    commit_sale(): ONE transaction                       │
//! │                                                                         │
//! │  INSERT sale (totals snapshot)                                         │
//! │  for each line:                                                        │
//! │      INSERT sale_line (product snapshot)                               │
//! │      for each plan entry:                                              │
//! │          UPDATE lots ... WHERE remaining_quantity >= taken  ◄── guard  │
//! │          INSERT lot_consumption                                        │
//! │          INSERT stock_movement (delta < 0, reason 'sale')              │
//! │  for each payment: INSERT payment                                      │
//! │  ledger effect: debt += remainder | caution -= remainder (guarded)     │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any guard matching zero rows → ROLLBACK → DbError::Conflict           │
//! │  The caller re-reads lots, re-plans, retries (bounded).                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Voiding a completed sale runs the mirror image: quantities restored,
//! compensating movements appended (the ledger is append-only), customer
//! debt/caution reversed.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::lot;
use officine_core::{ConsumptionPlan, Payment, Sale, SaleLine, SaleStatus};

const SALE_COLUMNS: &str = r#"
    id, tenant_id, receipt_number, customer_id, status,
    total_ht_cents, vat_cents, centime_cents, subtotal_ttc_cents,
    insurance_cents, ticket_moderateur_cents, discount_cents,
    payer_share_cents, amount_due_cents, change_cents,
    created_at, updated_at, completed_at
"#;

/// The customer-ledger side effect a sale commit carries, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEffect {
    /// Deferred remainder charged to the customer's credit account.
    AddDebt {
        customer_id: String,
        amount_cents: i64,
    },
    /// Deferred remainder deducted from the prepaid caution wallet.
    /// Guarded: fails with Conflict if the wallet no longer covers it.
    DeductCaution {
        customer_id: String,
        amount_cents: i64,
    },
}

/// Everything a finalized sale writes, committed atomically.
#[derive(Debug, Clone)]
pub struct SaleCommit {
    pub sale: Sale,
    /// Each line paired with the consumption plan that satisfies it.
    pub lines: Vec<(SaleLine, ConsumptionPlan)>,
    pub payments: Vec<Payment>,
    pub ledger: Option<LedgerEffect>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all lines of a sale.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, cip_snapshot, name_snapshot,
                   unit_price_ht_cents, unit_price_ttc_cents,
                   vat_rate_bps, centime_rate_bps, quantity,
                   line_total_ht_cents, line_total_ttc_cents, created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets all payments of a sale.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, sale_id, method, amount_cents, tendered_cents, change_cents, created_at
            FROM payments
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            ORDER BY created_at DESC
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Commits a finalized sale in a single transaction.
    ///
    /// ## Errors
    /// - `DbError::Conflict` when a lot decrement or caution deduction
    ///   found the guarded quantity gone. Nothing was written; the caller
    ///   should re-read lot state, recompute the plan, and retry.
    pub async fn commit_sale(&self, commit: &SaleCommit) -> DbResult<()> {
        let sale = &commit.sale;
        debug!(sale_id = %sale.id, receipt = %sale.receipt_number, lines = commit.lines.len(), "Committing sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, receipt_number, customer_id, status,
                total_ht_cents, vat_cents, centime_cents, subtotal_ttc_cents,
                insurance_cents, ticket_moderateur_cents, discount_cents,
                payer_share_cents, amount_due_cents, change_cents,
                created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.receipt_number)
        .bind(&sale.customer_id)
        .bind(sale.status)
        .bind(sale.total_ht_cents)
        .bind(sale.vat_cents)
        .bind(sale.centime_cents)
        .bind(sale.subtotal_ttc_cents)
        .bind(sale.insurance_cents)
        .bind(sale.ticket_moderateur_cents)
        .bind(sale.discount_cents)
        .bind(sale.payer_share_cents)
        .bind(sale.amount_due_cents)
        .bind(sale.change_cents)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.completed_at)
        .execute(&mut *tx)
        .await?;

        for (line, plan) in &commit.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, product_id, cip_snapshot, name_snapshot,
                    unit_price_ht_cents, unit_price_ttc_cents,
                    vat_rate_bps, centime_rate_bps, quantity,
                    line_total_ht_cents, line_total_ttc_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(&line.id)
            .bind(&line.sale_id)
            .bind(&line.product_id)
            .bind(&line.cip_snapshot)
            .bind(&line.name_snapshot)
            .bind(line.unit_price_ht_cents)
            .bind(line.unit_price_ttc_cents)
            .bind(line.vat_rate_bps)
            .bind(line.centime_rate_bps)
            .bind(line.quantity)
            .bind(line.line_total_ht_cents)
            .bind(line.line_total_ttc_cents)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await?;

            for entry in &plan.entries {
                // The guard: dropping the tx on error rolls everything back.
                lot::decrement_guarded(&mut *tx, &entry.lot_id, entry.quantity_taken).await?;

                sqlx::query(
                    r#"
                    INSERT INTO lot_consumptions (
                        id, sale_line_id, lot_id, quantity_taken, expired, expiring_soon
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&line.id)
                .bind(&entry.lot_id)
                .bind(entry.quantity_taken)
                .bind(entry.expired)
                .bind(entry.expiring_soon)
                .execute(&mut *tx)
                .await?;

                lot::record_movement(
                    &mut *tx,
                    &plan.product_id,
                    &entry.lot_id,
                    -entry.quantity_taken,
                    lot::movement_reason::SALE,
                    Some(&sale.id),
                )
                .await?;
            }
        }

        for payment in &commit.payments {
            insert_payment(&mut *tx, payment).await?;
        }

        match &commit.ledger {
            Some(LedgerEffect::AddDebt {
                customer_id,
                amount_cents,
            }) => {
                let result = sqlx::query(
                    r#"
                    UPDATE customers
                    SET current_debt_cents = current_debt_cents + ?2, updated_at = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(customer_id)
                .bind(amount_cents)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("Customer", customer_id));
                }
            }
            Some(LedgerEffect::DeductCaution {
                customer_id,
                amount_cents,
            }) => {
                // Same guard discipline as the lots: the wallet must still
                // cover the deduction at write time.
                let result = sqlx::query(
                    r#"
                    UPDATE customers
                    SET caution_balance_cents = caution_balance_cents - ?2, updated_at = ?3
                    WHERE id = ?1 AND caution_balance_cents >= ?2
                    "#,
                )
                .bind(customer_id)
                .bind(amount_cents)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::conflict("Customer caution", customer_id));
                }
            }
            None => {}
        }

        tx.commit().await?;

        info!(sale_id = %sale.id, receipt = %sale.receipt_number, total = sale.amount_due_cents, "Sale committed");
        Ok(())
    }

    /// Voids a completed sale: restores every consumed quantity, appends
    /// compensating movements, reverses debt/caution effects.
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<()> {
        debug!(sale_id = %sale_id, "Voiding sale");

        let sale = self
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales SET status = 'voided', updated_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(sale_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (completed)", sale_id));
        }

        // Restore lot quantities via the consumption records.
        let consumptions: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT sl.product_id, lc.lot_id, lc.quantity_taken
            FROM lot_consumptions lc
            JOIN sale_lines sl ON sl.id = lc.sale_line_id
            WHERE sl.sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, lot_id, quantity_taken) in &consumptions {
            lot::restore(&mut *tx, lot_id, *quantity_taken).await?;
            lot::record_movement(
                &mut *tx,
                product_id,
                lot_id,
                *quantity_taken,
                lot::movement_reason::VOID,
                Some(sale_id),
            )
            .await?;
        }

        // Reverse deferred payments on the customer ledger.
        if let Some(customer_id) = &sale.customer_id {
            let deferred: Vec<(String, i64)> = sqlx::query_as(
                r#"
                SELECT method, amount_cents
                FROM payments
                WHERE sale_id = ?1 AND method IN ('credit', 'caution')
                "#,
            )
            .bind(sale_id)
            .fetch_all(&mut *tx)
            .await?;

            for (method, amount_cents) in &deferred {
                let sql = match method.as_str() {
                    "credit" => {
                        r#"
                        UPDATE customers
                        SET current_debt_cents = MAX(current_debt_cents - ?2, 0), updated_at = ?3
                        WHERE id = ?1
                        "#
                    }
                    _ => {
                        r#"
                        UPDATE customers
                        SET caution_balance_cents = caution_balance_cents + ?2, updated_at = ?3
                        WHERE id = ?1
                        "#
                    }
                };
                sqlx::query(sql)
                    .bind(customer_id)
                    .bind(amount_cents)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        info!(sale_id = %sale_id, "Sale voided");
        Ok(())
    }
}

async fn insert_payment(conn: &mut sqlx::SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, sale_id, method, amount_cents, tendered_cents, change_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.sale_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(payment.tendered_cents)
    .bind(payment.change_cents)
    .bind(payment.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Generates a receipt number in format: YYYYMMDD-TT-NNNN
///
/// - YYYYMMDD: date
/// - TT: till code (last 2 chars of till_id)
/// - NNNN: per-day-ish sequence (timestamp-derived)
pub fn generate_receipt_number(till_id: &str) -> String {
    let now = Utc::now();
    let date_part = now.format("%Y%m%d");

    let till_code: String = till_id
        .chars()
        .rev()
        .take(2)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    let till_code = if till_code.len() < 2 {
        "00".to_string()
    } else {
        till_code
    };

    let seq = (now.timestamp_millis() % 10_000) as u32;

    format!("{}-{}-{:04}", date_part, till_code, seq)
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use officine_core::{
        Customer, Lot, PayerKind, PaymentMethod, PlanEntry, PricingCategory, Product,
        ProductFamily, DEFAULT_TENANT_ID,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database) -> Product {
        let now = Utc::now();
        let category = PricingCategory {
            id: "cat-1".to_string(),
            name: "Spécialités 18%".to_string(),
            vat_rate_bps: 1800,
            centime_rate_bps: 500,
            sale_coefficient_bps: 12_500,
            created_at: now,
            updated_at: now,
        };
        db.products().insert_category(&category).await.unwrap();

        let family = ProductFamily {
            id: "fam-1".to_string(),
            name: "Antalgiques".to_string(),
            pricing_category_id: category.id.clone(),
            created_at: now,
        };
        db.products().insert_family(&family).await.unwrap();

        let product = Product {
            id: "p-1".to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            cip: "3400930000001".to_string(),
            dci: Some("paracétamol".to_string()),
            name: "Doliprane 500mg".to_string(),
            price_ht_cents: 100_000,
            price_ttc_cents: 123_000,
            pricing_category_id: category.id,
            family_id: family.id,
            alert_threshold: None,
            limit_threshold: None,
            maximum_threshold: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    async fn seed_lot(db: &Database, id: &str, qty: i64, expiry: (i32, u32, u32)) -> Lot {
        let lot = Lot {
            id: id.to_string(),
            product_id: "p-1".to_string(),
            lot_number: format!("N-{}", id),
            initial_quantity: qty,
            remaining_quantity: qty,
            unit_cost_cents: 67_797,
            expiry_date: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
            received_at: Utc::now(),
        };
        db.lots().receive(&lot).await.unwrap();
        lot
    }

    async fn seed_customer(db: &Database, debt: i64, caution: i64) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: "c-1".to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            full_name: "M. Ilunga".to_string(),
            kind: PayerKind::Ordinary,
            ticket_moderateur_bps: 0,
            credit_ceiling_cents: 500_000,
            current_debt_cents: debt,
            caution_balance_cents: caution,
            may_use_credit: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await.unwrap();
        customer
    }

    fn test_sale(id: &str, customer_id: Option<&str>) -> Sale {
        let now = Utc::now();
        Sale {
            id: id.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            receipt_number: format!("20260805-01-{}", id),
            customer_id: customer_id.map(|c| c.to_string()),
            status: SaleStatus::Completed,
            total_ht_cents: 200_000,
            vat_cents: 36_000,
            centime_cents: 10_000,
            subtotal_ttc_cents: 246_000,
            insurance_cents: 0,
            ticket_moderateur_cents: 0,
            discount_cents: 0,
            payer_share_cents: 246_000,
            amount_due_cents: 246_000,
            change_cents: 0,
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        }
    }

    fn test_line(sale_id: &str, quantity: i64) -> SaleLine {
        SaleLine {
            id: format!("{}-line-1", sale_id),
            sale_id: sale_id.to_string(),
            product_id: "p-1".to_string(),
            cip_snapshot: "3400930000001".to_string(),
            name_snapshot: "Doliprane 500mg".to_string(),
            unit_price_ht_cents: 100_000,
            unit_price_ttc_cents: 123_000,
            vat_rate_bps: 1800,
            centime_rate_bps: 500,
            quantity,
            line_total_ht_cents: 100_000 * quantity,
            line_total_ttc_cents: 123_000 * quantity,
            created_at: Utc::now(),
        }
    }

    fn plan_for(entries: Vec<(&str, i64)>) -> ConsumptionPlan {
        let requested = entries.iter().map(|(_, q)| q).sum();
        ConsumptionPlan {
            product_id: "p-1".to_string(),
            requested_quantity: requested,
            entries: entries
                .into_iter()
                .map(|(lot_id, quantity_taken)| PlanEntry {
                    lot_id: lot_id.to_string(),
                    quantity_taken,
                    expired: false,
                    expiring_soon: false,
                })
                .collect(),
        }
    }

    fn cash_payment(sale_id: &str, amount: i64, tendered: i64) -> Payment {
        Payment {
            id: format!("{}-pay-1", sale_id),
            sale_id: sale_id.to_string(),
            method: PaymentMethod::Cash,
            amount_cents: amount,
            tendered_cents: Some(tendered),
            change_cents: Some(tendered - amount),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_sale_decrements_lots_fifo() {
        let db = test_db().await;
        seed_product(&db).await;
        seed_lot(&db, "l-1", 5, (2027, 1, 1)).await;
        seed_lot(&db, "l-2", 10, (2027, 3, 1)).await;

        let commit = SaleCommit {
            sale: test_sale("s-1", None),
            lines: vec![(test_line("s-1", 8), plan_for(vec![("l-1", 5), ("l-2", 3)]))],
            payments: vec![cash_payment("s-1", 246_000, 250_000)],
            ledger: None,
        };

        db.sales().commit_sale(&commit).await.unwrap();

        let l1 = db.lots().get_by_id("l-1").await.unwrap().unwrap();
        let l2 = db.lots().get_by_id("l-2").await.unwrap().unwrap();
        assert_eq!(l1.remaining_quantity, 0);
        assert_eq!(l2.remaining_quantity, 7);
        assert_eq!(db.lots().total_remaining("p-1").await.unwrap(), 7);

        let sale = db.sales().get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.amount_due_cents, 246_000);

        let lines = db.sales().get_lines("s-1").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 8);

        let payments = db.sales().get_payments("s-1").await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_commit_sale_conflict_rolls_back_everything() {
        let db = test_db().await;
        seed_product(&db).await;
        seed_lot(&db, "l-1", 5, (2027, 1, 1)).await;

        // Plan built against a stale snapshot claims 8 from a lot holding 5.
        let commit = SaleCommit {
            sale: test_sale("s-1", None),
            lines: vec![(test_line("s-1", 8), plan_for(vec![("l-1", 8)]))],
            payments: vec![cash_payment("s-1", 246_000, 250_000)],
            ledger: None,
        };

        let err = db.sales().commit_sale(&commit).await.unwrap_err();
        assert!(err.is_conflict());

        // Nothing was applied: no sale row, lot untouched.
        assert!(db.sales().get_by_id("s-1").await.unwrap().is_none());
        let l1 = db.lots().get_by_id("l-1").await.unwrap().unwrap();
        assert_eq!(l1.remaining_quantity, 5);
    }

    #[tokio::test]
    async fn test_commit_sale_deducts_caution_guarded() {
        let db = test_db().await;
        seed_product(&db).await;
        seed_lot(&db, "l-1", 10, (2027, 1, 1)).await;
        seed_customer(&db, 0, 300_000).await;

        let mut commit = SaleCommit {
            sale: test_sale("s-1", Some("c-1")),
            lines: vec![(test_line("s-1", 2), plan_for(vec![("l-1", 2)]))],
            payments: vec![Payment {
                id: "s-1-pay-1".to_string(),
                sale_id: "s-1".to_string(),
                method: PaymentMethod::Caution,
                amount_cents: 246_000,
                tendered_cents: None,
                change_cents: None,
                created_at: Utc::now(),
            }],
            ledger: Some(LedgerEffect::DeductCaution {
                customer_id: "c-1".to_string(),
                amount_cents: 246_000,
            }),
        };

        db.sales().commit_sale(&commit).await.unwrap();

        let customer = db.customers().get_by_id("c-1").await.unwrap().unwrap();
        assert_eq!(customer.caution_balance_cents, 54_000);

        // A second identical sale no longer fits in the wallet: the whole
        // commit must fail and the lot must stay untouched.
        commit.sale = test_sale("s-2", Some("c-1"));
        commit.lines = vec![(test_line("s-2", 2), plan_for(vec![("l-1", 2)]))];
        commit.payments[0].id = "s-2-pay-1".to_string();
        commit.payments[0].sale_id = "s-2".to_string();

        let err = db.sales().commit_sale(&commit).await.unwrap_err();
        assert!(err.is_conflict());

        let customer = db.customers().get_by_id("c-1").await.unwrap().unwrap();
        assert_eq!(customer.caution_balance_cents, 54_000);
        let l1 = db.lots().get_by_id("l-1").await.unwrap().unwrap();
        assert_eq!(l1.remaining_quantity, 8);
    }

    #[tokio::test]
    async fn test_commit_sale_adds_debt() {
        let db = test_db().await;
        seed_product(&db).await;
        seed_lot(&db, "l-1", 10, (2027, 1, 1)).await;
        seed_customer(&db, 100_000, 0).await;

        let commit = SaleCommit {
            sale: test_sale("s-1", Some("c-1")),
            lines: vec![(test_line("s-1", 2), plan_for(vec![("l-1", 2)]))],
            payments: vec![Payment {
                id: "s-1-pay-1".to_string(),
                sale_id: "s-1".to_string(),
                method: PaymentMethod::Credit,
                amount_cents: 246_000,
                tendered_cents: None,
                change_cents: None,
                created_at: Utc::now(),
            }],
            ledger: Some(LedgerEffect::AddDebt {
                customer_id: "c-1".to_string(),
                amount_cents: 246_000,
            }),
        };

        db.sales().commit_sale(&commit).await.unwrap();

        let customer = db.customers().get_by_id("c-1").await.unwrap().unwrap();
        assert_eq!(customer.current_debt_cents, 346_000);
    }

    #[tokio::test]
    async fn test_void_restores_stock_and_ledger() {
        let db = test_db().await;
        seed_product(&db).await;
        seed_lot(&db, "l-1", 10, (2027, 1, 1)).await;
        seed_customer(&db, 0, 0).await;

        let commit = SaleCommit {
            sale: test_sale("s-1", Some("c-1")),
            lines: vec![(test_line("s-1", 4), plan_for(vec![("l-1", 4)]))],
            payments: vec![Payment {
                id: "s-1-pay-1".to_string(),
                sale_id: "s-1".to_string(),
                method: PaymentMethod::Credit,
                amount_cents: 246_000,
                tendered_cents: None,
                change_cents: None,
                created_at: Utc::now(),
            }],
            ledger: Some(LedgerEffect::AddDebt {
                customer_id: "c-1".to_string(),
                amount_cents: 246_000,
            }),
        };
        db.sales().commit_sale(&commit).await.unwrap();

        db.sales().void_sale("s-1").await.unwrap();

        let sale = db.sales().get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Voided);

        let l1 = db.lots().get_by_id("l-1").await.unwrap().unwrap();
        assert_eq!(l1.remaining_quantity, 10);

        let customer = db.customers().get_by_id("c-1").await.unwrap().unwrap();
        assert_eq!(customer.current_debt_cents, 0);

        // Voiding twice is rejected: the sale is no longer completed.
        assert!(db.sales().void_sale("s-1").await.is_err());
    }

    #[test]
    fn test_receipt_number_format() {
        let receipt = generate_receipt_number("till-01");
        // YYYYMMDD-01-NNNN
        let parts: Vec<&str> = receipt.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1], "01");
        assert_eq!(parts[2].len(), 4);
    }
}
