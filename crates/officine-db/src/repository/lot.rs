//! # Lot Repository
//!
//! Database operations for stock lots and the stock movement ledger.
//!
//! ## The One Concurrency Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Two tills sell the same product at once                      │
//! │                                                                         │
//! │  Till A: snapshot lots ──► plan [(LOT-1, 5)] ──► commit                │
//! │  Till B: snapshot lots ──► plan [(LOT-1, 4)] ──► commit                │
//! │                                                                         │
//! │  Each decrement is CONDITIONAL:                                        │
//! │    UPDATE lots SET remaining_quantity = remaining_quantity - ?          │
//! │    WHERE id = ? AND remaining_quantity >= ?                             │
//! │                                                                         │
//! │  LOT-1 holds 7: A's commit succeeds (7→2); B's update matches no row   │
//! │  → B's whole transaction rolls back → B re-reads, re-plans, retries.   │
//! │                                                                         │
//! │  The two sales can never jointly take more than the lot held.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded decrement lives here; the sale repository calls it inside
//! the single commit transaction. No lock is ever held across pricing -
//! only across the final commit.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use officine_core::Lot;

const LOT_COLUMNS: &str = r#"
    id, product_id, lot_number,
    initial_quantity, remaining_quantity,
    unit_cost_cents, expiry_date, received_at
"#;

/// Reasons recorded in the stock movement ledger.
pub mod movement_reason {
    pub const RECEIPT: &str = "receipt";
    pub const SALE: &str = "sale";
    pub const VOID: &str = "void";
    pub const ADJUSTMENT: &str = "adjustment";
}

/// Repository for lot database operations.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    /// Creates a new LotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Gets a lot by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Lot>> {
        let lot = sqlx::query_as::<_, Lot>(&format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM lots
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Snapshot of the eligible lots of a product, FIFO-ordered.
    ///
    /// This is the read side of the allocation cycle: the allocator plans
    /// over this snapshot, the commit re-checks every quantity at write
    /// time.
    pub async fn available_for_product(&self, product_id: &str) -> DbResult<Vec<Lot>> {
        let lots = sqlx::query_as::<_, Lot>(&format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM lots
            WHERE product_id = ?1 AND remaining_quantity > 0
            ORDER BY expiry_date, received_at, id
            "#
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Total remaining quantity across all lots of a product.
    pub async fn total_remaining(&self, product_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(remaining_quantity)
            FROM lots
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Lots (with stock) expiring on or before the given date.
    pub async fn expiring_before(&self, date: NaiveDate) -> DbResult<Vec<Lot>> {
        let lots = sqlx::query_as::<_, Lot>(&format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM lots
            WHERE remaining_quantity > 0 AND expiry_date <= ?1
            ORDER BY expiry_date, received_at, id
            "#
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Receives a new lot into stock and records the receipt movement.
    pub async fn receive(&self, lot: &Lot) -> DbResult<()> {
        debug!(lot_number = %lot.lot_number, product_id = %lot.product_id, qty = %lot.initial_quantity, "Receiving lot");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO lots (
                id, product_id, lot_number,
                initial_quantity, remaining_quantity,
                unit_cost_cents, expiry_date, received_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.product_id)
        .bind(&lot.lot_number)
        .bind(lot.initial_quantity)
        .bind(lot.remaining_quantity)
        .bind(lot.unit_cost_cents)
        .bind(lot.expiry_date)
        .bind(lot.received_at)
        .execute(&mut *tx)
        .await?;

        record_movement(
            &mut *tx,
            &lot.product_id,
            &lot.id,
            lot.initial_quantity,
            movement_reason::RECEIPT,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Manual stock adjustment (inventory count correction, breakage).
    ///
    /// A negative delta is guarded the same way as a sale decrement.
    pub async fn adjust(&self, lot_id: &str, delta: i64) -> DbResult<()> {
        debug!(lot_id = %lot_id, delta = %delta, "Adjusting lot");

        let mut tx = self.pool.begin().await?;

        let lot = sqlx::query_as::<_, Lot>(&format!(
            r#"SELECT {LOT_COLUMNS} FROM lots WHERE id = ?1"#
        ))
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Lot", lot_id))?;

        if delta < 0 {
            decrement_guarded(&mut *tx, lot_id, -delta).await?;
        } else {
            sqlx::query(
                r#"
                UPDATE lots SET remaining_quantity = remaining_quantity + ?2
                WHERE id = ?1
                "#,
            )
            .bind(lot_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;
        }

        record_movement(
            &mut *tx,
            &lot.product_id,
            lot_id,
            delta,
            movement_reason::ADJUSTMENT,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================
// These run on a caller-owned connection so the sale repository can compose
// them into its single commit transaction.

/// Conditionally decrements a lot, failing with `Conflict` when the lot no
/// longer holds the quantity.
///
/// The WHERE clause is the whole mechanism: the update only matches while
/// `remaining_quantity >= quantity`, so a concurrent sale that drained the
/// lot first turns this into a zero-row update.
pub(crate) async fn decrement_guarded(
    conn: &mut SqliteConnection,
    lot_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE lots
        SET remaining_quantity = remaining_quantity - ?2
        WHERE id = ?1 AND remaining_quantity >= ?2
        "#,
    )
    .bind(lot_id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict("Lot", lot_id));
    }

    Ok(())
}

/// Restores quantity to a lot (void path).
pub(crate) async fn restore(
    conn: &mut SqliteConnection,
    lot_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE lots
        SET remaining_quantity = remaining_quantity + ?2
        WHERE id = ?1
        "#,
    )
    .bind(lot_id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Lot", lot_id));
    }

    Ok(())
}

/// Appends a row to the stock movement ledger.
pub(crate) async fn record_movement(
    conn: &mut SqliteConnection,
    product_id: &str,
    lot_id: &str,
    delta: i64,
    reason: &str,
    sale_id: Option<&str>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, lot_id, delta, reason, sale_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(lot_id)
    .bind(delta)
    .bind(reason)
    .bind(sale_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}
