//! # Customer Repository
//!
//! Database operations for customers: payer profiles and the
//! debt / caution ledger.
//!
//! The payer kind is stored as a discriminant column plus rate columns
//! and rebuilt into the tagged `PayerKind` on read, so the rest of the
//! system never sees the flat representation.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use officine_core::{Customer, PayerKind};

/// Flat row shape for the customers table.
#[derive(Debug, Clone, FromRow)]
struct CustomerRow {
    id: String,
    tenant_id: String,
    full_name: String,
    payer_kind: String,
    coverage_bps: u32,
    discount_bps: u32,
    ticket_moderateur_bps: u32,
    credit_ceiling_cents: i64,
    current_debt_cents: i64,
    caution_balance_cents: i64,
    may_use_credit: bool,
    is_active: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> Customer {
        let kind = match self.payer_kind.as_str() {
            "insured" => PayerKind::Insured {
                coverage_bps: self.coverage_bps,
            },
            "special" => PayerKind::Special {
                discount_bps: self.discount_bps,
            },
            _ => PayerKind::Ordinary,
        };

        Customer {
            id: self.id,
            tenant_id: self.tenant_id,
            full_name: self.full_name,
            kind,
            ticket_moderateur_bps: self.ticket_moderateur_bps,
            credit_ceiling_cents: self.credit_ceiling_cents,
            current_debt_cents: self.current_debt_cents,
            caution_balance_cents: self.caution_balance_cents,
            may_use_credit: self.may_use_credit,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Splits a `PayerKind` into its storage columns (kind, coverage, discount).
fn kind_columns(kind: PayerKind) -> (&'static str, u32, u32) {
    match kind {
        PayerKind::Ordinary => ("ordinary", 0, 0),
        PayerKind::Insured { coverage_bps } => ("insured", coverage_bps, 0),
        PayerKind::Special { discount_bps } => ("special", 0, discount_bps),
    }
}

const CUSTOMER_COLUMNS: &str = r#"
    id, tenant_id, full_name, payer_kind, coverage_bps, discount_bps,
    ticket_moderateur_bps, credit_ceiling_cents, current_debt_cents,
    caution_balance_cents, may_use_credit, is_active, created_at, updated_at
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CustomerRow::into_customer))
    }

    /// Lists active customers of a tenant by name.
    pub async fn search(&self, tenant_id: &str, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("{}%", query.trim());

        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE tenant_id = ?1 AND full_name LIKE ?2 AND is_active = 1
            ORDER BY full_name
            LIMIT ?3
            "#
        ))
        .bind(tenant_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CustomerRow::into_customer).collect())
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.full_name, "Inserting customer");

        let (kind, coverage_bps, discount_bps) = kind_columns(customer.kind);

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, full_name, payer_kind, coverage_bps, discount_bps,
                ticket_moderateur_bps, credit_ceiling_cents, current_debt_cents,
                caution_balance_cents, may_use_credit, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.full_name)
        .bind(kind)
        .bind(coverage_bps)
        .bind(discount_bps)
        .bind(customer.ticket_moderateur_bps)
        .bind(customer.credit_ceiling_cents)
        .bind(customer.current_debt_cents)
        .bind(customer.caution_balance_cents)
        .bind(customer.may_use_credit)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates profile fields (not the ledger balances).
    pub async fn update_profile(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer profile");

        let (kind, coverage_bps, discount_bps) = kind_columns(customer.kind);
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                full_name = ?2,
                payer_kind = ?3,
                coverage_bps = ?4,
                discount_bps = ?5,
                ticket_moderateur_bps = ?6,
                credit_ceiling_cents = ?7,
                may_use_credit = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.full_name)
        .bind(kind)
        .bind(coverage_bps)
        .bind(discount_bps)
        .bind(customer.ticket_moderateur_bps)
        .bind(customer.credit_ceiling_cents)
        .bind(customer.may_use_credit)
        .bind(customer.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Records a debt repayment. The debt floors at zero.
    pub async fn repay_debt(&self, id: &str, amount_cents: i64) -> DbResult<()> {
        debug!(id = %id, amount = %amount_cents, "Repaying debt");

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET current_debt_cents = MAX(current_debt_cents - ?2, 0), updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Tops up the prepaid caution wallet.
    pub async fn top_up_caution(&self, id: &str, amount_cents: i64) -> DbResult<()> {
        debug!(id = %id, amount = %amount_cents, "Topping up caution");

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET caution_balance_cents = caution_balance_cents + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}
