//! # Product Repository
//!
//! Database operations for the catalog: products, families and pricing
//! categories.
//!
//! ## Key Operations
//! - Prefix search on name and CIP for the checkout screen
//! - CRUD with soft delete
//! - Category/family resolution (products reference rates, never copy them)

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use officine_core::{PricingCategory, Product, ProductFamily};

/// Columns selected for every product query, in struct order.
const PRODUCT_COLUMNS: &str = r#"
    id, tenant_id, cip, dci, name,
    price_ht_cents, price_ttc_cents,
    pricing_category_id, family_id,
    alert_threshold, limit_threshold, maximum_threshold,
    is_active, created_at, updated_at
"#;

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let results = repo.search("doli", 20).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name or CIP prefix.
    ///
    /// An empty query lists active products sorted by name, which is what
    /// the checkout screen shows before the cashier types anything.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("{}%", query);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (name LIKE ?1 OR cip LIKE ?1) AND is_active = 1
            ORDER BY name
            LIMIT ?2
            "#
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products (no search filter), sorted by name.
    async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its CIP code within a tenant.
    pub async fn get_by_cip(&self, tenant_id: &str, cip: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE cip = ?1 AND tenant_id = ?2
            "#
        ))
        .bind(cip)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists every active product of a tenant (dashboard sweep).
    pub async fn list_all_active(&self, tenant_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the CIP already exists for the tenant.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(cip = %product.cip, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, cip, dci, name,
                price_ht_cents, price_ttc_cents,
                pricing_category_id, family_id,
                alert_threshold, limit_threshold, maximum_threshold,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.cip)
        .bind(&product.dci)
        .bind(&product.name)
        .bind(product.price_ht_cents)
        .bind(product.price_ttc_cents)
        .bind(&product.pricing_category_id)
        .bind(&product.family_id)
        .bind(product.alert_threshold)
        .bind(product.limit_threshold)
        .bind(product.maximum_threshold)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                cip = ?2,
                dci = ?3,
                name = ?4,
                price_ht_cents = ?5,
                price_ttc_cents = ?6,
                pricing_category_id = ?7,
                family_id = ?8,
                alert_threshold = ?9,
                limit_threshold = ?10,
                maximum_threshold = ?11,
                is_active = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.cip)
        .bind(&product.dci)
        .bind(&product.name)
        .bind(product.price_ht_cents)
        .bind(product.price_ttc_cents)
        .bind(&product.pricing_category_id)
        .bind(&product.family_id)
        .bind(product.alert_threshold)
        .bind(product.limit_threshold)
        .bind(product.maximum_threshold)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sale lines still reference the product, so rows are
    /// never physically deleted.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Pricing Categories & Families
    // =========================================================================

    /// Gets a pricing category by ID.
    pub async fn get_category(&self, id: &str) -> DbResult<Option<PricingCategory>> {
        let category = sqlx::query_as::<_, PricingCategory>(
            r#"
            SELECT id, name, vat_rate_bps, centime_rate_bps, sale_coefficient_bps,
                   created_at, updated_at
            FROM pricing_categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets a product together with its pricing category.
    ///
    /// The common checkout lookup: one call gives everything needed to
    /// build a cart line.
    pub async fn get_with_category(
        &self,
        id: &str,
    ) -> DbResult<Option<(Product, PricingCategory)>> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let category = self
            .get_category(&product.pricing_category_id)
            .await?
            .ok_or_else(|| {
                DbError::not_found("PricingCategory", &product.pricing_category_id)
            })?;

        Ok(Some((product, category)))
    }

    /// Inserts a pricing category.
    pub async fn insert_category(&self, category: &PricingCategory) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pricing_categories (
                id, name, vat_rate_bps, centime_rate_bps, sale_coefficient_bps,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.vat_rate_bps)
        .bind(category.centime_rate_bps)
        .bind(category.sale_coefficient_bps)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a product family.
    pub async fn insert_family(&self, family: &ProductFamily) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_families (id, name, pricing_category_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&family.id)
        .bind(&family.name)
        .bind(&family.pricing_category_id)
        .bind(family.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Helper to generate a new entity ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
