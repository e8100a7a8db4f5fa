//! # Stock Dashboard
//!
//! Read-side queries for the inventory screens: per-product stock health,
//! band counts, expiring lots.
//!
//! Everything here is a projection: lots are summed, thresholds resolved
//! through the product → tenant → default cascade (with origins kept for
//! display), and the quantity classified. Nothing is mutated.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use officine_core::{
    classify, resolve_product_thresholds, Lot, ResolvedThresholds, StockStatus,
};
use officine_db::Database;

use crate::config::ConfigState;
use crate::error::ApiError;

// =============================================================================
// DTOs
// =============================================================================

/// One product's row on the stock dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOverviewRow {
    pub product_id: String,
    pub cip: String,
    pub name: String,
    pub remaining_quantity: i64,
    pub status: StockStatus,
    /// Effective thresholds with per-field origin, for the settings popover.
    pub thresholds: ResolvedThresholds,
}

/// How many products sit in each band. Drives the dashboard headline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub rupture: usize,
    pub critique: usize,
    pub faible: usize,
    pub normal: usize,
    pub surstock: usize,
}

impl StatusCounts {
    fn add(&mut self, status: StockStatus) {
        match status {
            StockStatus::Rupture => self.rupture += 1,
            StockStatus::Critique => self.critique += 1,
            StockStatus::Faible => self.faible += 1,
            StockStatus::Normal => self.normal += 1,
            StockStatus::Surstock => self.surstock += 1,
        }
    }
}

/// The whole dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOverview {
    pub rows: Vec<StockOverviewRow>,
    pub counts: StatusCounts,
}

/// A lot surfaced by the expiry screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringLot {
    pub lot_id: String,
    pub product_id: String,
    pub lot_number: String,
    pub remaining_quantity: i64,
    pub expiry_date: NaiveDate,
    pub expired: bool,
}

// =============================================================================
// Dashboard Service
// =============================================================================

/// Read-side service for the inventory screens.
#[derive(Debug, Clone)]
pub struct StockDashboard {
    db: Database,
    config: ConfigState,
}

impl StockDashboard {
    /// Creates a new stock dashboard service.
    pub fn new(db: Database, config: ConfigState) -> Self {
        StockDashboard { db, config }
    }

    /// Classifies every active product of the tenant.
    pub async fn overview(&self) -> Result<StockOverview, ApiError> {
        let tenant = self.db.settings().get(&self.config.tenant_id).await?;
        let products = self
            .db
            .products()
            .list_all_active(&self.config.tenant_id)
            .await?;

        debug!(products = products.len(), "Building stock overview");

        let mut rows = Vec::with_capacity(products.len());
        let mut counts = StatusCounts::default();

        for product in products {
            let remaining = self.db.lots().total_remaining(&product.id).await?;
            let resolved = resolve_product_thresholds(&product, tenant.threshold_override());
            let status = classify(remaining, &resolved.thresholds);

            counts.add(status);
            rows.push(StockOverviewRow {
                product_id: product.id,
                cip: product.cip,
                name: product.name,
                remaining_quantity: remaining,
                status,
                thresholds: resolved,
            });
        }

        Ok(StockOverview { rows, counts })
    }

    /// Lots with stock that are expired or expire within the horizon,
    /// earliest first.
    pub async fn expiring_lots(&self, today: NaiveDate) -> Result<Vec<ExpiringLot>, ApiError> {
        let horizon = today + Duration::days(self.config.expiry_horizon_days);
        let lots = self.db.lots().expiring_before(horizon).await?;

        Ok(lots
            .into_iter()
            .map(|lot: Lot| ExpiringLot {
                expired: lot.is_expired(today),
                lot_id: lot.id,
                product_id: lot.product_id,
                lot_number: lot.lot_number,
                remaining_quantity: lot.remaining_quantity,
                expiry_date: lot.expiry_date,
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use officine_core::{
        PricingCategory, Product, ProductFamily, ThresholdSource, DEFAULT_TENANT_ID,
    };
    use officine_db::{DbConfig, TenantSettings};

    async fn test_dashboard() -> (StockDashboard, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dashboard = StockDashboard::new(db.clone(), ConfigState::default());
        (dashboard, db)
    }

    async fn seed_product(db: &Database, id: &str, cip_suffix: u64, alert: Option<i64>) {
        let now = Utc::now();
        if db.products().get_category("cat-1").await.unwrap().is_none() {
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
                pricing_category_id: "cat-1".to_string(),
                created_at: now,
            };
            db.products().insert_family(&family).await.unwrap();
        }

        let product = Product {
            id: id.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            cip: format!("34009{:08}", cip_suffix),
            dci: None,
            name: format!("Produit {}", id),
            price_ht_cents: 100_000,
            price_ttc_cents: 123_000,
            pricing_category_id: "cat-1".to_string(),
            family_id: "fam-1".to_string(),
            alert_threshold: alert,
            limit_threshold: None,
            maximum_threshold: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
    }

    async fn seed_lot(db: &Database, id: &str, product_id: &str, qty: i64, days_out: i64) {
        let now = Utc::now();
        let lot = Lot {
            id: id.to_string(),
            product_id: product_id.to_string(),
            lot_number: format!("N-{}", id),
            initial_quantity: qty,
            remaining_quantity: qty,
            unit_cost_cents: 50_000,
            expiry_date: now.date_naive() + Duration::days(days_out),
            received_at: now,
        };
        db.lots().receive(&lot).await.unwrap();
    }

    #[tokio::test]
    async fn test_overview_counts_and_origins() {
        let (dashboard, db) = test_dashboard().await;

        // p-1: no stock at all → Rupture
        seed_product(&db, "p-1", 1, None).await;
        // p-2: 3 on hand, product alert override at 5 → Critique
        seed_product(&db, "p-2", 2, Some(5)).await;
        seed_lot(&db, "l-2", "p-2", 3, 400).await;
        // p-3: 50 on hand, default thresholds (5/20/1000) → Normal
        seed_product(&db, "p-3", 3, None).await;
        seed_lot(&db, "l-3", "p-3", 50, 400).await;

        let overview = dashboard.overview().await.unwrap();

        assert_eq!(overview.rows.len(), 3);
        assert_eq!(overview.counts.rupture, 1);
        assert_eq!(overview.counts.critique, 1);
        assert_eq!(overview.counts.normal, 1);
        assert_eq!(overview.counts.faible, 0);
        assert_eq!(overview.counts.surstock, 0);

        let p2 = overview.rows.iter().find(|r| r.product_id == "p-2").unwrap();
        assert_eq!(p2.status, StockStatus::Critique);
        assert_eq!(p2.thresholds.origins.alert, ThresholdSource::Product);
        assert_eq!(p2.thresholds.origins.limit, ThresholdSource::Default);
    }

    #[tokio::test]
    async fn test_overview_uses_tenant_settings() {
        let (dashboard, db) = test_dashboard().await;

        seed_product(&db, "p-1", 1, None).await;
        seed_lot(&db, "l-1", "p-1", 15, 400).await;

        // With defaults 15 is Faible (5 < 15 <= 20); raise the tenant limit
        // so 15 still counts as Faible, then the alert so it turns Critique.
        let mut settings = TenantSettings::defaults(DEFAULT_TENANT_ID);
        settings.alert_threshold = Some(20);
        settings.limit_threshold = Some(30);
        db.settings().upsert(&settings).await.unwrap();

        let overview = dashboard.overview().await.unwrap();
        let row = &overview.rows[0];
        assert_eq!(row.status, StockStatus::Critique);
        assert_eq!(row.thresholds.origins.alert, ThresholdSource::Tenant);
    }

    #[tokio::test]
    async fn test_expiring_lots_listing() {
        let (dashboard, db) = test_dashboard().await;
        let today = Utc::now().date_naive();

        seed_product(&db, "p-1", 1, None).await;
        seed_lot(&db, "l-past", "p-1", 2, -5).await; // already expired
        seed_lot(&db, "l-soon", "p-1", 4, 10).await; // inside 30-day horizon
        seed_lot(&db, "l-far", "p-1", 9, 400).await; // outside horizon

        let lots = dashboard.expiring_lots(today).await.unwrap();

        assert_eq!(lots.len(), 2);
        assert_eq!(lots[0].lot_id, "l-past");
        assert!(lots[0].expired);
        assert_eq!(lots[1].lot_id, "l-soon");
        assert!(!lots[1].expired);
    }
}
