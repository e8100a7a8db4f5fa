//! # Tenant Settings Repository
//!
//! Pharmacy-wide configuration: default stock thresholds, the expiry
//! horizon, currency presentation.
//!
//! Threshold columns are nullable on purpose: an unset field falls through
//! the cascade (product override → tenant setting → built-in default), and
//! the resolver records which source won.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use officine_core::ThresholdOverride;

/// Tenant-level settings row.
#[derive(Debug, Clone, FromRow)]
pub struct TenantSettings {
    pub tenant_id: String,
    pub alert_threshold: Option<i64>,
    pub limit_threshold: Option<i64>,
    pub maximum_threshold: Option<i64>,
    pub expiry_horizon_days: i64,
    pub currency_code: String,
    pub currency_symbol: String,
    pub currency_decimals: i64,
    pub updated_at: DateTime<Utc>,
}

impl TenantSettings {
    /// Fresh settings with nothing overridden.
    pub fn defaults(tenant_id: &str) -> Self {
        TenantSettings {
            tenant_id: tenant_id.to_string(),
            alert_threshold: None,
            limit_threshold: None,
            maximum_threshold: None,
            expiry_horizon_days: officine_core::DEFAULT_EXPIRY_HORIZON_DAYS,
            currency_code: "CDF".to_string(),
            currency_symbol: "FC".to_string(),
            currency_decimals: 2,
            updated_at: Utc::now(),
        }
    }

    /// The tenant's contribution to the threshold cascade.
    pub fn threshold_override(&self) -> ThresholdOverride {
        ThresholdOverride {
            alert: self.alert_threshold,
            limit: self.limit_threshold,
            maximum: self.maximum_threshold,
        }
    }
}

/// Repository for tenant settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets the settings of a tenant, falling back to defaults when no row
    /// exists yet.
    pub async fn get(&self, tenant_id: &str) -> DbResult<TenantSettings> {
        let settings = sqlx::query_as::<_, TenantSettings>(
            r#"
            SELECT tenant_id, alert_threshold, limit_threshold, maximum_threshold,
                   expiry_horizon_days, currency_code, currency_symbol,
                   currency_decimals, updated_at
            FROM tenant_settings
            WHERE tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| TenantSettings::defaults(tenant_id)))
    }

    /// Inserts or replaces the settings of a tenant.
    pub async fn upsert(&self, settings: &TenantSettings) -> DbResult<()> {
        debug!(tenant_id = %settings.tenant_id, "Upserting tenant settings");

        sqlx::query(
            r#"
            INSERT INTO tenant_settings (
                tenant_id, alert_threshold, limit_threshold, maximum_threshold,
                expiry_horizon_days, currency_code, currency_symbol,
                currency_decimals, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (tenant_id) DO UPDATE SET
                alert_threshold = excluded.alert_threshold,
                limit_threshold = excluded.limit_threshold,
                maximum_threshold = excluded.maximum_threshold,
                expiry_horizon_days = excluded.expiry_horizon_days,
                currency_code = excluded.currency_code,
                currency_symbol = excluded.currency_symbol,
                currency_decimals = excluded.currency_decimals,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.tenant_id)
        .bind(settings.alert_threshold)
        .bind(settings.limit_threshold)
        .bind(settings.maximum_threshold)
        .bind(settings.expiry_horizon_days)
        .bind(&settings.currency_code)
        .bind(&settings.currency_symbol)
        .bind(settings.currency_decimals)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
