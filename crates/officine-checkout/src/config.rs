//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`OFFICINE_*`)
//! 2. Database (`tenant_settings` table, read separately by the services)
//! 3. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};

use officine_core::{DEFAULT_EXPIRY_HORIZON_DAYS, DEFAULT_TENANT_ID, MAX_ALLOCATION_RETRIES};

/// Application configuration.
///
/// Most fields have sensible defaults for development; a deployed pharmacy
/// overrides them through the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Tenant ID (single-pharmacy mode uses the default).
    pub tenant_id: String,

    /// Pharmacy name (printed on tickets).
    pub pharmacy_name: String,

    /// Pharmacy address lines (for tickets).
    pub pharmacy_address: Vec<String>,

    /// Till identifier, used in receipt numbers.
    pub till_id: String,

    /// Currency code (ISO 4217).
    pub currency_code: String,

    /// Currency symbol (for display).
    pub currency_symbol: String,

    /// Number of decimal places for currency.
    pub currency_decimals: u8,

    /// Days ahead of expiry at which a lot counts as "expiring soon".
    pub expiry_horizon_days: i64,

    /// How many times a conflicted sale commit is re-planned before the
    /// sale fails.
    pub allocation_retries: u32,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            pharmacy_name: "Officine POS Dev".to_string(),
            pharmacy_address: vec![
                "12 avenue du Commerce".to_string(),
                "Gombe, Kinshasa".to_string(),
            ],
            till_id: "caisse-01".to_string(),
            currency_code: "CDF".to_string(),
            currency_symbol: "FC".to_string(),
            currency_decimals: 2,
            expiry_horizon_days: DEFAULT_EXPIRY_HORIZON_DAYS,
            allocation_retries: MAX_ALLOCATION_RETRIES,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables over defaults.
    ///
    /// ## Environment Variables
    /// - `OFFICINE_TENANT_ID`: override tenant ID
    /// - `OFFICINE_PHARMACY_NAME`: override pharmacy name
    /// - `OFFICINE_TILL_ID`: override till identifier
    /// - `OFFICINE_EXPIRY_HORIZON_DAYS`: override the expiring-soon horizon
    pub fn from_env() -> Self {
        let mut config = ConfigState::default();

        if let Ok(tenant_id) = std::env::var("OFFICINE_TENANT_ID") {
            config.tenant_id = tenant_id;
        }

        if let Ok(name) = std::env::var("OFFICINE_PHARMACY_NAME") {
            config.pharmacy_name = name;
        }

        if let Ok(till_id) = std::env::var("OFFICINE_TILL_ID") {
            config.till_id = till_id;
        }

        if let Ok(horizon) = std::env::var("OFFICINE_EXPIRY_HORIZON_DAYS") {
            if let Ok(days) = horizon.parse::<i64>() {
                config.expiry_horizon_days = days;
            }
        }

        config
    }

    /// Formats a minor-unit amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use officine_checkout::config::ConfigState;
    ///
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(123_400), "FC1234.00");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(1234), "FC12.34");
        assert_eq!(config.format_currency(100), "FC1.00");
        assert_eq!(config.format_currency(0), "FC0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(-1234), "-FC12.34");
    }

    #[test]
    fn test_format_currency_no_decimals() {
        let config = ConfigState {
            currency_decimals: 0,
            ..ConfigState::default()
        };
        assert_eq!(config.format_currency(1234), "FC1234");
    }

    #[test]
    fn test_defaults() {
        let config = ConfigState::default();
        assert_eq!(config.expiry_horizon_days, 30);
        assert_eq!(config.allocation_retries, 3);
    }
}
