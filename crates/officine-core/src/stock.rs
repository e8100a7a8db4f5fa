//! # Stock Thresholds & Status Classification
//!
//! Resolves the effective stock thresholds for a product and classifies a
//! quantity into one of five health bands.
//!
//! ## Threshold Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Threshold Resolution (first defined wins)                  │
//! │                                                                         │
//! │   Product override  ──►  Tenant setting  ──►  Built-in default         │
//! │   (per product,          (pharmacy-wide       (alert 5, limit 20,      │
//! │    each field            configuration,        maximum 1000)           │
//! │    optional)             each field optional)                          │
//! │                                                                         │
//! │   Resolution happens FIELD BY FIELD and records which source won,      │
//! │   so a dashboard can show "limit 20 (tenant)" next to "alert 3         │
//! │   (product)".                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Bands
//! ```text
//!   quantity:  0 ───── alert ───── limit ───── maximum ─────►
//!              │Rupture│ Critique  │  Faible   │  Normal  │ Surstock
//! ```
//! Boundary values belong to the stricter band (inclusive upper ends), so
//! the five bands partition every quantity ≥ 0 with no gaps or overlaps.
//! Dashboard counts and alert triggers rely on that exactness.

use serde::{Deserialize, Serialize};

use crate::error::StockError;
use crate::types::Product;

// =============================================================================
// Thresholds
// =============================================================================

/// Effective stock thresholds, all fields defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockThresholds {
    /// Critical floor: at or under this, stock is critique.
    pub alert: i64,
    /// Low floor: at or under this (above alert), stock is faible.
    pub limit: i64,
    /// Overstock ceiling: above this, stock is surstock.
    pub maximum: i64,
}

impl StockThresholds {
    /// Built-in defaults used when neither product nor tenant defines a
    /// field.
    pub const DEFAULT: StockThresholds = StockThresholds {
        alert: 5,
        limit: 20,
        maximum: 1000,
    };

    /// Checks the ordering invariant `alert <= limit <= maximum`.
    ///
    /// A violation is reported, never repaired: a cascade that mixes a
    /// product alert of 50 with a tenant limit of 20 is a configuration
    /// problem the pharmacist must see.
    pub fn validate(&self) -> Result<(), StockError> {
        if self.alert <= self.limit && self.limit <= self.maximum {
            Ok(())
        } else {
            Err(StockError::InvalidThresholds {
                alert: self.alert,
                limit: self.limit,
                maximum: self.maximum,
            })
        }
    }
}

impl Default for StockThresholds {
    fn default() -> Self {
        StockThresholds::DEFAULT
    }
}

/// A partial set of thresholds contributed by one configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOverride {
    pub alert: Option<i64>,
    pub limit: Option<i64>,
    pub maximum: Option<i64>,
}

impl ThresholdOverride {
    pub const EMPTY: ThresholdOverride = ThresholdOverride {
        alert: None,
        limit: None,
        maximum: None,
    };
}

/// Where a resolved threshold field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    /// Per-product override.
    Product,
    /// Tenant-wide setting.
    Tenant,
    /// Built-in default.
    Default,
}

/// Per-field origin of a resolved threshold set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOrigins {
    pub alert: ThresholdSource,
    pub limit: ThresholdSource,
    pub maximum: ThresholdSource,
}

/// Resolved thresholds with the origin of every field attached.
///
/// The origins are observability metadata: classification only reads the
/// values, but dashboards and support want to know which source won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedThresholds {
    pub thresholds: StockThresholds,
    pub origins: ThresholdOrigins,
}

impl Product {
    /// The product's contribution to the threshold cascade.
    pub fn threshold_override(&self) -> ThresholdOverride {
        ThresholdOverride {
            alert: self.alert_threshold,
            limit: self.limit_threshold,
            maximum: self.maximum_threshold,
        }
    }
}

// =============================================================================
// Threshold Resolver
// =============================================================================

/// Resolves effective thresholds from an explicit ordered source list.
///
/// The list is ordered highest precedence first; each field independently
/// takes the first defined value, falling back to the built-in defaults
/// when no source defines it. Passing the sources as a list (rather than
/// chaining optional accesses) keeps the resolution order itself visible
/// and testable.
pub fn resolve_thresholds(
    sources: &[(ThresholdSource, ThresholdOverride)],
) -> ResolvedThresholds {
    let (alert, alert_src) = resolve_field(sources, |o| o.alert, StockThresholds::DEFAULT.alert);
    let (limit, limit_src) = resolve_field(sources, |o| o.limit, StockThresholds::DEFAULT.limit);
    let (maximum, maximum_src) =
        resolve_field(sources, |o| o.maximum, StockThresholds::DEFAULT.maximum);

    ResolvedThresholds {
        thresholds: StockThresholds {
            alert,
            limit,
            maximum,
        },
        origins: ThresholdOrigins {
            alert: alert_src,
            limit: limit_src,
            maximum: maximum_src,
        },
    }
}

/// Convenience wrapper for the standard product → tenant → default cascade.
pub fn resolve_product_thresholds(
    product: &Product,
    tenant: ThresholdOverride,
) -> ResolvedThresholds {
    resolve_thresholds(&[
        (ThresholdSource::Product, product.threshold_override()),
        (ThresholdSource::Tenant, tenant),
    ])
}

fn resolve_field(
    sources: &[(ThresholdSource, ThresholdOverride)],
    field: impl Fn(&ThresholdOverride) -> Option<i64>,
    default: i64,
) -> (i64, ThresholdSource) {
    for (source, overrides) in sources {
        if let Some(value) = field(overrides) {
            return (value, *source);
        }
    }
    (default, ThresholdSource::Default)
}

// =============================================================================
// Status Classifier
// =============================================================================

/// Stock health status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Out of stock.
    Rupture,
    /// At or under the alert threshold.
    Critique,
    /// Between alert and limit thresholds.
    Faible,
    /// Healthy band.
    Normal,
    /// Above the maximum threshold.
    Surstock,
}

/// Classifies a quantity against resolved thresholds.
///
/// Pure and total for every quantity ≥ 0 and any thresholds satisfying
/// `alert <= limit <= maximum`:
///
/// - `quantity == 0`                      → Rupture
/// - `0 < quantity <= alert`              → Critique
/// - `alert < quantity <= limit`          → Faible
/// - `limit < quantity <= maximum`        → Normal
/// - `quantity > maximum`                 → Surstock
///
/// Quantities can never go negative (the lot decrement is guarded at the
/// write), but a defensive caller passing one gets Rupture.
pub fn classify(quantity: i64, thresholds: &StockThresholds) -> StockStatus {
    if quantity <= 0 {
        StockStatus::Rupture
    } else if quantity <= thresholds.alert {
        StockStatus::Critique
    } else if quantity <= thresholds.limit {
        StockStatus::Faible
    } else if quantity <= thresholds.maximum {
        StockStatus::Normal
    } else {
        StockStatus::Surstock
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(alert: i64, limit: i64, maximum: i64) -> StockThresholds {
        StockThresholds {
            alert,
            limit,
            maximum,
        }
    }

    #[test]
    fn test_classify_reference_bands() {
        let t = thresholds(5, 20, 200);

        assert_eq!(classify(0, &t), StockStatus::Rupture);
        assert_eq!(classify(5, &t), StockStatus::Critique);
        assert_eq!(classify(20, &t), StockStatus::Faible);
        assert_eq!(classify(200, &t), StockStatus::Normal);
        assert_eq!(classify(201, &t), StockStatus::Surstock);
    }

    #[test]
    fn test_classify_boundaries_belong_to_stricter_band() {
        let t = thresholds(5, 20, 200);

        assert_eq!(classify(1, &t), StockStatus::Critique);
        assert_eq!(classify(6, &t), StockStatus::Faible);
        assert_eq!(classify(21, &t), StockStatus::Normal);
    }

    #[test]
    fn test_classify_is_a_partition() {
        // Every quantity in a generous range maps to exactly one band, and
        // the band sequence is monotone: once a stricter band is left it is
        // never re-entered.
        let grids = [
            thresholds(5, 20, 200),
            thresholds(0, 0, 0),
            thresholds(0, 10, 10),
            thresholds(7, 7, 7),
            thresholds(1, 2, 3),
        ];

        for t in grids {
            t.validate().unwrap();
            let mut last_rank = 0;
            for quantity in 0..=(t.maximum + 10) {
                let status = classify(quantity, &t);
                let rank = match status {
                    StockStatus::Rupture => 0,
                    StockStatus::Critique => 1,
                    StockStatus::Faible => 2,
                    StockStatus::Normal => 3,
                    StockStatus::Surstock => 4,
                };
                assert!(
                    rank >= last_rank,
                    "band regressed at quantity {} for {:?}",
                    quantity,
                    t
                );
                last_rank = rank;
            }
        }
    }

    #[test]
    fn test_classify_degenerate_thresholds() {
        // alert == limit == maximum == 0: only Rupture and Surstock exist
        let t = thresholds(0, 0, 0);
        assert_eq!(classify(0, &t), StockStatus::Rupture);
        assert_eq!(classify(1, &t), StockStatus::Surstock);
    }

    #[test]
    fn test_negative_quantity_is_rupture() {
        let t = StockThresholds::DEFAULT;
        assert_eq!(classify(-3, &t), StockStatus::Rupture);
    }

    #[test]
    fn test_validate_ordering() {
        assert!(thresholds(5, 20, 200).validate().is_ok());
        assert!(thresholds(5, 5, 5).validate().is_ok());

        let err = thresholds(50, 20, 200).validate().unwrap_err();
        assert!(matches!(err, StockError::InvalidThresholds { alert: 50, limit: 20, .. }));
        assert!(thresholds(5, 300, 200).validate().is_err());
    }

    #[test]
    fn test_resolution_first_defined_wins_per_field() {
        let product = ThresholdOverride {
            alert: Some(3),
            limit: None,
            maximum: None,
        };
        let tenant = ThresholdOverride {
            alert: Some(8),
            limit: Some(30),
            maximum: None,
        };

        let resolved = resolve_thresholds(&[
            (ThresholdSource::Product, product),
            (ThresholdSource::Tenant, tenant),
        ]);

        assert_eq!(resolved.thresholds.alert, 3);
        assert_eq!(resolved.thresholds.limit, 30);
        assert_eq!(resolved.thresholds.maximum, StockThresholds::DEFAULT.maximum);

        assert_eq!(resolved.origins.alert, ThresholdSource::Product);
        assert_eq!(resolved.origins.limit, ThresholdSource::Tenant);
        assert_eq!(resolved.origins.maximum, ThresholdSource::Default);
    }

    #[test]
    fn test_resolution_order_matters() {
        let a = ThresholdOverride {
            alert: Some(1),
            ..ThresholdOverride::EMPTY
        };
        let b = ThresholdOverride {
            alert: Some(2),
            ..ThresholdOverride::EMPTY
        };

        let ab = resolve_thresholds(&[
            (ThresholdSource::Product, a),
            (ThresholdSource::Tenant, b),
        ]);
        let ba = resolve_thresholds(&[
            (ThresholdSource::Tenant, b),
            (ThresholdSource::Product, a),
        ]);

        assert_eq!(ab.thresholds.alert, 1);
        assert_eq!(ba.thresholds.alert, 2);
    }

    #[test]
    fn test_empty_sources_fall_back_to_defaults() {
        let resolved = resolve_thresholds(&[]);
        assert_eq!(resolved.thresholds, StockThresholds::DEFAULT);
        assert_eq!(resolved.origins.alert, ThresholdSource::Default);
    }
}
