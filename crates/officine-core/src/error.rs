//! # Error Types
//!
//! Domain-specific error types for officine-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  officine-core errors (this file)                                       │
//! │  ├── PricingError     - Cart/price input rejections                     │
//! │  ├── StockError       - Inventory-state failures (retryable)           │
//! │  ├── CreditError      - Deferral policy rejections (never retried)     │
//! │  ├── ValidationError  - Generic field validation failures              │
//! │  └── CoreError        - Aggregate over all of the above                 │
//! │                                                                         │
//! │  officine-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  officine-checkout (service layer)                                      │
//! │  └── ApiError         - What the UI sees (serialized)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, shortfalls, ceilings)
//! 3. Errors are enum variants, never String
//! 4. Nothing here is fatal to the process - every error is local to one
//!    transaction attempt

use thiserror::Error;

// =============================================================================
// Pricing Errors
// =============================================================================

/// Rejections raised by the pricing calculator and the reverse resolver.
///
/// All of these are input-validation errors: they fire before any
/// computation and the attempted operation has no partial effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The cart has no lines; there is nothing to price.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line carries a negative quantity/price or an incoherent
    /// HT/TTC pair.
    #[error("invalid cart line for product {product_id}: {reason}")]
    InvalidLine { product_id: String, reason: String },

    /// A percentage is outside [0, 100].
    #[error("invalid rate for {field}: {bps} bps is outside 0..=10000")]
    InvalidRate { field: &'static str, bps: u32 },

    /// A price that must be strictly positive is not.
    #[error("invalid price: {cents} centimes")]
    InvalidPrice { cents: i64 },

    /// A sale coefficient of zero cannot be inverted.
    #[error("invalid sale coefficient: {bps} bps")]
    InvalidCoefficient { bps: u32 },

    /// An immediate payment method was tendered less than the amount due.
    ///
    /// ## When This Occurs
    /// Cash or card settlement where the customer hands over less than the
    /// ticket total. Deferred methods (credit, caution) go through the
    /// credit guard instead of raising this.
    #[error("insufficient tender: due {due_cents}, tendered {tendered_cents}")]
    InsufficientTender { due_cents: i64, tendered_cents: i64 },
}

// =============================================================================
// Stock Errors
// =============================================================================

/// Inventory-state failures.
///
/// Both variants are retryable by recomputation over fresh lot snapshots;
/// neither leaves any partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Eligible lots cannot cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 8 × Amoxicilline
    ///      │
    ///      ▼
    /// Eligible lots hold 5 in total
    ///      │
    ///      ▼
    /// InsufficientStock { requested: 8, available: 5, shortfall: 3 }
    ///      │
    ///      ▼
    /// UI shows: "3 unités manquantes"
    /// ```
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, \
         available {available} (short {shortfall})"
    )]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
        shortfall: i64,
    },

    /// Concurrent sales exhausted the retry budget for this product.
    ///
    /// Raised after a bounded number of commit attempts each found the lot
    /// state changed between snapshot and write.
    #[error("allocation conflict on product {product_id} after {attempts} attempts")]
    AllocationConflict { product_id: String, attempts: u32 },

    /// Resolved thresholds violate `alert <= limit <= maximum`.
    ///
    /// Reported, never silently repaired: a misconfigured cascade must be
    /// visible to whoever configured it.
    #[error("invalid thresholds: alert {alert} <= limit {limit} <= maximum {maximum} does not hold")]
    InvalidThresholds { alert: i64, limit: i64, maximum: i64 },
}

// =============================================================================
// Credit / Caution Errors
// =============================================================================

/// Deferral policy rejections.
///
/// These are never retried automatically - they require an explicit user
/// override or a different payment method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditError {
    /// The payer profile does not allow buying on credit.
    #[error("payer is not allowed to use credit")]
    CreditNotAllowed,

    /// Projected debt would exceed the payer's ceiling.
    #[error("credit limit exceeded: projected debt {projected_debt_cents} > ceiling {ceiling_cents}")]
    CreditLimitExceeded {
        projected_debt_cents: i64,
        ceiling_cents: i64,
    },

    /// The prepaid caution balance cannot cover the remainder.
    #[error("insufficient caution: required {required_cents}, available {available_cents}")]
    InsufficientCaution {
        required_cents: i64,
        available_cents: i64,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Generic input validation errors.
///
/// Used for early field validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate CIP code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Aggregate error for callers that traverse several concerns at once
/// (the checkout orchestrator, mainly).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Credit(#[from] CreditError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Product cannot be found in the catalog snapshot.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Customer cannot be found.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale not found.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// Sale is not in a state that allows the requested operation.
    #[error("sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience alias for pricing computations.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================
