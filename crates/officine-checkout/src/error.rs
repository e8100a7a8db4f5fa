//! # API Error Type
//!
//! Unified error envelope for the service layer.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Error Flow towards the UI                               │
//! │                                                                         │
//! │  PricingError / StockError / CreditError   (officine-core)             │
//! │  DbError                                   (officine-db)               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ApiError { code, message }   ← serializable, one shape for the UI     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  UI decides: show message, prompt another payment split, or abort.     │
//! │  Nothing here is fatal to the process.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The codes mirror the three error families: input validation (reject
//! before computing), inventory state (retryable by recomputation), and
//! policy (needs an explicit user decision).

use serde::Serialize;

use officine_core::{CoreError, CreditError, PricingError, StockError};
use officine_db::DbError;

/// API error returned from service calls.
///
/// ## Serialization
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "insufficient stock for ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling.
    pub code: ErrorCode,

    /// Human-readable error message for display.
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found.
    NotFound,

    /// Input validation failed.
    ValidationError,

    /// Database operation failed.
    DatabaseError,

    /// Business rule violation outside the families below.
    BusinessLogic,

    /// Internal error.
    Internal,

    /// Cart operation failed.
    CartError,

    /// Eligible lots cannot cover the request.
    InsufficientStock,

    /// Concurrent sales exhausted the commit retry budget.
    AllocationConflict,

    /// Tender/settlement error.
    PaymentError,

    /// Credit or caution deferral refused by policy.
    CreditRefused,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Conflict { entity, id } => {
                // Surfacing a raw conflict means the retry loop gave up or
                // was bypassed; the UI treats it like AllocationConflict.
                ApiError::new(
                    ErrorCode::AllocationConflict,
                    format!("concurrent update on {} {}", entity, id),
                )
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts pricing rejections to API errors.
impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        let code = match err {
            PricingError::InsufficientTender { .. } => ErrorCode::PaymentError,
            _ => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts inventory-state errors to API errors.
impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        let code = match err {
            StockError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            StockError::AllocationConflict { .. } => ErrorCode::AllocationConflict,
            StockError::InvalidThresholds { .. } => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts policy rejections to API errors.
impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        ApiError::new(ErrorCode::CreditRefused, err.to_string())
    }
}

/// Converts aggregate core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Pricing(e) => e.into(),
            CoreError::Stock(e) => e.into(),
            CoreError::Credit(e) => e.into(),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::CustomerNotFound(id) => ApiError::not_found("Customer", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::InvalidSaleStatus { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err: ApiError = StockError::InsufficientStock {
            product_id: "p-1".to_string(),
            requested: 8,
            available: 5,
            shortfall: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err: ApiError = CreditError::CreditNotAllowed.into();
        assert_eq!(err.code, ErrorCode::CreditRefused);

        let err: ApiError = PricingError::InsufficientTender {
            due_cents: 100,
            tendered_cents: 50,
        }
        .into();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let err: ApiError = PricingError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_db_conflict_maps_to_allocation_conflict() {
        let err: ApiError = DbError::conflict("Lot", "l-1").into();
        assert_eq!(err.code, ErrorCode::AllocationConflict);
    }
}
