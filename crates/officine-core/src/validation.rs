//! # Validation Module
//!
//! Generic input validation utilities, used by the persistence and
//! orchestration layers before business logic runs. The pricing calculator
//! performs its own domain-specific validation and reports through
//! `PricingError`; these helpers cover the surrounding CRUD surface.

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a CIP product identification code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 13 characters (CIP-7 and CIP-13 both fit)
/// - Digits only
pub fn validate_cip(cip: &str) -> ValidationResult<()> {
    let cip = cip.trim();

    if cip.is_empty() {
        return Err(ValidationError::Required {
            field: "cip".to_string(),
        });
    }

    if cip.len() > 13 {
        return Err(ValidationError::TooLong {
            field: "cip".to_string(),
            max: 13,
        });
    }

    if !cip.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cip".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a product or customer display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(field: &'static str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a catalog search query. Can be empty (lists actives).
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or balance amount in minor units.
///
/// Zero is allowed (free items, empty wallets); negatives are not.
pub fn validate_cents(field: &'static str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a percentage rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &'static str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates cart size (number of distinct lines).
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cip() {
        assert!(validate_cip("3400930000001").is_ok());
        assert!(validate_cip("3400935").is_ok());

        assert!(validate_cip("").is_err());
        assert!(validate_cip("   ").is_err());
        assert!(validate_cip("34009-300").is_err());
        assert!(validate_cip("34009300000012").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Doliprane 500mg").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cents() {
        assert!(validate_cents("price", 0).is_ok());
        assert!(validate_cents("price", 109_900).is_ok());
        assert!(validate_cents("price", -100).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps("tva", 0).is_ok());
        assert!(validate_rate_bps("tva", 1800).is_ok());
        assert!(validate_rate_bps("tva", 10_000).is_ok());
        assert!(validate_rate_bps("tva", 10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
