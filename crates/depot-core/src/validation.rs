//! # Validation Module
//!
//! Input validation for engine requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (scanner app, picking UI)                             │
//! │  └── Format checks, immediate operator feedback                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - request validation before any row is read      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Quantities::apply - counter invariant per mutation           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite CHECK constraints on inventory_lines                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_MOVEMENT_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of warehouse/location/item/status codes.
pub const MAX_CODE_LEN: usize = 64;

/// Validates a movement quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_MOVEMENT_QUANTITY`]
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_quantity;
///
/// assert!(validate_quantity("qty", 15).is_ok());
/// assert!(validate_quantity("qty", 0).is_err());
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a master-data code (warehouse, location, item, QA status).
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_CODE_LEN`] characters
/// - No whitespace or control characters
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a required free-text field (references, actor ids).
pub fn validate_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line/assignment identifier (UUID).
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    validate_text(field, id)?;

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
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
    fn test_validate_quantity() {
        assert!(validate_quantity("qty", 1).is_ok());
        assert!(validate_quantity("qty", MAX_MOVEMENT_QUANTITY).is_ok());

        assert!(validate_quantity("qty", 0).is_err());
        assert!(validate_quantity("qty", -5).is_err());
        assert!(validate_quantity("qty", MAX_MOVEMENT_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("location_code", "A-01-03").is_ok());
        assert!(validate_code("location_code", "").is_err());
        assert!(validate_code("location_code", "A 01").is_err());
        assert!(validate_code("location_code", &"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("line_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("line_id", "").is_err());
        assert!(validate_uuid("line_id", "line-1").is_err());
    }
}
