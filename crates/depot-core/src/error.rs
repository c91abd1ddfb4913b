//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Quantity/policy rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  └── DbError          - Persistence + concurrency failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller's message        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is fatal to the operation that raised it. Whether a batch
//! continues with sibling items is the caller's decision, never the engine's.

use thiserror::Error;

use crate::quantity::Counter;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while moving stock.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Inventory line does not exist or has been retired.
    #[error("Inventory line not found: {0}")]
    LineNotFound(String),

    /// A counter would go negative (or below the caller's floor).
    ///
    /// ## When This Occurs
    /// - Transfer of more than the source line has available
    /// - Shipping more than was allocated
    /// - Releasing a QA hold larger than the suspended quantity
    #[error("Insufficient {counter} on line {line_id}: current {current}, requested {requested}")]
    InsufficientQuantity {
        line_id: String,
        counter: Counter,
        current: i64,
        requested: i64,
    },

    /// An allocation walk ran out of candidate lines.
    ///
    /// ## User Workflow
    /// ```text
    /// allocate(item X, whs W, qty 100)
    ///      │
    ///      ▼
    /// candidates provide 80
    ///      │
    ///      ▼
    /// InsufficientStock { requested: 100, available: 80 }
    ///      │
    ///      ▼
    /// nothing reserved, no ledger rows written
    /// ```
    #[error("Insufficient stock for item {item_id} in {whs_code}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        whs_code: String,
        available: i64,
        requested: i64,
    },

    /// Caller's from-warehouse disagrees with the line (stale client state).
    #[error("Warehouse mismatch on line {line_id}: expected {expected}, line is in {actual}")]
    WarehouseMismatch {
        line_id: String,
        expected: String,
        actual: String,
    },

    /// Caller's from-location disagrees with the line (stale client state).
    #[error("Location mismatch on line {line_id}: expected {expected}, line is at {actual}")]
    LocationMismatch {
        line_id: String,
        expected: String,
        actual: String,
    },

    /// A line of one owner was offered for another owner's order.
    ///
    /// ## When This Occurs
    /// An operator overrides a pick with a line that holds the same item
    /// for a different owner.
    #[error("Owner mismatch on line {line_id}: expected {expected}, line belongs to {actual}")]
    OwnerMismatch {
        line_id: String,
        expected: String,
        actual: String,
    },

    /// Destination location is absent from the location master.
    #[error("Location {location_code} is not registered in warehouse {whs_code}")]
    LocationNotRegistered {
        whs_code: String,
        location_code: String,
    },

    /// Counters would break `onhand = available + allocated + suspended`.
    #[error("Quantity invariant violated on line {line_id}: {detail}")]
    InvariantViolation { line_id: String, detail: String },

    /// Pick assignment is not in a state that allows the operation.
    #[error("Pick assignment {assignment_id} is {status}, cannot {action}")]
    InvalidPickState {
        assignment_id: String,
        status: String,
        action: String,
    },

    /// Line still holds stock and cannot be retired.
    #[error("Inventory line {line_id} still holds {onhand} on hand")]
    LineNotEmpty { line_id: String, onhand: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any row is read, so they never leave partial work behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, bad characters in a code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Source and destination of a movement are identical.
    #[error("{0}")]
    NoOpMovement(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_id: "ITEM-X".to_string(),
            whs_code: "W1".to_string(),
            available: 80,
            requested: 100,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for item ITEM-X in W1: available 80, requested 100"
        );

        let err = CoreError::InsufficientQuantity {
            line_id: "L-1".to_string(),
            counter: Counter::Available,
            current: 5,
            requested: 7,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient available on line L-1: current 5, requested 7"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "qty".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
