//! # Error Types
//!
//! Domain-specific error types for bahi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bahi-core errors (this file)                                          │
//! │  ├── CoreError        - Ledger and batch selection failures            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bahi-db errors (separate crate)                                       │
//! │  └── DbError          - Database and sequencing failures               │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bad numeric input on a cart line is NOT an error: it coerces to zero
//! (see [`crate::validation::coerce_non_negative`]).

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A batch index outside the stock item's batch list.
    ///
    /// ## User Workflow
    /// ```text
    /// Add "Paracetamol" (3 batches)
    ///      │
    ///      ▼
    /// NeedsSelection([B-1, B-2, B-3])
    ///      │
    ///      ▼
    /// select(index: 5)
    ///      │
    ///      ▼
    /// InvalidSelection { index: 5, available: 3 }   (never batch 0)
    /// ```
    #[error("Invalid batch selection: index {index}, {available} batch(es) available")]
    InvalidSelection { index: usize, available: usize },

    /// No batch carries the requested label.
    #[error("Batch '{label}' not found for stock {stock_id}")]
    BatchNotFound { stock_id: String, label: String },

    /// Cart line index out of range.
    #[error("Line {index} not found (cart has {len} line(s))")]
    LineNotFound { index: usize, len: usize },

    /// Other-charge index out of range.
    #[error("Charge {index} not found ({len} charge(s))")]
    ChargeNotFound { index: usize, len: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A commit was attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A commit was attempted without a buyer.
    #[error("Party is required")]
    MissingParty,

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed GSTIN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidSelection {
            index: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Invalid batch selection: index 5, 3 batch(es) available"
        );

        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptyCart.into();
        assert!(matches!(
            core_err,
            CoreError::Validation(ValidationError::EmptyCart)
        ));
    }
}
