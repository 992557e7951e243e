//! # Validation Module
//!
//! Numeric coercion and boundary validation.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Cart line edits (qty / rate / disc)                                   │
//! │  └── coerce_non_negative: bad input becomes 0, never an error          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  API boundary                                                           │
//! │  ├── validate_charge (name, amount)                                    │
//! │  └── validate_gstin                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Commit (InvoiceDraft::commit_payload)                                 │
//! │  └── non-empty cart, party present                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Database: NOT NULL / UNIQUE(tenant_id, bill_no)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bahi_core::validation::{coerce_non_negative, coerce_percent};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(coerce_non_negative("2.5"), Decimal::new(25, 1));
//! assert_eq!(coerce_non_negative("abc"), Decimal::ZERO);
//! assert_eq!(coerce_non_negative("-3"), Decimal::ZERO);
//! assert_eq!(coerce_percent("150"), Decimal::ONE_HUNDRED);
//! ```

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Parses user-entered numeric text, falling back to zero.
///
/// ## Rules
/// - Plain and scientific notation are accepted (`"12.50"`, `"1e2"`)
/// - Empty, non-numeric, non-finite or negative input yields `0`
pub fn coerce_non_negative(raw: &str) -> Decimal {
    let raw = raw.trim();
    let parsed = Decimal::from_str(raw)
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .and_then(Decimal::from_f64)
        });

    clamp_non_negative(parsed.unwrap_or_default())
}

/// Like [`coerce_non_negative`], capped at 100.
pub fn coerce_percent(raw: &str) -> Decimal {
    clamp_percent(coerce_non_negative(raw))
}

/// Negative values become zero.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        Decimal::ZERO
    } else {
        value
    }
}

/// Clamps a percentage into `0..=100`.
pub fn clamp_percent(value: Decimal) -> Decimal {
    clamp_non_negative(value).min(Decimal::ONE_HUNDRED)
}

// =============================================================================
// Boundary Validators
// =============================================================================

/// Validates an other-charge before it enters the ledger.
///
/// ## Rules
/// - Name must not be blank
/// - Amount must be greater than zero
///
/// ## Example
/// ```rust
/// use bahi_core::validation::validate_charge;
/// use bahi_core::Money;
///
/// assert!(validate_charge("Freight", Money::from_rupees(50)).is_ok());
/// assert!(validate_charge("  ", Money::from_rupees(50)).is_err());
/// assert!(validate_charge("Freight", Money::zero()).is_err());
/// ```
pub fn validate_charge(name: &str, amount: Money) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates the shape of a GSTIN.
///
/// ## Rules
/// - Exactly 15 ASCII alphanumeric characters
/// - First two characters are the numeric state code
///
/// The check digit is not verified.
pub fn validate_gstin(gstin: &str) -> ValidationResult<()> {
    let gstin = gstin.trim();

    if gstin.is_empty() {
        return Err(ValidationError::Required {
            field: "gstin".to_string(),
        });
    }

    if gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "gstin".to_string(),
            reason: "must be 15 letters or digits".to_string(),
        });
    }

    if !gstin[..2].chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "gstin".to_string(),
            reason: "must start with a two-digit state code".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
