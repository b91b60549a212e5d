//! # Error Types
//!
//! Domain-specific error types for gomarket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gomarket-core errors (this file)                                      │
//! │  ├── CoreError        - Cart mutation and payload errors               │
//! │  └── ValidationError  - Field-level failures in hydrated data          │
//! │                                                                         │
//! │  gomarket-storage errors (separate crate)                              │
//! │  └── StorageError     - Key-value backend failures                     │
//! │                                                                         │
//! │  gomarket-cart errors                                                   │
//! │  └── CartError        - What CartStore callers see                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError → UI                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core cart logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line with this product id is in the cart.
    ///
    /// ## When This Occurs
    /// - `increment` or `decrement` on an id that was never added
    /// - `decrement` on an id whose line was already removed
    #[error("Item not found in cart: {0}")]
    ItemNotFound(String),

    /// The persisted payload could not be turned back into line items.
    ///
    /// Covers unparseable JSON, a wrong top-level shape, missing or
    /// mistyped fields, and lines that fail validation.
    #[error("Malformed cart payload: {0}")]
    MalformedPayload(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::MalformedPayload(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric value is NaN or infinite.
    #[error("{field} must be a finite number")]
    MustBeFinite { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Duplicate value (e.g., the same product id on two lines).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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
        let err = CoreError::ItemNotFound("A".to_string());
        assert_eq!(err.to_string(), "Item not found in cart: A");

        let err = ValidationError::Duplicate {
            field: "id".to_string(),
            value: "A".to_string(),
        };
        assert_eq!(err.to_string(), "id 'A' already exists");
    }

    #[test]
    fn test_json_error_becomes_malformed_payload() {
        let json_err = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
        let core_err: CoreError = json_err.into();
        assert!(matches!(core_err, CoreError::MalformedPayload(_)));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
