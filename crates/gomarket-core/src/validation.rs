//! # Validation Module
//!
//! Rules applied to line items that come back from storage.
//!
//! The cart only ever produces valid lines through its own mutations, so
//! these checks exist for the hydration path: a payload written by an older
//! client, a hand-edited database, or a truncated write must not smuggle a
//! zero quantity or a duplicate id into memory.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Hydration Validation                               │
//! │                                                                         │
//! │  Layer 1: serde                                                        │
//! │  ├── Top level is an array                                             │
//! │  └── Every field present with the right JSON type                      │
//! │      (any string is a valid id, as `Cart::add` accepts any string)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── price finite                                                      │
//! │  ├── quantity >= 1                                                     │
//! │  └── ids unique across the list                                        │
//! │                                                                         │
//! │  Any failure → whole payload rejected → empty cart                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::LineItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a quantity of a line present in the cart.
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a single line.
pub fn validate_line(line: &LineItem) -> ValidationResult<()> {
    if !line.price.is_finite() {
        return Err(ValidationError::MustBeFinite {
            field: "price".to_string(),
        });
    }

    validate_quantity(line.quantity)
}

/// Validates a whole list of lines, including id uniqueness.
///
/// ## Returns
/// The index of the first offending line together with the error.
pub fn validate_items(items: &[LineItem]) -> Result<(), (usize, ValidationError)> {
    let mut seen = HashSet::with_capacity(items.len());

    for (index, line) in items.iter().enumerate() {
        validate_line(line).map_err(|e| (index, e))?;

        if !seen.insert(line.id.as_str()) {
            return Err((
                index,
                ValidationError::Duplicate {
                    field: "id".to_string(),
                    value: line.id.clone(),
                },
            ));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
