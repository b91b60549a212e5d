//! # Cart Error Types
//!
//! Errors a `CartStore` caller can see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Mutation      │  │  Configuration  │  │     Lifecycle           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  ItemNotFound   │  │  InvalidConfig  │  │  WriterStopped          │ │
//! │  │  Core           │  │  ConfigLoad...  │  │  Storage (open only)    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Never surfaced: malformed persisted data, failed background writes.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gomarket_core::CoreError;
use gomarket_storage::StorageError;
use thiserror::Error;

/// Result type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Cart error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// `increment` or `decrement` on a product id that is not in the cart.
    /// The cart is left unchanged and nothing is written.
    #[error("Item not found in cart: {0}")]
    ItemNotFound(String),

    /// Other domain error.
    #[error(transparent)]
    Core(CoreError),

    /// Storage backend could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid cart configuration.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// The background persistence writer has shut down.
    #[error("Persistence writer has stopped")]
    WriterStopped,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for CartError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => CartError::ItemNotFound(id),
            other => CartError::Core(other),
        }
    }
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CartError {
    fn from(err: toml::ser::Error) -> Self {
        CartError::ConfigSaveFailed(err.to_string())
    }
}

impl CartError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CartError::InvalidConfig(_)
                | CartError::ConfigLoadFailed(_)
                | CartError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_lifted_from_core() {
        let err: CartError = CoreError::ItemNotFound("A".into()).into();
        assert!(matches!(err, CartError::ItemNotFound(id) if id == "A"));

        let err: CartError = CoreError::MalformedPayload("x".into()).into();
        assert!(matches!(err, CartError::Core(_)));
    }

    #[test]
    fn test_config_errors() {
        assert!(CartError::InvalidConfig("bad".into()).is_config_error());
        assert!(!CartError::WriterStopped.is_config_error());
        assert!(!CartError::ItemNotFound("A".into()).is_config_error());
    }
}
