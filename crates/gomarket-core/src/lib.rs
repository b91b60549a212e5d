//! # gomarket-core: Pure Cart Logic for GoMarketplace
//!
//! This crate is the **heart** of the storefront cart. It holds the line item
//! types, the in-memory cart with its three mutations, and the codec for the
//! persisted payload. Nothing here touches storage or spawns tasks.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     GoMarketplace Cart Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront UI (out of scope)                    │   │
//! │  │      Product list ──► Cart screen ──► +/- buttons               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              gomarket-cart (CartStore, writer task)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gomarket-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   cart    │  │  payload  │  │ validation│  │   │
//! │  │   │ LineItem  │  │   Cart    │  │  encode   │  │  rules    │  │   │
//! │  │   │  Price    │  │ mutations │  │  decode   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO RUNTIME • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            gomarket-storage (key-value backends)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, NewLineItem, Price)
//! - [`cart`] - The ordered cart and its mutations
//! - [`payload`] - JSON encode/decode of the persisted cart
//! - [`validation`] - Field and collection rules for hydrated data
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use gomarket_core::{Cart, NewLineItem, Price};
//!
//! let mut cart = Cart::new();
//! let shoe = NewLineItem::new("A", "Shoe", "u", Price::new(10.0).unwrap());
//!
//! cart.add(shoe.clone());
//! cart.add(shoe);
//!
//! assert_eq!(cart.get("A").map(|item| item.quantity), Some(2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod payload;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, LineChange};
pub use error::{CoreError, CoreResult, ValidationError};
pub use payload::{decode_items, encode_items};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key the cart is persisted under.
///
/// Namespaced with the app name so the cart never collides with other
/// entries in the shared on-device key-value store.
pub const DEFAULT_CART_KEY: &str = "@GoMarketplace:cart";
