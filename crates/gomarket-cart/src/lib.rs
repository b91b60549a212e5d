//! # gomarket-cart: Cart State Container
//!
//! The `CartStore` the storefront talks to: hydration at startup, the
//! add/increment/decrement mutations, change subscription, and the background
//! writer that persists every change to the key-value store.
//!
//! ## Modules
//!
//! - [`store`] - `CartStore` and hydration
//! - [`writer`] - Background persistence writer (queue, coalescing, retries)
//! - [`config`] - TOML/env configuration and storage selection
//! - [`error`] - Cart error types
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use gomarket_cart::{CartConfig, CartStore};
//! use gomarket_core::{NewLineItem, Price};
//!
//! let config = CartConfig::load(None)?;
//! let storage = config.open_storage().await?;
//! let cart = CartStore::open(storage, &config).await;
//!
//! cart.add_to_cart(NewLineItem::new("A", "Shoe", "https://img/a.png", Price::new(10.0)?));
//! cart.increment("A")?;
//!
//! cart.shutdown().await?;
//! ```

pub mod config;
pub mod error;
pub mod store;
pub mod writer;

pub use config::{CartConfig, CartSettings, PersistSettings, StorageBackend, StorageSettings};
pub use error::{CartError, CartResult};
pub use store::CartStore;
pub use writer::{PersistHandle, PersistWriter};
