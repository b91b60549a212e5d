//! # gomarket-storage: Key-Value Storage for GoMarketplace
//!
//! The cart treats storage as an opaque asynchronous key-value store with
//! `get` and `set`. This crate defines that contract and ships the backends.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Persistence Path                            │
//! │                                                                         │
//! │  CartStore mutation                                                    │
//! │       │ snapshot                                                        │
//! │       ▼                                                                 │
//! │  PersistWriter (gomarket-cart)                                         │
//! │       │ set("@GoMarketplace:cart", json)                               │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 gomarket-storage (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐    ┌────────────────┐    ┌─────────────┐  │   │
//! │  │   │ KeyValueStore  │    │  SqliteStore   │    │ MemoryStore │  │   │
//! │  │   │   (trait)      │◄───│  (pool, WAL,   │    │  (HashMap)  │  │   │
//! │  │   │                │    │   migrations)  │    │             │  │   │
//! │  │   └────────────────┘    └────────────────┘    └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `KeyValueStore` contract
//! - [`backend`] - SQLite and in-memory implementations
//! - [`migrations`] - Embedded schema migrations for the SQLite backend
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gomarket_storage::{KeyValueStore, SqliteStore, SqliteStoreConfig};
//!
//! let store = SqliteStore::new(SqliteStoreConfig::new("./cart.db")).await?;
//! store.set("@GoMarketplace:cart", "[]").await?;
//! assert_eq!(store.get("@GoMarketplace:cart").await?.as_deref(), Some("[]"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod error;
pub mod migrations;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::memory::MemoryStore;
pub use backend::sqlite::{SqliteStore, SqliteStoreConfig};
pub use error::{StorageError, StorageResult};
pub use store::KeyValueStore;
