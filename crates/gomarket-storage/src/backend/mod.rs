//! # Storage Backends
//!
//! ```text
//! backend/
//! ├── memory.rs  ◄─── HashMap behind an RwLock, with a fault switch
//! └── sqlite.rs  ◄─── kv_store table in a WAL-mode SQLite file
//! ```

pub mod memory;
pub mod sqlite;
