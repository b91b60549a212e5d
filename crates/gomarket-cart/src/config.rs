//! # Cart Configuration
//!
//! Where the cart is stored, under which key, and how hard the background
//! writer tries before giving up on a snapshot.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GOMARKET_STORAGE_BACKEND=memory                                    │
//! │     GOMARKET_DB_PATH=/tmp/cart.db                                      │
//! │     GOMARKET_CART_KEY=@GoMarketplace:cart                              │
//! │     GOMARKET_PERSIST_RETRIES=5                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/gomarket/cart.toml (Linux)                               │
//! │     ~/Library/Application Support/com.gomarket.marketplace/cart.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     SQLite in the platform data dir, key "@GoMarketplace:cart"         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! backend = "sqlite"   # sqlite | memory
//! path = "/var/lib/gomarket/cart.db"
//!
//! [cart]
//! storage_key = "@GoMarketplace:cart"
//!
//! [persist]
//! max_retries = 3
//! initial_backoff_ms = 100
//! max_backoff_ms = 2000
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gomarket_core::DEFAULT_CART_KEY;
use gomarket_storage::{KeyValueStore, MemoryStore, SqliteStore, SqliteStoreConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CartError, CartResult};

// =============================================================================
// Storage Settings
// =============================================================================

/// Which key-value backend holds the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite file on disk. Survives restarts.
    #[default]
    Sqlite,

    /// Process memory. Lost on exit.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "disk" => Ok(StorageBackend::Sqlite),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(CartError::InvalidConfig(format!(
                "Unknown storage backend: '{}'. Valid options: sqlite, memory",
                other
            ))),
        }
    }
}

/// Storage location settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite file path. Defaults to `cart.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Cart Settings
// =============================================================================

/// Cart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSettings {
    /// Key the cart is persisted under. Owned exclusively by the cart.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_storage_key() -> String {
    DEFAULT_CART_KEY.to_string()
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            storage_key: default_storage_key(),
        }
    }
}

// =============================================================================
// Persist Settings
// =============================================================================

/// Background writer retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistSettings {
    /// Retries after the first failed write of a snapshot.
    /// 0 means a failed write is dropped immediately.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between retries (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff between retries (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    100
}
fn default_max_backoff() -> u64 {
    2000
}

impl Default for PersistSettings {
    fn default() -> Self {
        PersistSettings {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl PersistSettings {
    /// Initial backoff as a duration.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Maximum backoff as a duration.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// Main Cart Configuration
// =============================================================================

/// Complete cart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub cart: CartSettings,

    #[serde(default)]
    pub persist: PersistSettings,
}

impl CartConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for an in-memory cart; used by tests and demos.
    pub fn in_memory() -> Self {
        CartConfig {
            storage: StorageSettings {
                backend: StorageBackend::Memory,
                path: None,
            },
            ..Self::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (cart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CartResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CartResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CartError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Cart config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CartResult<()> {
        if self.cart.storage_key.trim().is_empty() {
            return Err(CartError::InvalidConfig(
                "cart.storage_key must not be empty".into(),
            ));
        }

        if self.persist.initial_backoff_ms > self.persist.max_backoff_ms {
            return Err(CartError::InvalidConfig(format!(
                "persist.initial_backoff_ms ({}) exceeds persist.max_backoff_ms ({})",
                self.persist.initial_backoff_ms, self.persist.max_backoff_ms
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from a variable lookup.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("GOMARKET_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(_) => warn!(backend = %backend, "Unknown storage backend in environment"),
            }
        }

        if let Some(path) = lookup("GOMARKET_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Some(key) = lookup("GOMARKET_CART_KEY") {
            self.cart.storage_key = key;
        }

        if let Some(retries) = lookup("GOMARKET_PERSIST_RETRIES") {
            if let Ok(n) = retries.parse::<u32>() {
                self.persist.max_retries = n;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("cart.toml"))
    }

    /// Returns the SQLite file path: the configured one, or `cart.db` in the
    /// platform data dir.
    pub fn database_path(&self) -> CartResult<PathBuf> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }

        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("cart.db"))
            .ok_or_else(|| CartError::InvalidConfig("Could not determine app data directory".into()))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "gomarket", "marketplace")
    }

    /// Opens the configured storage backend.
    pub async fn open_storage(&self) -> CartResult<Arc<dyn KeyValueStore>> {
        match self.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory cart storage");
                Ok(Arc::new(MemoryStore::new()))
            }
            StorageBackend::Sqlite => {
                let path = self.database_path()?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let store = SqliteStore::new(SqliteStoreConfig::new(path)).await?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Returns the storage key.
    pub fn storage_key(&self) -> &str {
        &self.cart.storage_key
    }
}
