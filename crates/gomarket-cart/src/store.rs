//! # Cart Store
//!
//! The single source of truth for the storefront cart.
//!
//! ## Thread Safety
//! The cart sits behind a `std::sync::Mutex`. Every mutation holds the lock
//! while it applies the change, queues the snapshot for persistence, and
//! publishes it to subscribers, so snapshots reach the writer in the same
//! order the mutations happened. No `.await` happens under the lock.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartStore Lifecycle                              │
//! │                                                                         │
//! │  CartStore::open(storage, config).await                                │
//! │       │                                                                 │
//! │       ├── storage.get(key)          ← hydrate once                     │
//! │       │     absent / error / malformed → empty cart (warn!)            │
//! │       │                                                                 │
//! │       └── spawn PersistWriter       ← owns every write to key          │
//! │                                                                         │
//! │  add_to_cart / increment / decrement / clear                           │
//! │       │                                                                 │
//! │       ├── Cart mutation (under lock)                                   │
//! │       ├── PersistHandle::write(json)  (fire-and-forget)                │
//! │       └── watch::Sender::send_replace(items)                           │
//! │                                                                         │
//! │  shutdown().await  ← writes queued snapshots, stops the writer         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gomarket_core::{decode_items, encode_items, Cart, CoreResult, LineChange, LineItem, NewLineItem};
use gomarket_storage::KeyValueStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::CartConfig;
use crate::error::CartResult;
use crate::writer::{PersistHandle, PersistWriter};

/// Cart state container with best-effort persistence.
///
/// Only exists once hydration has finished, so no mutation can race it.
pub struct CartStore {
    /// The cart.
    cart: Mutex<Cart>,

    /// Latest items, for subscribers.
    changes: watch::Sender<Vec<LineItem>>,

    /// Queue to the background writer.
    persist: PersistHandle,

    /// Storage key, for logging.
    key: String,

    /// Background writer task.
    writer_task: Mutex<Option<JoinHandle<()>>>,
}

impl CartStore {
    /// Hydrates the cart from storage and starts the background writer.
    ///
    /// Never fails: a missing, unreadable, or malformed persisted cart
    /// results in an empty cart.
    pub async fn open(storage: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let key = config.storage_key().to_string();
        let items = load_persisted(storage.as_ref(), &key).await;

        info!(key = %key, count = items.len(), "Cart hydrated");

        let (writer, persist) = PersistWriter::new(storage, key.clone(), config.persist.clone());
        let writer_task = tokio::spawn(writer.run());

        let (changes, _) = watch::channel(items.clone());

        CartStore {
            cart: Mutex::new(Cart::from_items(items)),
            changes,
            persist,
            key,
            writer_task: Mutex::new(Some(writer_task)),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of a product.
    ///
    /// An id already in the cart gets its quantity raised by one and keeps
    /// its original title, image and price. A new id is appended.
    pub fn add_to_cart(&self, item: NewLineItem) -> LineChange {
        let id = item.id.clone();
        let mut cart = self.lock_cart();

        let change = cart.add(item);
        debug!(id = %id, ?change, "Cart add");

        self.publish(&cart);
        change
    }

    /// Raises the quantity of a line by one.
    ///
    /// ## Errors
    /// `CartError::ItemNotFound` if no line has this id. Nothing is written.
    pub fn increment(&self, id: &str) -> CartResult<LineChange> {
        self.mutate(id, "increment", |cart| cart.increment(id))
    }

    /// Lowers the quantity of a line by one, removing it at one.
    ///
    /// ## Errors
    /// `CartError::ItemNotFound` if no line has this id. Nothing is written.
    pub fn decrement(&self, id: &str) -> CartResult<LineChange> {
        self.mutate(id, "decrement", |cart| cart.decrement(id))
    }

    /// Removes every line and persists the empty cart.
    pub fn clear(&self) {
        let mut cart = self.lock_cart();
        let removed = cart.item_count();
        cart.clear();
        debug!(removed, "Cart cleared");
        self.publish(&cart);
    }

    fn mutate<F>(&self, id: &str, op: &'static str, f: F) -> CartResult<LineChange>
    where
        F: FnOnce(&mut Cart) -> CoreResult<LineChange>,
    {
        let mut cart = self.lock_cart();

        match f(&mut cart) {
            Ok(change) => {
                debug!(id = %id, op, ?change, "Cart update");
                self.publish(&cart);
                Ok(change)
            }
            Err(e) => {
                debug!(id = %id, op, error = %e, "Cart update rejected");
                Err(e.into())
            }
        }
    }

    /// Queues the snapshot and notifies subscribers. Called with the lock held.
    fn publish(&self, cart: &Cart) {
        match encode_items(cart.items()) {
            Ok(payload) => {
                self.persist.write(payload);
            }
            Err(e) => error!(key = %self.key, error = %e, "Failed to encode cart snapshot"),
        }
        self.changes.send_replace(cart.items().to_vec());
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns an owned copy of the lines in display order.
    pub fn products(&self) -> Vec<LineItem> {
        self.with_cart(|cart| cart.items().to_vec())
    }

    /// Returns one line by product id.
    pub fn item(&self, id: &str) -> Option<LineItem> {
        self.with_cart(|cart| cart.get(id).cloned())
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.with_cart(Cart::item_count)
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.with_cart(Cart::total_quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.with_cart(Cart::is_empty)
    }

    /// Receives the full item list after every applied mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineItem>> {
        self.changes.subscribe()
    }

    /// Executes a function with read access to the cart.
    fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock_cart();
        f(&cart)
    }

    fn lock_cart(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Waits until every snapshot queued so far has been written or dropped.
    pub async fn flush(&self) -> CartResult<()> {
        self.persist.flush().await
    }

    /// Writes queued snapshots and stops the background writer.
    ///
    /// Later mutations still update the in-memory cart but are no longer
    /// persisted.
    pub async fn shutdown(&self) -> CartResult<()> {
        self.persist.shutdown().await?;

        let task = self
            .writer_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Persistence writer task ended abnormally");
            }
        }

        info!(key = %self.key, "Cart store shut down");
        Ok(())
    }
}

/// Reads and decodes the persisted cart. Any failure yields an empty list.
async fn load_persisted(storage: &dyn KeyValueStore, key: &str) -> Vec<LineItem> {
    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = %key, "No persisted cart");
            return Vec::new();
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read persisted cart, starting empty");
            return Vec::new();
        }
    };

    match decode_items(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding malformed persisted cart");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CartError;
    use gomarket_core::Price;
    use gomarket_storage::{MemoryStore, SqliteStore, SqliteStoreConfig};
    use std::time::Duration;

    const KEY: &str = "@GoMarketplace:cart";

    fn product(id: &str, price: f64) -> NewLineItem {
        NewLineItem::new(id, format!("Product {}", id), format!("https://img/{}.png", id), Price::new(price).unwrap())
    }

    fn lines(store: &CartStore) -> Vec<(String, u32)> {
        store
            .products()
            .into_iter()
            .map(|item| (item.id, item.quantity))
            .collect()
    }

    fn expected(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
        pairs.iter().map(|(id, qty)| (id.to_string(), *qty)).collect()
    }

    fn test_config() -> CartConfig {
        let mut config = CartConfig::in_memory();
        config.persist.initial_backoff_ms = 1;
        config.persist.max_backoff_ms = 5;
        config
    }

    async fn open_with(store: Arc<MemoryStore>) -> CartStore {
        CartStore::open(store, &test_config()).await
    }

    async fn persisted(store: &MemoryStore) -> Option<Vec<LineItem>> {
        store
            .get(KEY)
            .await
            .unwrap()
            .map(|raw| decode_items(&raw).unwrap())
    }

    #[tokio::test]
    async fn test_storefront_scenario_persists_each_step() {
        let backend = Arc::new(MemoryStore::new());
        let cart = open_with(backend.clone()).await;

        cart.add_to_cart(product("A", 10.0));
        assert_eq!(lines(&cart), expected(&[("A", 1)]));

        cart.add_to_cart(product("A", 10.0));
        assert_eq!(lines(&cart), expected(&[("A", 2)]));

        cart.add_to_cart(product("B", 5.5));
        assert_eq!(lines(&cart), expected(&[("A", 2), ("B", 1)]));

        cart.decrement("A").unwrap();
        assert_eq!(lines(&cart), expected(&[("A", 1), ("B", 1)]));

        cart.decrement("A").unwrap();
        assert_eq!(lines(&cart), expected(&[("B", 1)]));

        cart.flush().await.unwrap();
        assert_eq!(persisted(&backend).await.unwrap(), cart.products());
    }

    #[tokio::test]
    async fn test_add_existing_keeps_fields_and_position() {
        let cart = open_with(Arc::new(MemoryStore::new())).await;

        cart.add_to_cart(product("A", 10.0));
        cart.add_to_cart(product("B", 2.0));

        let mut changed = product("A", 99.0);
        changed.title = "Renamed".into();
        assert_eq!(cart.add_to_cart(changed), LineChange::Quantity(2));

        let items = cart.products();
        assert_eq!(items[0].id, "A");
        assert_eq!(items[0].title, "Product A");
        assert_eq!(items[0].price.value(), 10.0);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].id, "B");
    }

    #[tokio::test]
    async fn test_increment_touches_only_target() {
        let cart = open_with(Arc::new(MemoryStore::new())).await;
        cart.add_to_cart(product("A", 1.0));
        cart.add_to_cart(product("B", 1.0));

        assert_eq!(cart.increment("B").unwrap(), LineChange::Quantity(2));
        assert_eq!(lines(&cart), expected(&[("A", 1), ("B", 2)]));
    }

    #[tokio::test]
    async fn test_missing_id_is_rejected_without_write() {
        let backend = Arc::new(MemoryStore::new());
        let cart = open_with(backend.clone()).await;
        cart.add_to_cart(product("A", 1.0));
        cart.flush().await.unwrap();
        let writes = backend.write_count();

        assert!(matches!(cart.increment("Z"), Err(CartError::ItemNotFound(id)) if id == "Z"));
        assert!(matches!(cart.decrement("Z"), Err(CartError::ItemNotFound(_))));

        cart.flush().await.unwrap();
        assert_eq!(backend.write_count(), writes);
        assert_eq!(lines(&cart), expected(&[("A", 1)]));
    }

    #[tokio::test]
    async fn test_blank_id_survives_restart() {
        let backend = Arc::new(MemoryStore::new());

        let first = open_with(backend.clone()).await;
        first.add_to_cart(product("A", 1.0));
        first.add_to_cart(product(" ", 2.0));
        first.add_to_cart(product(" ", 2.0));
        first.shutdown().await.unwrap();

        let second = open_with(backend).await;
        assert_eq!(lines(&second), expected(&[("A", 1), (" ", 2)]));
        assert_eq!(second.products(), first.products());
    }

    #[tokio::test]
    async fn test_hydrates_existing_cart() {
        let raw = r#"[{"id":"A","title":"Shoe","imageUrl":"u","price":10.0,"quantity":3}]"#;
        let backend = Arc::new(MemoryStore::with_entry(KEY, raw));

        let cart = open_with(backend).await;

        assert_eq!(lines(&cart), expected(&[("A", 3)]));
        assert_eq!(cart.item("A").unwrap().image_url, "u");
        assert_eq!(cart.total_quantity(), 3);
    }

    #[tokio::test]
    async fn test_malformed_payloads_hydrate_empty() {
        let payloads = [
            "not json",
            r#"{"id":"A"}"#,
            r#"[{"id":"A","title":"t","image_url":"u","price":1.0,"quantity":0}]"#,
            r#"[{"id":"A","title":"t","image_url":"u","price":1.0}]"#,
            r#"[{"id":"A","title":"t","image_url":"u","price":1.0,"quantity":1},{"id":"A","title":"t","image_url":"u","price":1.0,"quantity":1}]"#,
        ];

        for raw in payloads {
            let cart = open_with(Arc::new(MemoryStore::with_entry(KEY, raw))).await;
            assert!(cart.is_empty(), "payload should be discarded: {}", raw);
        }
    }

    #[tokio::test]
    async fn test_unreadable_storage_hydrates_empty() {
        let backend = Arc::new(MemoryStore::with_entry(
            KEY,
            r#"[{"id":"A","title":"t","image_url":"u","price":1.0,"quantity":1}]"#,
        ));
        backend.set_failing(true);

        let cart = open_with(backend.clone()).await;
        assert!(cart.is_empty());

        backend.set_failing(false);
        cart.add_to_cart(product("B", 1.0));
        cart.flush().await.unwrap();
        assert_eq!(persisted(&backend).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_retried_in_background() {
        let backend = Arc::new(MemoryStore::new());
        let mut config = test_config();
        config.persist.max_retries = 1_000;
        let cart = CartStore::open(backend.clone(), &config).await;

        backend.set_failing(true);
        cart.add_to_cart(product("A", 1.0));
        assert_eq!(cart.item_count(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.set_failing(false);

        cart.flush().await.unwrap();
        assert_eq!(persisted(&backend).await.unwrap(), cart.products());
    }

    #[tokio::test]
    async fn test_clear_persists_empty_list() {
        let backend = Arc::new(MemoryStore::new());
        let cart = open_with(backend.clone()).await;
        cart.add_to_cart(product("A", 1.0));

        cart.clear();
        cart.flush().await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(backend.get(KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_subscribers_see_every_mutation() {
        let cart = open_with(Arc::new(MemoryStore::new())).await;
        let mut rx = cart.subscribe();
        assert!(rx.borrow().is_empty());

        cart.add_to_cart(product("A", 1.0));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        let _ = cart.increment("missing");
        assert!(!rx.has_changed().unwrap());

        cart.decrement("A").unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let backend = Arc::new(MemoryStore::new());

        let first = open_with(backend.clone()).await;
        first.add_to_cart(product("A", 1.0));
        first.add_to_cart(product("B", 1.0));
        first.increment("B").unwrap();
        first.shutdown().await.unwrap();

        let second = open_with(backend).await;
        assert_eq!(lines(&second), expected(&[("A", 1), ("B", 2)]));
    }

    #[tokio::test]
    async fn test_shutdown_stops_persistence() {
        let backend = Arc::new(MemoryStore::new());
        let cart = open_with(backend.clone()).await;
        cart.shutdown().await.unwrap();

        cart.add_to_cart(product("A", 1.0));
        assert_eq!(cart.item_count(), 1);
        assert!(matches!(cart.flush().await, Err(CartError::WriterStopped)));
        assert_eq!(backend.get(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_keep_invariants() {
        let backend = Arc::new(MemoryStore::new());
        let cart = Arc::new(open_with(backend.clone()).await);

        let mut tasks = Vec::new();
        for worker in 0..8 {
            let cart = cart.clone();
            tasks.push(tokio::spawn(async move {
                for round in 0..50 {
                    let id = format!("P{}", (worker + round) % 5);
                    cart.add_to_cart(product(&id, 1.0));
                    if round % 3 == 0 {
                        let _ = cart.decrement(&id);
                    }
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let items = cart.products();
        let mut ids: Vec<_> = items.iter().map(|item| item.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), items.len());
        assert!(items.iter().all(|item| item.quantity >= 1));

        cart.flush().await.unwrap();
        assert_eq!(persisted(&backend).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_sqlite_backend_round_trip() {
        let backend: Arc<dyn KeyValueStore> =
            Arc::new(SqliteStore::new(SqliteStoreConfig::in_memory()).await.unwrap());

        let cart = CartStore::open(backend.clone(), &test_config()).await;
        cart.add_to_cart(product("A", 10.0));
        cart.add_to_cart(product("A", 10.0));
        cart.shutdown().await.unwrap();

        let reopened = CartStore::open(backend, &test_config()).await;
        assert_eq!(lines(&reopened), expected(&[("A", 2)]));
    }
}
