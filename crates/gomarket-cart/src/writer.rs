//! # Persistence Writer
//!
//! Background task that writes cart snapshots to the key-value store.
//!
//! ## Write Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Persistence Writer Flow                            │
//! │                                                                         │
//! │  CartStore mutation (lock held)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PersistHandle::write(json) ──► unbounded mpsc (FIFO)                  │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    PersistWriter::run                           │   │
//! │  │                                                                 │   │
//! │  │  1. Receive: next command                                      │   │
//! │  │                                                                 │   │
//! │  │  2. Coalesce: drain queued Write commands, keep the newest.    │   │
//! │  │     Stop at the first Flush/Shutdown so it stays ordered.      │   │
//! │  │                                                                 │   │
//! │  │  3. Write: storage.set(key, json)                              │   │
//! │  │                                                                 │   │
//! │  │  4. Retry: retryable error → sleep(backoff) → step 3           │   │
//! │  │            up to persist.max_retries, then error! and drop     │   │
//! │  │                                                                 │   │
//! │  │  5. Ack: Flush/Shutdown senders fire after earlier writes      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Failures never reach the caller that triggered the write.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use gomarket_storage::KeyValueStore;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::PersistSettings;
use crate::error::{CartError, CartResult};

// =============================================================================
// Commands
// =============================================================================

/// Messages processed by the writer, in the order they were sent.
#[derive(Debug)]
enum PersistCommand {
    /// Full serialized cart snapshot.
    Write(String),

    /// Acknowledge once every earlier write has been attempted.
    Flush(oneshot::Sender<()>),

    /// Write what is queued, acknowledge, then stop.
    Shutdown(oneshot::Sender<()>),
}

// =============================================================================
// Writer
// =============================================================================

/// Owns the storage key and performs every write to it.
pub struct PersistWriter {
    /// Backend the snapshots go to.
    storage: Arc<dyn KeyValueStore>,

    /// Key the cart is stored under.
    key: String,

    /// Retry settings.
    settings: PersistSettings,

    /// Command queue.
    rx: mpsc::UnboundedReceiver<PersistCommand>,

    /// Control command taken off the queue while coalescing.
    pending: Option<PersistCommand>,
}

/// Handle for queueing snapshots and controlling the writer.
#[derive(Debug, Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl PersistHandle {
    /// Queues a snapshot. Never blocks.
    ///
    /// Returns false when the writer has stopped; the snapshot is discarded.
    pub fn write(&self, payload: String) -> bool {
        if self.tx.send(PersistCommand::Write(payload)).is_err() {
            warn!("Persistence writer stopped, cart snapshot discarded");
            return false;
        }
        true
    }

    /// Waits until every snapshot queued before this call has been attempted.
    pub async fn flush(&self) -> CartResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(PersistCommand::Flush(ack_tx))
            .map_err(|_| CartError::WriterStopped)?;
        ack_rx.await.map_err(|_| CartError::WriterStopped)
    }

    /// Writes what is queued and stops the writer.
    pub async fn shutdown(&self) -> CartResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(PersistCommand::Shutdown(ack_tx))
            .map_err(|_| CartError::WriterStopped)?;
        ack_rx.await.map_err(|_| CartError::WriterStopped)
    }

    /// Returns true once the writer has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PersistWriter {
    /// Creates a writer and its handle.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        settings: PersistSettings,
    ) -> (Self, PersistHandle) {
        let (tx, rx) = mpsc::unbounded_channel();

        let writer = PersistWriter {
            storage,
            key: key.into(),
            settings,
            rx,
            pending: None,
        };

        (writer, PersistHandle { tx })
    }

    /// Runs the writer loop.
    ///
    /// This should be spawned as a background task. It ends on `Shutdown` or
    /// when every handle has been dropped.
    pub async fn run(mut self) {
        info!(key = %self.key, "Persistence writer starting");

        while let Some(command) = self.next_command().await {
            match command {
                PersistCommand::Write(payload) => {
                    let latest = self.coalesce(payload);
                    self.write_with_retry(&latest).await;
                }

                PersistCommand::Flush(ack) => {
                    let _ = ack.send(());
                }

                PersistCommand::Shutdown(ack) => {
                    self.drain_for_shutdown().await;
                    let _ = ack.send(());
                    break;
                }
            }
        }

        info!(key = %self.key, "Persistence writer stopped");
    }

    async fn next_command(&mut self) -> Option<PersistCommand> {
        if let Some(command) = self.pending.take() {
            return Some(command);
        }
        self.rx.recv().await
    }

    /// Replaces `payload` with the newest queued snapshot.
    fn coalesce(&mut self, mut payload: String) -> String {
        let mut skipped = 0usize;

        while let Ok(command) = self.rx.try_recv() {
            match command {
                PersistCommand::Write(next) => {
                    payload = next;
                    skipped += 1;
                }
                other => {
                    self.pending = Some(other);
                    break;
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "Coalesced cart snapshots");
        }
        payload
    }

    /// Closes the queue and writes the newest snapshot still in it.
    async fn drain_for_shutdown(&mut self) {
        self.rx.close();

        let mut latest = None;
        while let Ok(command) = self.rx.try_recv() {
            match command {
                PersistCommand::Write(payload) => latest = Some(payload),
                PersistCommand::Flush(ack) | PersistCommand::Shutdown(ack) => {
                    if let Some(payload) = latest.take() {
                        self.write_with_retry(&payload).await;
                    }
                    let _ = ack.send(());
                }
            }
        }

        if let Some(payload) = latest {
            self.write_with_retry(&payload).await;
        }
    }

    async fn write_with_retry(&self, payload: &str) {
        let mut backoff = self.create_backoff();
        let mut retries = 0u32;

        loop {
            match self.storage.set(&self.key, payload).await {
                Ok(()) => {
                    debug!(key = %self.key, bytes = payload.len(), retries, "Cart persisted");
                    return;
                }

                Err(e) if e.is_retryable() && retries < self.settings.max_retries => {
                    retries += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.settings.max_backoff());

                    warn!(
                        key = %self.key,
                        attempt = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Cart write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }

                Err(e) => {
                    error!(
                        key = %self.key,
                        attempts = retries + 1,
                        error = %e,
                        "Cart write failed, snapshot dropped"
                    );
                    return;
                }
            }
        }
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.settings.initial_backoff(),
            max_interval: self.settings.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None, // bounded by max_retries instead
            ..Default::default()
        }
    }
}
