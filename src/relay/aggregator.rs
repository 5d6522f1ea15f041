//! Album aggregation
//!
//! Fragments sharing a [`GroupKey`] are collected into one buffer that is
//! flushed a fixed interval after the first fragment arrived. Later fragments
//! never extend the window, which bounds album latency to the debounce
//! interval.

use super::worker::{RelayOutcome, RelayWorker};
use crate::client::MediaClient;
use crate::media::{ConversationRef, GroupKey, InboundItem};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Lifecycle of an album buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumState {
    /// Accepting fragments
    Open,
    /// Detached from the index, items being relayed
    Flushing,
    /// Every item relayed
    Closed,
}

#[derive(Debug)]
struct AlbumBuffer {
    generation: u64,
    items: Vec<InboundItem>,
    destination: ConversationRef,
    state: AlbumState,
}

/// Per-item outcomes of one flushed album, in arrival order
#[derive(Debug)]
pub struct FlushReport {
    /// Album key
    pub key: GroupKey,
    /// Where the album was posted
    pub destination: ConversationRef,
    /// Buffer state once the flush returned
    pub state: AlbumState,
    /// One outcome per item
    pub outcomes: Vec<RelayOutcome>,
}

impl FlushReport {
    /// Number of failed items
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

/// Owns open album buffers and schedules their flush
pub struct GroupAggregator<C: MediaClient> {
    index: Mutex<HashMap<GroupKey, AlbumBuffer>>,
    next_generation: AtomicU64,
    worker: RelayWorker<C>,
    debounce: Duration,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl<C: MediaClient + 'static> GroupAggregator<C> {
    /// Create an aggregator.
    ///
    /// Flush tasks are spawned on `tracker`. Cancelling `shutdown` flushes
    /// open albums without waiting out the debounce.
    pub fn new(
        worker: RelayWorker<C>,
        debounce: Duration,
        tracker: TaskTracker,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            index: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            worker,
            debounce,
            tracker,
            shutdown,
        }
    }

    /// Add a fragment to its album, opening a buffer and scheduling the
    /// flush if none is open for the key.
    ///
    /// Items without a group key skip aggregation and are relayed at once.
    pub async fn offer(self: &Arc<Self>, item: InboundItem) {
        let Some(key) = item.group_key.clone() else {
            warn!(
                message_id = item.reply_target,
                "Offered item has no group key; relaying it directly"
            );
            let worker = self.worker.clone();
            self.tracker.spawn(async move {
                worker.relay(&item).await;
            });
            return;
        };
        self.open_and_append(key, item).await;
    }

    async fn open_and_append(self: &Arc<Self>, key: GroupKey, item: InboundItem) {
        let created = {
            let mut index = self.index.lock().await;
            if let Some(buffer) = index.get_mut(&key) {
                buffer.items.push(item);
                debug!(group = %key, items = buffer.items.len(), "Extended album");
                None
            } else {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                index.insert(
                    key.clone(),
                    AlbumBuffer {
                        generation,
                        destination: item.source_conversation,
                        items: vec![item],
                        state: AlbumState::Open,
                    },
                );
                Some(generation)
            }
        };

        if let Some(generation) = created {
            debug!(group = %key, "Opened album");
            self.schedule_flush(key, generation);
        }
    }

    fn schedule_flush(self: &Arc<Self>, key: GroupKey, generation: u64) {
        let this = Arc::clone(self);
        self.tracker.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(this.debounce) => {}
                () = this.shutdown.cancelled() => {
                    info!(group = %key, "Shutdown requested; flushing album early");
                }
            }

            if let Some(report) = this.flush(&key, generation).await {
                info!(
                    group = %report.key,
                    chat_id = %report.destination,
                    items = report.outcomes.len(),
                    failed = report.failures(),
                    state = ?report.state,
                    "Album relayed"
                );
            }
        });
    }

    /// Detach the buffer opened as `generation` and relay its items in
    /// arrival order.
    ///
    /// Returns `None` if that buffer is no longer in the index.
    async fn flush(&self, key: &GroupKey, generation: u64) -> Option<FlushReport> {
        let removed = {
            let mut index = self.index.lock().await;
            match index.get(key) {
                Some(buffer) if buffer.generation == generation => index.remove(key),
                _ => None,
            }
        };
        let Some(mut buffer) = removed else {
            warn!(group = %key, generation, "Flush fired for an album no longer open");
            return None;
        };

        buffer.state = AlbumState::Flushing;
        debug!(group = %key, items = buffer.items.len(), state = ?buffer.state, "Flushing album");

        let mut outcomes = Vec::with_capacity(buffer.items.len());
        for item in &buffer.items {
            outcomes.push(self.worker.relay(item).await);
        }
        buffer.state = AlbumState::Closed;
        debug!(group = %key, state = ?buffer.state, "Album closed");

        Some(FlushReport {
            key: key.clone(),
            destination: buffer.destination,
            state: buffer.state,
            outcomes,
        })
    }

    /// Number of albums still accepting fragments
    pub async fn open_albums(&self) -> usize {
        self.index.lock().await.len()
    }
}
