//! Per-update entry point of the relay pipeline

use super::aggregator::GroupAggregator;
use super::worker::RelayWorker;
use crate::client::MediaClient;
use crate::media::{classify, Classification, GroupKey, InboundItem, InboundUpdate};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// What the dispatcher did with an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// Not a new message
    Ignored,
    /// Reply destination could not be resolved
    Unresolved,
    /// No relay-eligible video attached
    NotApplicable,
    /// Handed to the aggregator
    Grouped(GroupKey),
    /// Relay spawned immediately
    Single,
}

/// Routes inbound updates to the aggregator or straight to a relay.
///
/// Never waits for a relay or a flush; all of them run on the shared
/// [`TaskTracker`].
pub struct RelayDispatcher<C: MediaClient> {
    aggregator: Arc<GroupAggregator<C>>,
    worker: RelayWorker<C>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl<C: MediaClient + 'static> RelayDispatcher<C> {
    /// Wire the pipeline around `client`
    pub fn new(client: Arc<C>, transient_dir: impl Into<PathBuf>, debounce: Duration) -> Self {
        let worker = RelayWorker::new(client, transient_dir);
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();
        let aggregator = Arc::new(GroupAggregator::new(
            worker.clone(),
            debounce,
            tracker.clone(),
            shutdown.clone(),
        ));

        Self {
            aggregator,
            worker,
            tracker,
            shutdown,
        }
    }

    /// Album aggregator used for grouped items
    #[must_use]
    pub fn aggregator(&self) -> &Arc<GroupAggregator<C>> {
        &self.aggregator
    }

    /// Handle one update
    pub async fn dispatch(&self, update: InboundUpdate) -> DispatchAction {
        let InboundUpdate::NewMessage(message) = update else {
            return DispatchAction::Ignored;
        };

        let Some(conversation) = message.conversation else {
            debug!(message_id = message.id, "Dropping update without a reply destination");
            return DispatchAction::Unresolved;
        };

        let Some(Classification::VideoItem {
            media_ref,
            file_name,
        }) = message.media.as_ref().map(classify)
        else {
            return DispatchAction::NotApplicable;
        };

        info!(chat_id = %conversation, message_id = message.id, "Received video");

        let item = InboundItem {
            group_key: message.group_key,
            source_conversation: conversation,
            media_ref,
            suggested_file_name: file_name,
            reply_target: message.id,
        };

        if let Some(key) = item.group_key.clone() {
            self.aggregator.offer(item).await;
            return DispatchAction::Grouped(key);
        }

        let worker = self.worker.clone();
        self.tracker.spawn(async move {
            let outcome = worker.relay(&item).await;
            debug!(message_id = item.reply_target, ?outcome, "Single relay finished");
        });
        DispatchAction::Single
    }

    /// Flush open albums and wait for every spawned relay to finish
    pub async fn shutdown(&self) {
        let pending = self.tracker.len();
        if pending > 0 {
            warn!(pending, "Waiting for in-flight relays before exit");
        }
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
