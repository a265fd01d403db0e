//! Live feed of newly committed records.

use shared_types::SharedStateRecord;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

/// Maximum updates buffered per tracker before the oldest are dropped.
pub const UPDATE_CHANNEL_CAPACITY: usize = 1024;

/// Subscription to a store's commits. Only new inserts are emitted; idempotent
/// re-commits are not.
pub struct StateUpdates {
    receiver: broadcast::Receiver<SharedStateRecord>,
}

impl StateUpdates {
    pub(crate) fn new(receiver: broadcast::Receiver<SharedStateRecord>) -> Self {
        Self { receiver }
    }

    /// Next committed record, or `None` once the store is dropped.
    pub async fn recv(&mut self) -> Option<SharedStateRecord> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => return Some(record),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Tracker lagged, some updates dropped");
                }
            }
        }
    }

    /// Adapt into a `Stream`, skipping lag notifications.
    pub fn into_stream(self) -> impl Stream<Item = SharedStateRecord> {
        BroadcastStream::new(self.receiver).filter_map(|item| item.ok())
    }
}
