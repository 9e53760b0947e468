use tokio::sync::watch;
use tracing::warn;
use yishan_algo::{InteractionObservation, MemoryStrategy};

use crate::error::{SessionError, SyncError};
use crate::item::ReviewCard;
use crate::queue::{OutcomeRecord, RequeuePolicy, SessionProgress, SessionQueue, SessionSummary};
use crate::sync::{SyncHandle, SyncReport, SyncStatus};

/// One study session wired to a memory strategy and the background syncer.
///
/// Recording an outcome only touches in-memory state; persistence happens behind
/// [`SyncHandle`] and its failures surface through [`ReviewSession::sync_status`].
pub struct ReviewSession {
    strategy: MemoryStrategy,
    queue: SessionQueue,
    sync: SyncHandle,
}

impl ReviewSession {
    pub fn start(
        strategy: MemoryStrategy,
        cards: Vec<ReviewCard>,
        policy: RequeuePolicy,
        sync: SyncHandle,
    ) -> Result<Self, SessionError> {
        let queue = SessionQueue::start(cards, policy)?;
        Ok(Self {
            strategy,
            queue,
            sync,
        })
    }

    pub fn record(
        &mut self,
        item_id: &str,
        obs: &InteractionObservation,
        now: i64,
    ) -> Result<OutcomeRecord, SessionError> {
        let record = self.queue.record_outcome(&self.strategy, item_id, obs, now)?;
        if let Err(err) = self.sync.enqueue(record.item_id.clone(), record.state.clone()) {
            warn!(item_id, error = %err, "state not handed to sync worker");
        }
        Ok(record)
    }

    pub fn active(&self) -> Option<&ReviewCard> {
        self.queue.active()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_finished()
    }

    pub fn progress(&self) -> SessionProgress {
        self.queue.progress()
    }

    pub fn summary(&self) -> &SessionSummary {
        self.queue.summary()
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn strategy(&self) -> &MemoryStrategy {
        &self.strategy
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    pub fn subscribe_sync(&self) -> watch::Receiver<SyncStatus> {
        self.sync.subscribe()
    }

    pub async fn flush(&self) -> Result<SyncReport, SyncError> {
        self.sync.flush().await
    }

    /// Consumes the session and returns the final queue.
    pub fn into_queue(self) -> SessionQueue {
        self.queue
    }
}
