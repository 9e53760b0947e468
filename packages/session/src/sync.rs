//! Background persistence of memory states
//!
//! Session progression never waits on the store: states are handed to a worker task
//! that writes them, retries failures with exponential backoff and publishes a passive
//! status for the UI. The latest state per item wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use yishan_algo::MemoryState;

use crate::error::SyncError;
use crate::item::ItemId;
use crate::store::StateStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Attempts before a write is parked until the next flush
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_base_ms: 500,
            retry_max_ms: 30_000,
        }
    }
}

impl SyncConfig {
    fn backoff(&self, attempts: u32) -> Duration {
        let shift = attempts.saturating_sub(1).min(20);
        let ms = self
            .retry_base_ms
            .saturating_mul(1u64 << shift)
            .min(self.retry_max_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    Synced,
    Pending,
    Failing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Writes waiting for (another) attempt
    pub pending: usize,
    /// Writes that exhausted their retries
    pub failed: usize,
    pub synced_total: u64,
    pub last_error: Option<String>,
    pub last_synced_at: Option<i64>,
}

impl SyncStatus {
    pub fn state(&self) -> SyncState {
        if self.failed > 0 {
            SyncState::Failing
        } else if self.pending > 0 {
            SyncState::Pending
        } else {
            SyncState::Synced
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub written: usize,
    pub remaining: usize,
}

enum SyncCommand {
    Upsert { item_id: ItemId, state: MemoryState },
    Flush(oneshot::Sender<SyncReport>),
    Shutdown(oneshot::Sender<SyncReport>),
}

/// Cheap handle to the sync worker
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncCommand>,
    status: watch::Receiver<SyncStatus>,
}

impl SyncHandle {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn<S>(store: Arc<S>, config: SyncConfig) -> Self
    where
        S: StateStore + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SyncStatus::default());
        let worker = SyncWorker {
            store,
            config,
            pending: HashMap::new(),
            status_tx,
            synced_total: 0,
            last_error: None,
            last_synced_at: None,
        };
        tokio::spawn(worker.run(rx));
        Self { tx, status }
    }

    /// Hands a state to the worker without waiting for the write.
    pub fn enqueue(&self, item_id: impl Into<ItemId>, state: MemoryState) -> Result<(), SyncError> {
        self.tx
            .send(SyncCommand::Upsert {
                item_id: item_id.into(),
                state,
            })
            .map_err(|_| SyncError::Closed)
    }

    /// Attempts every outstanding write now, including parked ones.
    pub async fn flush(&self) -> Result<SyncReport, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SyncCommand::Flush(reply_tx))
            .map_err(|_| SyncError::Closed)?;
        reply_rx.await.map_err(|_| SyncError::Closed)
    }

    /// Final flush, then stops the worker.
    pub async fn shutdown(self) -> Result<SyncReport, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SyncCommand::Shutdown(reply_tx))
            .map_err(|_| SyncError::Closed)?;
        reply_rx.await.map_err(|_| SyncError::Closed)
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }
}

/// Sleeps until the next backoff deadline; never completes when nothing is waiting.
async fn wait_for_retry(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

struct PendingWrite {
    state: MemoryState,
    attempts: u32,
    next_attempt: Instant,
    parked: bool,
}

struct SyncWorker<S: ?Sized> {
    store: Arc<S>,
    config: SyncConfig,
    pending: HashMap<ItemId, PendingWrite>,
    status_tx: watch::Sender<SyncStatus>,
    synced_total: u64,
    last_error: Option<String>,
    last_synced_at: Option<i64>,
}

impl<S> SyncWorker<S>
where
    S: StateStore + ?Sized,
{
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SyncCommand>) {
        loop {
            let next_retry = self.next_retry_at();

            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(SyncCommand::Upsert { item_id, state }) => {
                        self.pending.insert(
                            item_id,
                            PendingWrite {
                                state,
                                attempts: 0,
                                next_attempt: Instant::now(),
                                parked: false,
                            },
                        );
                        self.attempt(false).await;
                    }
                    Some(SyncCommand::Flush(reply)) => {
                        let report = self.attempt(true).await;
                        self.publish();
                        let _ = reply.send(report);
                    }
                    Some(SyncCommand::Shutdown(reply)) => {
                        let report = self.attempt(true).await;
                        self.publish();
                        let _ = reply.send(report);
                        debug!("sync worker stopped");
                        return;
                    }
                    None => {
                        self.attempt(true).await;
                        self.publish();
                        debug!("sync handles dropped, worker stopped");
                        return;
                    }
                },
                _ = wait_for_retry(next_retry) => {
                    self.attempt(false).await;
                }
            }

            self.publish();
        }
    }

    fn next_retry_at(&self) -> Option<Instant> {
        self.pending
            .values()
            .filter(|write| !write.parked)
            .map(|write| write.next_attempt)
            .min()
    }

    /// Writes every ready entry; `force` also includes parked and backing-off entries.
    async fn attempt(&mut self, force: bool) -> SyncReport {
        let now = Instant::now();
        let ready: Vec<ItemId> = self
            .pending
            .iter()
            .filter(|(_, write)| force || (!write.parked && write.next_attempt <= now))
            .map(|(id, _)| id.clone())
            .collect();

        let mut written = 0;
        for item_id in ready {
            let state = match self.pending.get(&item_id) {
                Some(write) => write.state.clone(),
                None => continue,
            };

            match self.store.upsert(&item_id, &state).await {
                Ok(()) => {
                    let recovered = self
                        .pending
                        .remove(&item_id)
                        .map(|write| write.attempts > 0)
                        .unwrap_or(false);
                    if recovered {
                        info!(item_id = %item_id, "state write recovered");
                    }
                    written += 1;
                    self.synced_total += 1;
                    self.last_synced_at = Some(Utc::now().timestamp_millis());
                }
                Err(err) => {
                    let max_retries = self.config.max_retries;
                    let Some(write) = self.pending.get_mut(&item_id) else {
                        continue;
                    };
                    write.attempts = write.attempts.saturating_add(1);
                    write.next_attempt = Instant::now() + self.config.backoff(write.attempts);
                    if write.attempts >= max_retries && !write.parked {
                        write.parked = true;
                        warn!(
                            item_id = %item_id,
                            attempts = write.attempts,
                            error = %err,
                            "state write parked after exhausting retries"
                        );
                    } else {
                        warn!(
                            item_id = %item_id,
                            attempts = write.attempts,
                            error = %err,
                            "state write failed, will retry"
                        );
                    }
                    self.last_error = Some(err.to_string());
                }
            }
        }

        if self.pending.is_empty() {
            self.last_error = None;
        }

        SyncReport {
            written,
            remaining: self.pending.len(),
        }
    }

    fn publish(&self) {
        let failed = self.pending.values().filter(|write| write.parked).count();
        let status = SyncStatus {
            pending: self.pending.len() - failed,
            failed,
            synced_total: self.synced_total,
            last_error: self.last_error.clone(),
            last_synced_at: self.last_synced_at,
        };
        self.status_tx.send_replace(status);
    }
}
