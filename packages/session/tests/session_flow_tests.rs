//! End-to-end session flow: load due cards, review them, persist in the background.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use yishan_algo::{
    InteractionObservation, MemoryModel, MemoryState, MemoryStrategy, SchedulerConfig,
};
use yishan_session::{
    load_due_cards, InMemoryStateStore, Item, ItemId, RequeuePolicy, ReviewSession, SessionStatus,
    StateStore, StoreError, StoreResult, SyncConfig, SyncHandle, SyncState, DEFAULT_DUE_LIMIT,
};

const NOW: i64 = 1_700_000_000_000;
const DAY_MS: i64 = 86_400_000;

/// Store whose writes fail while unhealthy or until a failure budget runs out
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStateStore,
    failures_left: AtomicU32,
    down: AtomicBool,
    writes: AtomicU32,
}

impl FlakyStore {
    fn failing_times(n: u32) -> Self {
        let store = Self::default();
        store.failures_left.store(n, Ordering::SeqCst);
        store
    }

    fn offline() -> Self {
        let store = Self::default();
        store.down.store(true, Ordering::SeqCst);
        store
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn get(&self, item_id: &str) -> StoreResult<Option<MemoryState>> {
        self.inner.get(item_id).await
    }

    async fn batch_get(&self, item_ids: &[ItemId]) -> StoreResult<HashMap<ItemId, MemoryState>> {
        self.inner.batch_get(item_ids).await
    }

    async fn due_before(&self, ts: i64, limit: usize) -> StoreResult<Vec<(ItemId, MemoryState)>> {
        self.inner.due_before(ts, limit).await
    }

    async fn upsert(&self, item_id: &str, state: &MemoryState) -> StoreResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".to_string()));
        }
        let budget = self.failures_left.load(Ordering::SeqCst);
        if budget > 0 {
            self.failures_left.store(budget - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("transient".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(item_id, state).await
    }
}

fn fast_retries(max_retries: u32) -> SyncConfig {
    SyncConfig {
        max_retries,
        retry_base_ms: 2,
        retry_max_ms: 10,
    }
}

fn reviewed(halflife: f64, due_at: i64) -> MemoryState {
    MemoryState {
        success_weight: 4.0,
        failure_weight: 1.0,
        halflife,
        last_seen: Some(due_at - DAY_MS),
        total_exposure: 3,
        due_at,
    }
}

fn deck(ids: &[&str]) -> Vec<Item> {
    ids.iter().map(|id| Item::new(*id, format!("term {id}"))).collect()
}

async fn start_session(
    store: Arc<dyn StateStore>,
    items: &[Item],
    sync_config: SyncConfig,
) -> ReviewSession {
    let strategy = MemoryStrategy::default();
    let cards = load_due_cards(store.as_ref(), items, strategy.config(), NOW, DEFAULT_DUE_LIMIT)
        .await
        .unwrap();
    let sync = SyncHandle::spawn(store, sync_config);
    ReviewSession::start(strategy, cards, RequeuePolicy::Lookahead(1), sync).unwrap()
}

#[tokio::test]
async fn test_full_session_persists_every_card() {
    let store = Arc::new(InMemoryStateStore::new());
    store.upsert("overdue", &reviewed(1440.0, NOW - DAY_MS)).await.unwrap();
    store.upsert("not-yet", &reviewed(1440.0, NOW + DAY_MS)).await.unwrap();

    let items = deck(&["fresh", "overdue", "not-yet"]);
    let mut session = start_session(store.clone(), &items, SyncConfig::default()).await;

    // most overdue first, the unseen card after it, the future card never
    let order: Vec<String> = session.queue().upcoming().map(|c| c.item.id.clone()).collect();
    assert_eq!(order, vec!["overdue".to_string(), "fresh".to_string()]);

    let mut now = NOW;
    session
        .record("overdue", &InteractionObservation::forgot(9000, 2), now)
        .unwrap();
    assert_eq!(session.active().map(|c| c.id()), Some("fresh"));

    now += 4_000;
    session
        .record("fresh", &InteractionObservation::remembered(700, 0), now)
        .unwrap();
    now += 4_000;
    let last = session
        .record("overdue", &InteractionObservation::remembered(2500, 0), now)
        .unwrap();
    assert_eq!(last.status, SessionStatus::Finished);
    assert!(last.next_item.is_none());

    let summary = session.summary().clone();
    assert_eq!(summary.interactions, 3);
    assert_eq!(summary.lapsed_items, 1);

    let report = session.flush().await.unwrap();
    assert_eq!(report.remaining, 0);

    let fresh = store.get("fresh").await.unwrap().unwrap();
    assert_eq!(fresh.total_exposure, 1);
    assert!(fresh.due_at > now);

    let overdue = store.get("overdue").await.unwrap().unwrap();
    assert_eq!(overdue.total_exposure, 5);
    assert!(overdue.halflife < 1440.0);

    let untouched = store.get("not-yet").await.unwrap().unwrap();
    assert_eq!(untouched.total_exposure, 3);
}

#[tokio::test]
async fn test_transient_failures_retry_until_synced() {
    let store = Arc::new(FlakyStore::failing_times(3));
    let items = deck(&["a"]);
    let mut session = start_session(store.clone(), &items, fast_retries(10)).await;

    session
        .record("a", &InteractionObservation::remembered(1200, 0), NOW)
        .unwrap();
    assert!(session.is_finished());

    let mut status = session.subscribe_sync();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.synced_total == 1 && s.pending == 0),
    )
    .await
    .expect("sync did not recover in time")
    .unwrap();

    assert_eq!(session.sync_status().state(), SyncState::Synced);
    assert!(session.sync_status().last_error.is_none());
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert!(store.get("a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_offline_store_never_blocks_progression() {
    let store = Arc::new(FlakyStore::offline());
    let items = deck(&["a", "b", "c"]);
    let mut session = start_session(store.clone(), &items, fast_retries(2)).await;

    let mut now = NOW;
    for id in ["a", "b", "c"] {
        now += 1_000;
        session
            .record(id, &InteractionObservation::remembered(1500, 0), now)
            .unwrap();
    }
    assert!(session.is_finished());

    let mut status = session.subscribe_sync();
    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.failed == 3))
        .await
        .expect("writes were not parked")
        .unwrap();
    let parked = session.sync_status();
    assert_eq!(parked.state(), SyncState::Failing);
    assert!(parked.last_error.is_some());
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);

    store.down.store(false, Ordering::SeqCst);
    let report = session.flush().await.unwrap();
    assert_eq!(report.written, 3);
    assert_eq!(report.remaining, 0);
    assert_eq!(session.sync_status().state(), SyncState::Synced);
}

#[tokio::test]
async fn test_latest_state_wins_for_pending_item() {
    let store = Arc::new(FlakyStore::offline());
    let slow_retries = SyncConfig {
        max_retries: 5,
        retry_base_ms: 60_000,
        retry_max_ms: 60_000,
    };
    let sync = SyncHandle::spawn(store.clone(), slow_retries);
    let config = SchedulerConfig::default();

    let older = MemoryState::initial(&config, NOW);
    let newer = reviewed(2880.0, NOW + DAY_MS);
    sync.enqueue("a", older).unwrap();
    sync.enqueue("a", newer.clone()).unwrap();

    let offline = sync.flush().await.unwrap();
    assert_eq!(offline.written, 0);
    assert_eq!(offline.remaining, 1);
    assert_eq!(sync.status().state(), SyncState::Pending);

    store.down.store(false, Ordering::SeqCst);
    let report = sync.flush().await.unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("a").await.unwrap(), Some(newer));

    let final_report = sync.shutdown().await.unwrap();
    assert_eq!(final_report.remaining, 0);
}

#[tokio::test]
async fn test_newer_state_revives_parked_write() {
    let store = Arc::new(FlakyStore::offline());
    let sync = SyncHandle::spawn(store.clone(), fast_retries(2));
    let config = SchedulerConfig::default();

    sync.enqueue("a", MemoryState::initial(&config, NOW)).unwrap();
    let mut status = sync.subscribe();
    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.failed == 1))
        .await
        .expect("write was not parked")
        .unwrap();

    store.down.store(false, Ordering::SeqCst);
    let newer = reviewed(2880.0, NOW + DAY_MS);
    sync.enqueue("a", newer.clone()).unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| s.failed == 0 && s.pending == 0 && s.synced_total == 1),
    )
    .await
    .expect("parked write was not retried")
    .unwrap();

    assert_eq!(sync.status().state(), SyncState::Synced);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("a").await.unwrap(), Some(newer));
}
