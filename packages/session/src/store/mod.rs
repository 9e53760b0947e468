//! State store boundary
//!
//! The scheduler never owns persistence; it talks to any backend implementing
//! [`StateStore`]. Failures are retryable and never fatal to an in-memory session.

mod memory;

pub use memory::InMemoryStateStore;

use std::collections::HashMap;

use async_trait::async_trait;
use yishan_algo::{MemoryState, SchedulerConfig};

use crate::error::StoreError;
use crate::item::{Item, ItemId, ReviewCard};

pub type StoreResult<T> = Result<T, StoreError>;

/// Batch size used when fetching states for a deck
pub const MAX_BATCH_SIZE: usize = 500;

/// Default cap on cards pulled into one study session
pub const DEFAULT_DUE_LIMIT: usize = 50;

/// Persists memory states keyed by item id
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, item_id: &str) -> StoreResult<Option<MemoryState>>;

    /// States for the requested ids that exist; missing ids are absent from the map
    async fn batch_get(&self, item_ids: &[ItemId]) -> StoreResult<HashMap<ItemId, MemoryState>>;

    /// States with `due_at <= ts`, due-ascending, at most `limit`
    async fn due_before(&self, ts: i64, limit: usize) -> StoreResult<Vec<(ItemId, MemoryState)>>;

    async fn upsert(&self, item_id: &str, state: &MemoryState) -> StoreResult<()>;
}

/// Joins content items with their stored states and returns the due cards, most
/// overdue first. Items without a stored state enter the collection now and are due
/// immediately.
pub async fn load_due_cards<S>(
    store: &S,
    items: &[Item],
    config: &SchedulerConfig,
    now: i64,
    limit: usize,
) -> StoreResult<Vec<ReviewCard>>
where
    S: StateStore + ?Sized,
{
    let mut cards = Vec::new();

    for chunk in items.chunks(MAX_BATCH_SIZE) {
        let ids: Vec<ItemId> = chunk.iter().map(|item| item.id.clone()).collect();
        let mut states = store.batch_get(&ids).await?;
        for item in chunk {
            let state = states
                .remove(&item.id)
                .unwrap_or_else(|| MemoryState::initial(config, now));
            if state.is_due(now) {
                cards.push(ReviewCard::new(item.clone(), state));
            }
        }
    }

    cards.sort_by_key(|card| card.state.due_at);
    cards.truncate(limit);
    Ok(cards)
}
