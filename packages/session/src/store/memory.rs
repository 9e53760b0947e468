use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use yishan_algo::MemoryState;

use super::{StateStore, StoreResult};
use crate::item::ItemId;

/// Process-local store, used by the replay tool and tests
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<ItemId, MemoryState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(states: HashMap<ItemId, MemoryState>) -> Self {
        Self {
            states: RwLock::new(states),
        }
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    /// Copy of every stored state
    pub fn snapshot(&self) -> HashMap<ItemId, MemoryState> {
        self.states.read().clone()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, item_id: &str) -> StoreResult<Option<MemoryState>> {
        Ok(self.states.read().get(item_id).cloned())
    }

    async fn batch_get(&self, item_ids: &[ItemId]) -> StoreResult<HashMap<ItemId, MemoryState>> {
        let states = self.states.read();
        Ok(item_ids
            .iter()
            .filter_map(|id| states.get(id).map(|state| (id.clone(), state.clone())))
            .collect())
    }

    async fn due_before(&self, ts: i64, limit: usize) -> StoreResult<Vec<(ItemId, MemoryState)>> {
        let states = self.states.read();
        let mut due: Vec<(ItemId, MemoryState)> = states
            .iter()
            .filter(|(_, state)| state.due_at <= ts)
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect();
        due.sort_by(|a, b| a.1.due_at.cmp(&b.1.due_at).then_with(|| a.0.cmp(&b.0)));
        due.truncate(limit);
        Ok(due)
    }

    async fn upsert(&self, item_id: &str, state: &MemoryState) -> StoreResult<()> {
        self.states.write().insert(item_id.to_string(), state.clone());
        Ok(())
    }
}
