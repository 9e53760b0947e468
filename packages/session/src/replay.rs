//! Offline replay of a recorded study session against the in-memory store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use yishan_algo::{
    compute_stats, stage_distribution, CollectionStats, InteractionObservation, MemoryModel,
    MemoryState, MemoryStrategy, Outcome, StageDistribution,
};

use crate::config::AppConfig;
use crate::error::ReplayError;
use crate::item::{Item, ItemId};
use crate::queue::{SessionProgress, SessionSummary};
use crate::review::ReviewSession;
use crate::store::{load_due_cards, InMemoryStateStore};
use crate::sync::{SyncHandle, SyncReport};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub items: Vec<Item>,
    #[serde(default)]
    pub states: HashMap<ItemId, MemoryState>,
    #[serde(default)]
    pub interactions: Vec<ReplayInteraction>,
    /// Session start; defaults to the first interaction, then the wall clock
    #[serde(default)]
    pub now: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayInteraction {
    pub item_id: ItemId,
    pub elapsed_ms: i64,
    #[serde(default)]
    pub assistance_count: u32,
    pub outcome: Outcome,
    pub at: i64,
}

impl ReplayInteraction {
    fn observation(&self) -> InteractionObservation {
        InteractionObservation {
            elapsed_ms: self.elapsed_ms,
            assistance_count: self.assistance_count,
            outcome: self.outcome,
        }
    }
}

/// Interaction that ended the replay early
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStop {
    pub index: usize,
    pub item_id: ItemId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub strategy: String,
    pub started_at: i64,
    pub due_cards: usize,
    pub states: BTreeMap<ItemId, MemoryState>,
    pub summary: SessionSummary,
    pub progress: Option<SessionProgress>,
    pub stats: CollectionStats,
    pub distribution: StageDistribution,
    pub sync: SyncReport,
    pub stopped: Option<ReplayStop>,
}

pub async fn replay(deck: Deck, config: &AppConfig) -> Result<ReplayReport, ReplayError> {
    let strategy = MemoryStrategy::from_config(config.scheduler.clone())?;
    let started_at = deck
        .now
        .or_else(|| deck.interactions.first().map(|i| i.at))
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    let store = Arc::new(InMemoryStateStore::with_states(deck.states));
    let cards = load_due_cards(
        store.as_ref(),
        &deck.items,
        strategy.config(),
        started_at,
        config.due_limit,
    )
    .await?;
    let due_cards = cards.len();

    let sync = SyncHandle::spawn(store.clone(), config.sync.clone());
    let mut summary = SessionSummary::default();
    let mut progress = None;
    let mut stopped = None;
    let mut finished_at = started_at;

    match ReviewSession::start(strategy.clone(), cards, config.requeue, sync.clone()) {
        Ok(mut session) => {
            for (index, interaction) in deck.interactions.iter().enumerate() {
                if let Err(err) =
                    session.record(&interaction.item_id, &interaction.observation(), interaction.at)
                {
                    warn!(index, item_id = %interaction.item_id, error = %err, "replay stopped");
                    stopped = Some(ReplayStop {
                        index,
                        item_id: interaction.item_id.clone(),
                        reason: err.to_string(),
                    });
                    break;
                }
                finished_at = finished_at.max(interaction.at);
            }
            summary = session.summary().clone();
            progress = Some(session.progress());
        }
        Err(err) if err.is_empty_queue() => {
            info!(items = deck.items.len(), "nothing due, replay skipped");
        }
        Err(err) => return Err(err.into()),
    }

    let sync_report = sync.shutdown().await?;
    let states: BTreeMap<ItemId, MemoryState> = store.snapshot().into_iter().collect();
    let all: Vec<MemoryState> = states.values().cloned().collect();

    Ok(ReplayReport {
        strategy: format!("{:?}", strategy.kind()),
        started_at,
        due_cards,
        stats: compute_stats(&strategy, &all, finished_at),
        distribution: stage_distribution(&all, strategy.config()),
        states,
        summary,
        progress,
        sync: sync_report,
        stopped,
    })
}
