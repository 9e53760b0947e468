//! Session queue - ordered presentation of due cards for one review session
//!
//! Remembered cards are completed and leave the queue; forgotten cards are requeued
//! a few positions later so they are seen again before the session can finish.
//! Active -> Finished is the only status transition.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use yishan_algo::{InteractionObservation, MemoryModel, MemoryState, Outcome};

use crate::error::SessionError;
use crate::item::{ItemId, ReviewCard};

const DEFAULT_LOOKAHEAD: usize = 3;

/// Where a forgotten card goes back into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequeuePolicy {
    MoveToEnd,
    /// Re-present after at most this many other cards
    Lookahead(usize),
}

impl Default for RequeuePolicy {
    fn default() -> Self {
        Self::Lookahead(DEFAULT_LOOKAHEAD)
    }
}

impl RequeuePolicy {
    /// Accepts `end` or `lookahead:N` with `N >= 1`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        if value == "end" {
            return Some(Self::MoveToEnd);
        }
        let offset = value.strip_prefix("lookahead:")?.parse::<usize>().ok()?;
        (offset > 0).then_some(Self::Lookahead(offset))
    }

    fn insert_position(self, remaining: usize) -> usize {
        match self {
            Self::MoveToEnd => remaining,
            Self::Lookahead(offset) => offset.max(1).min(remaining),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub interactions: usize,
    pub remembered: usize,
    pub forgot: usize,
    /// Distinct cards forgotten at least once
    pub lapsed_items: usize,
}

/// Result of one recorded interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub item_id: ItemId,
    pub outcome: Outcome,
    pub state: MemoryState,
    pub status: SessionStatus,
    pub next_item: Option<ItemId>,
}

#[derive(Debug, Clone)]
pub struct SessionQueue {
    cards: Vec<ReviewCard>,
    /// Indices into `cards`; the front is the active card
    pending: VecDeque<usize>,
    completed: HashSet<ItemId>,
    lapsed: HashSet<ItemId>,
    policy: RequeuePolicy,
    summary: SessionSummary,
}

impl SessionQueue {
    /// Starts a session over `cards` in the given order. Repeated ids keep their first
    /// occurrence.
    pub fn start(cards: Vec<ReviewCard>, policy: RequeuePolicy) -> Result<Self, SessionError> {
        let mut seen: HashMap<ItemId, usize> = HashMap::with_capacity(cards.len());
        let mut unique = Vec::with_capacity(cards.len());
        for card in cards {
            if seen.contains_key(card.id()) {
                continue;
            }
            seen.insert(card.item.id.clone(), unique.len());
            unique.push(card);
        }

        if unique.is_empty() {
            return Err(SessionError::EmptyQueue);
        }

        info!(cards = unique.len(), ?policy, "review session started");

        Ok(Self {
            pending: (0..unique.len()).collect(),
            cards: unique,
            completed: HashSet::new(),
            lapsed: HashSet::new(),
            policy,
            summary: SessionSummary::default(),
        })
    }

    pub fn active(&self) -> Option<&ReviewCard> {
        self.pending.front().map(|&idx| &self.cards[idx])
    }

    pub fn status(&self) -> SessionStatus {
        if self.pending.is_empty() {
            SessionStatus::Finished
        } else {
            SessionStatus::Active
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status() == SessionStatus::Finished
    }

    pub fn completed(&self) -> &HashSet<ItemId> {
        &self.completed
    }

    /// Every card of the session in original order, with its latest state
    pub fn cards(&self) -> &[ReviewCard] {
        &self.cards
    }

    /// Cards still to be presented, active card first
    pub fn upcoming(&self) -> impl Iterator<Item = &ReviewCard> + '_ {
        self.pending.iter().map(|&idx| &self.cards[idx])
    }

    pub fn policy(&self) -> RequeuePolicy {
        self.policy
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn progress(&self) -> SessionProgress {
        let total = self.cards.len();
        let completed = self.completed.len();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round().min(100.0) as u32
        };
        SessionProgress {
            completed,
            total,
            percent,
        }
    }

    /// Applies the learner's judgment of the active card.
    ///
    /// `item_id` must be the active card; anything else is a caller bug and leaves the
    /// queue untouched.
    pub fn record_outcome<M>(
        &mut self,
        model: &M,
        item_id: &str,
        obs: &InteractionObservation,
        now: i64,
    ) -> Result<OutcomeRecord, SessionError>
    where
        M: MemoryModel + ?Sized,
    {
        let active = match self.pending.front() {
            Some(&idx) if self.cards[idx].id() == item_id => idx,
            front => {
                return Err(SessionError::InvalidTarget {
                    expected: front.map(|&idx| self.cards[idx].item.id.clone()),
                    got: item_id.to_string(),
                })
            }
        };

        let state = model.evaluate(&self.cards[active].state, obs, now)?;
        self.cards[active].state = state.clone();
        self.pending.pop_front();
        self.summary.interactions += 1;

        match obs.outcome {
            Outcome::Remembered => {
                self.completed.insert(item_id.to_string());
                self.summary.remembered += 1;
            }
            Outcome::Forgot => {
                let at = self.policy.insert_position(self.pending.len());
                self.pending.insert(at, active);
                if self.lapsed.insert(item_id.to_string()) {
                    self.summary.lapsed_items += 1;
                }
                self.summary.forgot += 1;
            }
        }

        let status = self.status();
        let next_item = self.active().map(|card| card.item.id.clone());

        debug!(
            item_id,
            outcome = obs.outcome.as_str(),
            halflife = state.halflife,
            due_at = state.due_at,
            next = next_item.as_deref().unwrap_or("-"),
            "outcome recorded"
        );
        if status == SessionStatus::Finished {
            info!(
                interactions = self.summary.interactions,
                forgot = self.summary.forgot,
                "review session finished"
            );
        }

        Ok(OutcomeRecord {
            item_id: item_id.to_string(),
            outcome: obs.outcome,
            state,
            status,
            next_item,
        })
    }
}
