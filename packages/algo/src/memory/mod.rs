//! Memory Model - per-item update rules and recall prediction
//!
//! Contains:
//! - [`HalfLifeModel`] - Bayesian Beta-evidence half-life model (reference)
//! - [`FluxModel`] - heuristic reaction-time / friction weight model
//! - [`MemoryStrategy`] - tagged dispatcher selected by [`SchedulerConfig::strategy`]
//!
//! Recall prediction: P(recall) = 2^(-elapsed / halflife)
//! Next due time:     elapsed_to_target = -halflife × log2(r_target)

pub mod flux;
pub mod halflife;

pub use flux::FluxModel;
pub use halflife::HalfLifeModel;

use crate::config::{SchedulerConfig, StrategyKind};
use crate::error::ModelError;
use crate::types::{InteractionObservation, MemoryState, MS_PER_MINUTE};

/// Contract shared by every scheduling strategy.
///
/// Implementations are pure: no I/O, no interior mutability, safe from any thread.
pub trait MemoryModel: Send + Sync {
    fn config(&self) -> &SchedulerConfig;

    /// Applies one completed interaction and returns the successor state.
    fn evaluate(
        &self,
        state: &MemoryState,
        obs: &InteractionObservation,
        now: i64,
    ) -> Result<MemoryState, ModelError>;

    /// Predicted recall probability in `[0, 1]`; never-seen items predict 0.
    fn predict_recall(&self, state: &MemoryState, now: i64) -> f64 {
        recall_probability(state, now)
    }
}

/// Strategy selected at configuration time
#[derive(Debug, Clone)]
pub enum MemoryStrategy {
    HalfLife(HalfLifeModel),
    Flux(FluxModel),
}

impl MemoryStrategy {
    pub fn from_config(config: SchedulerConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(match config.strategy {
            StrategyKind::HalfLife => Self::HalfLife(HalfLifeModel::new(config)),
            StrategyKind::Flux => Self::Flux(FluxModel::new(config)),
        })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::HalfLife(_) => StrategyKind::HalfLife,
            Self::Flux(_) => StrategyKind::Flux,
        }
    }
}

impl Default for MemoryStrategy {
    fn default() -> Self {
        Self::HalfLife(HalfLifeModel::default())
    }
}

impl MemoryModel for MemoryStrategy {
    fn config(&self) -> &SchedulerConfig {
        match self {
            Self::HalfLife(model) => model.config(),
            Self::Flux(model) => model.config(),
        }
    }

    fn evaluate(
        &self,
        state: &MemoryState,
        obs: &InteractionObservation,
        now: i64,
    ) -> Result<MemoryState, ModelError> {
        match self {
            Self::HalfLife(model) => model.evaluate(state, obs, now),
            Self::Flux(model) => model.evaluate(state, obs, now),
        }
    }

    fn predict_recall(&self, state: &MemoryState, now: i64) -> f64 {
        match self {
            Self::HalfLife(model) => model.predict_recall(state, now),
            Self::Flux(model) => model.predict_recall(state, now),
        }
    }
}

/// `2^(-elapsed_min / halflife)`, 0 for never-seen items
pub fn recall_probability(state: &MemoryState, now: i64) -> f64 {
    let last_seen = match state.last_seen {
        Some(ts) if state.total_exposure > 0 => ts,
        _ => return 0.0,
    };
    if !(state.halflife.is_finite() && state.halflife > 0.0) {
        return 0.0;
    }
    let elapsed_min = now.saturating_sub(last_seen).max(0) as f64 / MS_PER_MINUTE;
    (-elapsed_min / state.halflife).exp2().clamp(0.0, 1.0)
}

/// Minutes until recall decays from 1 to `r_target`
pub fn elapsed_to_target(halflife: f64, r_target: f64) -> f64 {
    -halflife * r_target.log2()
}

/// Inverse of [`elapsed_to_target`]: the half-life whose recall reaches `r_target`
/// after `interval_min` minutes
pub fn halflife_for_interval(interval_min: f64, r_target: f64) -> f64 {
    interval_min / -r_target.log2()
}

/// Shared tail of every strategy: bookkeeping plus the next due time.
pub(crate) fn finalize(
    config: &SchedulerConfig,
    prior: &MemoryState,
    success_weight: f64,
    failure_weight: f64,
    halflife: f64,
    now: i64,
) -> MemoryState {
    let halflife = config.clamp_halflife(halflife);
    let wait_ms = (elapsed_to_target(halflife, config.r_target) * MS_PER_MINUTE).round() as i64;

    MemoryState {
        success_weight: success_weight.max(config.min_success),
        failure_weight: failure_weight.max(config.min_failure),
        halflife,
        last_seen: Some(now),
        total_exposure: prior.total_exposure.saturating_add(1),
        due_at: now.saturating_add(wait_ms.max(0)),
    }
}
