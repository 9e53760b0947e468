//! Half-life model - Bayesian evidence scheduling
//!
//! alpha/beta accumulate evidence of recall and forgetting; their ratio
//! (confidence) drives how fast the half-life grows after a success.
//!
//! Forgot:
//! - beta' = beta + 1
//! - alpha' = max(min_success, alpha × decay_on_fail)
//! - h' = max(min_halflife, h × fail_halflife_shrink)
//!
//! Remembered:
//! - bonus = clamp(1 - elapsed / fast_window, 0, bonus_max)
//! - penalty = assists × assistance_penalty + [elapsed > slow_threshold] × slow_penalty
//! - alpha' = max(min_success, alpha + 1 + bonus - penalty)
//! - h' = min(max_halflife, h × (1 + alpha'/(alpha'+beta') × growth_scale))

use crate::config::SchedulerConfig;
use crate::error::ModelError;
use crate::memory::{finalize, MemoryModel};
use crate::sanitize::{sanitize_elapsed, sanitize_state};
use crate::types::{InteractionObservation, MemoryState, Outcome};

#[derive(Debug, Clone, Default)]
pub struct HalfLifeModel {
    config: SchedulerConfig,
}

impl HalfLifeModel {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Reward for fast recall, in `[0, reaction_bonus_max]`
    pub fn reaction_bonus(&self, elapsed_ms: i64) -> f64 {
        let c = &self.config;
        (1.0 - elapsed_ms as f64 / c.fast_recall_window_ms).clamp(0.0, c.reaction_bonus_max)
    }

    /// Penalty for assisted or slow recall
    pub fn help_penalty(&self, elapsed_ms: i64, assistance_count: u32) -> f64 {
        let c = &self.config;
        let mut penalty = f64::from(assistance_count) * c.assistance_penalty;
        if elapsed_ms > c.slow_recall_threshold_ms {
            penalty += c.slow_recall_penalty;
        }
        penalty
    }
}

impl MemoryModel for HalfLifeModel {
    fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn evaluate(
        &self,
        state: &MemoryState,
        obs: &InteractionObservation,
        now: i64,
    ) -> Result<MemoryState, ModelError> {
        let c = &self.config;
        let elapsed_ms = sanitize_elapsed(obs.elapsed_ms, c)?;
        let prior = sanitize_state(state, c);

        let (alpha, beta, halflife) = match obs.outcome {
            Outcome::Forgot => (
                (prior.success_weight * c.decay_on_fail).max(c.min_success),
                prior.failure_weight + 1.0,
                (prior.halflife * c.fail_halflife_shrink).max(c.min_halflife),
            ),
            Outcome::Remembered => {
                let bonus = self.reaction_bonus(elapsed_ms);
                let penalty = self.help_penalty(elapsed_ms, obs.assistance_count);
                let alpha = (prior.success_weight + 1.0 + bonus - penalty).max(c.min_success);
                let beta = prior.failure_weight;
                let confidence = alpha / (alpha + beta);
                let growth = 1.0 + confidence * c.growth_scale;
                (alpha, beta, (prior.halflife * growth).min(c.max_halflife))
            }
        };

        Ok(finalize(c, &prior, alpha, beta, halflife, now))
    }
}
