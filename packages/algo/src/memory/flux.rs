//! Flux model - implicit evaluation from reaction time and interaction friction
//!
//! Works on a 0-1 weight, read as the confidence alpha/(alpha+beta) of the state;
//! never-seen items start from `initial_weight` instead. The weight picks a review
//! interval grown from the previous interval, and the half-life is then chosen so
//! that predicted recall reaches the retention target exactly at that interval.

use crate::config::SchedulerConfig;
use crate::error::ModelError;
use crate::memory::{elapsed_to_target, finalize, halflife_for_interval, MemoryModel};
use crate::sanitize::{sanitize_elapsed, sanitize_state};
use crate::types::{InteractionObservation, MemoryState, Outcome};

#[derive(Debug, Clone, Default)]
pub struct FluxModel {
    config: SchedulerConfig,
}

impl FluxModel {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Weight the next interaction builds on
    pub fn current_weight(&self, state: &MemoryState) -> f64 {
        if state.is_new() {
            self.config.flux.initial_weight
        } else {
            state.confidence()
        }
    }

    /// Interval the previous review scheduled, in minutes
    pub fn previous_interval(&self, state: &MemoryState) -> f64 {
        if state.is_new() {
            self.config.flux.initial_interval_min
        } else {
            elapsed_to_target(state.halflife, self.config.r_target)
        }
    }

    /// Longest interval the half-life bounds can express
    pub fn max_interval(&self) -> f64 {
        let c = &self.config;
        c.flux
            .max_interval_min
            .min(elapsed_to_target(c.max_halflife, c.r_target))
    }

    /// Weight after one interaction, given the current weight
    pub fn next_weight(&self, weight: f64, elapsed_ms: i64, obs: &InteractionObservation) -> f64 {
        let p = &self.config.flux;
        match obs.outcome {
            Outcome::Forgot => (weight * p.forgot_retain).max(p.forgot_floor),
            Outcome::Remembered => {
                if obs.assistance_count == 0 && elapsed_ms < p.instant_recall_ms {
                    (weight + p.instant_gain).min(1.0)
                } else if elapsed_ms < p.quick_recall_ms {
                    (weight + p.quick_gain).min(1.0)
                } else {
                    let mut penalty = 0.0;
                    if obs.assistance_count > 0 {
                        penalty += p.assistance_penalty;
                    }
                    if elapsed_ms > p.deep_friction_ms {
                        penalty += p.deep_friction_penalty;
                    }
                    (weight + p.friction_gain - penalty).clamp(p.friction_floor, 1.0)
                }
            }
        }
    }

    /// Review interval in minutes for a remembered item, grown from `base_interval`
    pub fn interval_for_weight(&self, weight: f64, base_interval: f64) -> f64 {
        let c = &self.config;
        let p = &c.flux;
        if weight < p.weak_threshold {
            p.weak_interval_min
        } else if weight < p.shaky_threshold {
            p.shaky_interval_min
        } else {
            (base_interval * p.stability_growth * (0.8 + weight)).min(self.max_interval())
        }
    }
}

impl MemoryModel for FluxModel {
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

        let weight = self.next_weight(self.current_weight(&prior), elapsed_ms, obs);
        let halflife = match obs.outcome {
            Outcome::Forgot => {
                let target = halflife_for_interval(c.flux.forgot_interval_min, c.r_target);
                target.min(prior.halflife)
            }
            Outcome::Remembered => {
                let interval = self.interval_for_weight(weight, self.previous_interval(&prior));
                halflife_for_interval(interval, c.r_target)
            }
        };

        let evidence = prior.success_weight + prior.failure_weight + 1.0;
        let alpha = weight * evidence;
        let beta = (1.0 - weight) * evidence;

        Ok(finalize(c, &prior, alpha, beta, halflife, now))
    }
}
