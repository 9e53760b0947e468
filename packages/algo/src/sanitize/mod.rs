//! Numeric hygiene for memory states and observations.
//!
//! Out-of-range intermediate values are a normal part of the computation; they are
//! clamped here rather than reported.

use crate::config::SchedulerConfig;
use crate::error::ModelError;
use crate::types::MemoryState;

/// Replaces a non-finite weight with its prior and floors it at `min`
fn sanitize_weight(value: f64, prior: f64, min: f64) -> f64 {
    if value.is_finite() {
        value.max(min)
    } else {
        prior.max(min)
    }
}

/// Returns a copy of `state` whose numeric fields satisfy the model invariants.
pub fn sanitize_state(state: &MemoryState, config: &SchedulerConfig) -> MemoryState {
    let halflife = if state.halflife.is_finite() {
        config.clamp_halflife(state.halflife)
    } else {
        config.clamp_halflife(config.initial_halflife)
    };

    MemoryState {
        success_weight: sanitize_weight(
            state.success_weight,
            config.prior_success,
            config.min_success,
        ),
        failure_weight: sanitize_weight(
            state.failure_weight,
            config.prior_failure,
            config.min_failure,
        ),
        halflife,
        ..state.clone()
    }
}

/// Clamps clock-skewed elapsed times to zero, or rejects them when clamping is disabled.
pub fn sanitize_elapsed(elapsed_ms: i64, config: &SchedulerConfig) -> Result<i64, ModelError> {
    if elapsed_ms >= 0 {
        Ok(elapsed_ms)
    } else if config.clamp_negative_elapsed {
        Ok(0)
    } else {
        Err(ModelError::NegativeElapsed(elapsed_ms))
    }
}
