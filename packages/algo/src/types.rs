//! Common Types and Constants
//!
//! Shared data structures used across the memory model modules.
//! Timestamps are Unix epoch milliseconds; half-lives are minutes.

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;

// ==================== Constants ====================

/// Milliseconds per minute
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Memory State ====================

/// Per-item memory record owned by the scheduler.
///
/// Created once when an item enters the collection and replaced (never mutated in place)
/// by every evaluated interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Accumulated evidence of successful recall (alpha), always > 0
    pub success_weight: f64,
    /// Accumulated evidence of forgetting (beta), always > 0
    pub failure_weight: f64,
    /// Minutes until predicted recall decays to 0.5
    pub halflife: f64,
    /// Last interaction timestamp, `None` if never seen
    #[serde(default)]
    pub last_seen: Option<i64>,
    /// Completed interaction count
    #[serde(default)]
    pub total_exposure: u32,
    /// When the item should next be surfaced
    pub due_at: i64,
}

impl MemoryState {
    /// Fresh state for an item that just entered the collection: priors, never seen,
    /// immediately due.
    pub fn initial(config: &SchedulerConfig, now: i64) -> Self {
        Self {
            success_weight: config.prior_success,
            failure_weight: config.prior_failure,
            halflife: config.initial_halflife,
            last_seen: None,
            total_exposure: 0,
            due_at: now,
        }
    }

    /// Beta-distribution point estimate `alpha / (alpha + beta)`
    pub fn confidence(&self) -> f64 {
        let total = self.success_weight + self.failure_weight;
        if total <= EPSILON {
            return 0.0;
        }
        (self.success_weight / total).clamp(0.0, 1.0)
    }

    pub fn is_new(&self) -> bool {
        self.total_exposure == 0 || self.last_seen.is_none()
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.is_new() || now >= self.due_at
    }

    /// Derived classification, recomputed from `halflife` on every call.
    pub fn stage(&self, config: &SchedulerConfig) -> Stage {
        if self.is_new() {
            Stage::New
        } else if self.halflife > config.stabilized_halflife {
            Stage::Stabilized
        } else {
            Stage::Learning
        }
    }
}

// ==================== Interaction ====================

/// Learner's judgment of a presented card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Remembered,
    Forgot,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Remembered => "remembered",
            Outcome::Forgot => "forgot",
        }
    }

    pub fn is_remembered(self) -> bool {
        matches!(self, Outcome::Remembered)
    }
}

/// One presentation observed by the UI; consumed exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionObservation {
    /// Presentation to judgment, milliseconds (may be negative under clock skew)
    pub elapsed_ms: i64,
    /// Supplementary help requests (revealed detail, played pronunciation)
    #[serde(default)]
    pub assistance_count: u32,
    pub outcome: Outcome,
}

impl InteractionObservation {
    pub fn remembered(elapsed_ms: i64, assistance_count: u32) -> Self {
        Self {
            elapsed_ms,
            assistance_count,
            outcome: Outcome::Remembered,
        }
    }

    pub fn forgot(elapsed_ms: i64, assistance_count: u32) -> Self {
        Self {
            elapsed_ms,
            assistance_count,
            outcome: Outcome::Forgot,
        }
    }
}

// ==================== Classification ====================

/// Per-item learning stage, derived from `halflife` and `total_exposure`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    New,
    Learning,
    Stabilized,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Learning => "learning",
            Stage::Stabilized => "stabilized",
        }
    }
}
