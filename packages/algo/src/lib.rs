//! # yishan-algo - adaptive review scheduling core
//!
//! Pure per-item memory model for vocabulary review:
//!
//! - **Half-life model** - Beta-evidence (alpha/beta) weights with a recall half-life;
//!   fast unaided recall grows the half-life, lapses contract it sharply
//! - **Flux model** - heuristic weight driven by reaction time and interaction friction,
//!   expressed on the same state record
//! - **Recall prediction** - P(recall) = 2^(-elapsed / halflife)
//! - **Reporting** - derived stages, dashboard counters and stage distribution
//!
//! ## Module layout
//!
//! - [`memory`] - `MemoryModel` contract, strategies and the shared due-time rule
//! - [`config`] - `SchedulerConfig`, every tunable constant with defaults
//! - [`stats`] - collection statistics (parallel)
//! - [`sanitize`] - numeric clamping of states and observations
//! - [`types`] - state, observation, outcome and stage types
//!
//! ## Example
//!
//! ```rust
//! use yishan_algo::{InteractionObservation, MemoryModel, MemoryState, MemoryStrategy, SchedulerConfig};
//!
//! let now = 1_700_000_000_000;
//! let model = MemoryStrategy::from_config(SchedulerConfig::default()).unwrap();
//! let state = MemoryState::initial(model.config(), now);
//! let next = model
//!     .evaluate(&state, &InteractionObservation::remembered(800, 0), now)
//!     .unwrap();
//! assert!(next.due_at > now);
//! assert_eq!(next.total_exposure, 1);
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod sanitize;
pub mod stats;
pub mod types;

pub use config::{FluxParams, SchedulerConfig, StrategyKind};
pub use error::ModelError;
pub use memory::{
    elapsed_to_target, recall_probability, FluxModel, HalfLifeModel, MemoryModel, MemoryStrategy,
};
pub use stats::{
    batch_predict_recall, compute_stats, stage_distribution, CollectionStats, StageDistribution,
};
pub use types::*;
