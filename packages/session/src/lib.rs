//! # yishan-session - study sessions on top of the scheduling core
//!
//! Drives one review session over due cards, persists updated memory states in the
//! background and hosts the ambient plumbing (configuration, logging, replay tool).
//!
//! - [`queue`] - in-session ordering, requeue on lapse, progress
//! - [`review`] - session plus background sync in one handle
//! - [`store`] - `StateStore` boundary and due-card loading
//! - [`sync`] - retrying write-behind worker with a passive status
//! - [`replay`] - offline replay of recorded interaction logs

pub mod config;
pub mod error;
pub mod item;
pub mod logging;
pub mod queue;
pub mod replay;
pub mod review;
pub mod store;
pub mod sync;

pub use config::AppConfig;
pub use error::{ConfigError, ReplayError, SessionError, StoreError, SyncError};
pub use item::{Item, ItemId, ReviewCard};
pub use queue::{
    OutcomeRecord, RequeuePolicy, SessionProgress, SessionQueue, SessionStatus, SessionSummary,
};
pub use review::ReviewSession;
pub use store::{load_due_cards, InMemoryStateStore, StateStore, StoreResult, DEFAULT_DUE_LIMIT};
pub use sync::{SyncConfig, SyncHandle, SyncReport, SyncState, SyncStatus};
