use thiserror::Error;
use yishan_algo::ModelError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no due items to review")]
    EmptyQueue,
    #[error("item {got} is not the active card (active: {expected:?})")]
    InvalidTarget {
        expected: Option<String>,
        got: String,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SessionError {
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, SessionError::EmptyQueue)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync worker is no longer running")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scheduler config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Scheduler(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read deck {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid deck: {0}")]
    Deck(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}
