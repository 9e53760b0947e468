use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("negative elapsed time {0}ms while clamping is disabled")]
    NegativeElapsed(i64),
    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),
    #[error("scheduler config parse error: {0}")]
    Serialization(#[from] serde_json::Error),
}
