use std::str::FromStr;

use yishan_algo::{SchedulerConfig, StrategyKind};

use crate::error::ConfigError;
use crate::queue::RequeuePolicy;
use crate::store::DEFAULT_DUE_LIMIT;
use crate::sync::SyncConfig;

/// Host-side settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub scheduler: SchedulerConfig,
    pub requeue: RequeuePolicy,
    pub due_limit: usize,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            scheduler: SchedulerConfig::default(),
            requeue: RequeuePolicy::default(),
            due_limit: DEFAULT_DUE_LIMIT,
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// Unparseable values fall back to defaults. A scheduler config file that cannot
    /// be read or does not validate is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut scheduler = match lookup("YISHAN_SCHEDULER_CONFIG") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                SchedulerConfig::from_json_str(&raw)?
            }
            None => defaults.scheduler,
        };

        if let Some(kind) = lookup("YISHAN_STRATEGY").and_then(|v| StrategyKind::parse(&v)) {
            scheduler.strategy = kind;
        }
        if let Some(r_target) = parse_var(&lookup, "YISHAN_R_TARGET") {
            scheduler.r_target = r_target;
        }
        if let Some(penalty) = parse_var(&lookup, "YISHAN_ASSISTANCE_PENALTY") {
            scheduler.assistance_penalty = penalty;
        }
        scheduler.validate()?;

        let requeue = lookup("YISHAN_REQUEUE")
            .and_then(|v| RequeuePolicy::parse(&v))
            .unwrap_or(defaults.requeue);

        let due_limit = parse_var(&lookup, "YISHAN_DUE_LIMIT")
            .filter(|limit: &usize| *limit > 0)
            .unwrap_or(defaults.due_limit);

        let sync = SyncConfig {
            max_retries: parse_var(&lookup, "YISHAN_SYNC_MAX_RETRIES")
                .unwrap_or(defaults.sync.max_retries),
            retry_base_ms: parse_var(&lookup, "YISHAN_SYNC_RETRY_BASE_MS")
                .unwrap_or(defaults.sync.retry_base_ms),
            retry_max_ms: parse_var(&lookup, "YISHAN_SYNC_RETRY_MAX_MS")
                .unwrap_or(defaults.sync.retry_max_ms),
        };

        Ok(Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            scheduler,
            requeue,
            due_limit,
            sync,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|value| value.trim().parse().ok())
}
