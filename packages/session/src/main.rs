use tracing::{error, info};

use yishan_session::config::AppConfig;
use yishan_session::error::ReplayError;
use yishan_session::logging::{init_tracing, LogSettings};
use yishan_session::replay::{replay, Deck, ReplayReport};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };
    let _log_guard = init_tracing(&LogSettings::from_env(config.log_level.clone()));

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: yishan-session <deck.json>");
        std::process::exit(2);
    };

    match run(&path, &config).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!(error = %err, "failed to encode report");
                std::process::exit(1);
            }
        },
        Err(err) => {
            error!(path = %path, error = %err, "replay failed");
            std::process::exit(1);
        }
    }
}

async fn run(path: &str, config: &AppConfig) -> Result<ReplayReport, ReplayError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReplayError::Read {
            path: path.to_string(),
            source,
        })?;
    let deck: Deck = serde_json::from_str(&raw)?;
    info!(
        path,
        items = deck.items.len(),
        interactions = deck.interactions.len(),
        strategy = ?config.scheduler.strategy,
        "replaying deck"
    );
    replay(deck, config).await
}
