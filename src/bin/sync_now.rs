//! One-shot sync of every symbol, for cron jobs and first runs.

use chainscope::config::Config;
use chainscope::services::SqliteStore;
use chainscope::sources::{http_client, BlockchainInfo, SourceChain};
use chainscope::AppState;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainscope=debug,sync_now=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let store = match SqliteStore::new(&config.database_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Cannot open store at {}: {}", config.database_path, e);
            return Err(e.into());
        }
    };

    let sources = SourceChain::from_config(&config);
    let onchain = Arc::new(BlockchainInfo::new(http_client(config.http_timeout())));
    let state = AppState::new(config, store, sources, onchain);

    let reports = state.sync.sync_all().await;
    for report in &reports {
        info!(
            "{}: {} fetched, {} stored, on-chain {} ({})",
            report.symbol,
            report.fetched,
            report.stored,
            report.onchain_rows,
            if report.onchain_live { "live" } else { "mock" }
        );
    }

    let total = chainscope::sources::canonical_symbols().count();
    if reports.len() < total {
        warn!("{} of {} symbols failed to sync", total - reports.len(), total);
    }
    info!("Sync complete");
    Ok(())
}
