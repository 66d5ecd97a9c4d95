use chainscope::config::Config;
use chainscope::services::SqliteStore;
use chainscope::sources::{http_client, BlockchainInfo, SourceChain};
use chainscope::{build_router, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainscope=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("Starting Chainscope server on {}:{}", config.host, config.port);

    let store = Arc::new(SqliteStore::new(&config.database_path)?);
    info!("SQLite store opened at {}", config.database_path);

    let sources = SourceChain::from_config(&config);
    let onchain = Arc::new(BlockchainInfo::new(http_client(config.http_timeout())));
    info!("Market data chain ready with {} providers", sources.len());

    let state = AppState::new(config.clone(), store, sources, onchain);

    // Warm short histories, then keep every symbol fresh
    let warming = state.sync.bootstrap();
    if !warming.is_empty() {
        info!("Bootstrapping {} symbols in the background", warming.len());
    }
    state.sync.clone().spawn_scheduler(config.sync_interval());
    info!("Sync scheduler running every {}s", config.sync_interval().as_secs());

    let app = build_router(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Chainscope server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
