//! Chainscope - crypto market signal server

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use axum::Router;
use config::Config;
use services::{
    FxService, MarketDataService, PaperTradingService, SentimentService, SignalPipeline,
    SqliteStore, SyncService, ToolsService,
};
use sources::{http_client, OnchainSource, SourceChain};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    pub market: Arc<MarketDataService>,
    pub fx: Arc<FxService>,
    pub sentiment: Arc<SentimentService>,
    pub sync: Arc<SyncService>,
    pub trading: Arc<PaperTradingService>,
    pub tools: Arc<ToolsService>,
    pub pipeline: SignalPipeline,
}

impl AppState {
    /// Wire every service around one store and one provider chain.
    pub fn new(
        config: Config,
        store: Arc<SqliteStore>,
        sources: SourceChain,
        onchain: Arc<dyn OnchainSource>,
    ) -> Self {
        let client = http_client(config.http_timeout());
        let pipeline = SignalPipeline::new(config.plan_policy());

        let market = Arc::new(MarketDataService::new(store.clone(), sources));
        let fx = Arc::new(FxService::new(
            client.clone(),
            Duration::from_secs(config.fx_cache_ttl_secs),
        ));
        let sentiment = Arc::new(SentimentService::new(
            client,
            Duration::from_secs(config.sentiment_cache_ttl_secs),
        ));
        let sync = Arc::new(SyncService::new(
            market.clone(),
            onchain,
            pipeline,
            config.bootstrap_min_candles,
        ));
        let trading = Arc::new(PaperTradingService::new(market.clone()));
        let tools = Arc::new(ToolsService::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            market,
            fx,
            sentiment,
            sync,
            trading,
            tools,
            pipeline,
        }
    }

    pub fn with_fx(mut self, fx: FxService) -> Self {
        self.fx = Arc::new(fx);
        self
    }

    pub fn with_sentiment(mut self, sentiment: SentimentService) -> Self {
        self.sentiment = Arc::new(sentiment);
        self
    }

    /// In-memory state with no reachable providers.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let config = Config {
            database_path: ":memory:".to_string(),
            ..Config::default()
        };
        let store = Arc::new(SqliteStore::new_in_memory().expect("in-memory store"));
        let onchain = sources::BlockchainInfo::with_base_url(
            http_client(Duration::from_secs(1)),
            "http://127.0.0.1:9",
        );
        Self::new(config, store, SourceChain::default(), Arc::new(onchain))
    }
}

/// Router with CORS and request tracing applied.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Re-export commonly used types
pub use types::*;
