//! Periodic refresh of candles, on-chain rows and derived signals.

use super::market_data::MarketDataService;
use crate::error::{AppError, Result};
use crate::services::signals::SignalPipeline;
use crate::sources::{canonical_symbols, generate_mock, mock_seed, OnchainSource};
use crate::types::{LevelMethod, OnchainRow, ProbabilitySnapshot, Timeframe};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Daily candles pulled on every sync.
pub const SYNC_DAYS: usize = 90;
/// Daily candles pulled when warming an empty store.
pub const BOOTSTRAP_DAYS: usize = 120;
/// Longest on-chain window requested from live providers.
const MAX_ONCHAIN_DAYS: usize = 180;
pub const DAILY_HORIZON: &str = "1d";

/// Result of syncing one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub symbol: String,
    pub fetched: usize,
    pub stored: usize,
    /// Timestamp the derived rows are keyed by.
    pub ts: Option<i64>,
    pub onchain_rows: usize,
    pub onchain_live: bool,
    pub probability: Option<ProbabilitySnapshot>,
}

pub struct SyncService {
    market: Arc<MarketDataService>,
    onchain: Arc<dyn OnchainSource>,
    pipeline: SignalPipeline,
    bootstrap_min: usize,
}

impl SyncService {
    pub fn new(
        market: Arc<MarketDataService>,
        onchain: Arc<dyn OnchainSource>,
        pipeline: SignalPipeline,
        bootstrap_min: usize,
    ) -> Self {
        Self {
            market,
            onchain,
            pipeline,
            bootstrap_min,
        }
    }

    /// Refresh one canonical symbol and persist levels, on-chain rows and the
    /// daily probability for its newest candle.
    pub async fn sync_symbol(&self, symbol: &str) -> Result<SyncReport> {
        let store = self.market.store();
        let fetched = self
            .market
            .sources()
            .fetch_candles(symbol, Timeframe::OneDay, SYNC_DAYS)
            .await
            .map_err(|e| AppError::ExternalApi(e.to_string()))?;
        store.upsert_candles(symbol, Timeframe::OneDay, &fetched)?;

        let rows = store.candles(symbol, Timeframe::OneDay)?;
        let mut report = SyncReport {
            symbol: symbol.to_string(),
            fetched: fetched.len(),
            stored: rows.len(),
            ts: None,
            onchain_rows: 0,
            onchain_live: false,
            probability: None,
        };
        let Some(latest) = rows.last() else {
            return Ok(report);
        };

        let ts_list: Vec<i64> = rows.iter().map(|c| c.ts).collect();
        let (onchain, live) = self.onchain_rows(symbol, &ts_list).await;
        store.upsert_onchain(symbol, &onchain)?;

        let snapshot = self.pipeline.run(&rows, Some(onchain.as_slice()));
        for method in LevelMethod::ALL {
            let bands = match method {
                LevelMethod::Pivot => &snapshot.pivot,
                LevelMethod::Swing => &snapshot.swing,
                LevelMethod::Vbp => &snapshot.vbp,
            };
            store.insert_levels(symbol, latest.ts, method, bands)?;
        }
        store.upsert_probability(symbol, latest.ts, DAILY_HORIZON, &snapshot.probability)?;

        info!(
            "Synced {}: {} candles, p_up={:.2} ({})",
            symbol,
            rows.len(),
            snapshot.probability.p_up,
            snapshot.probability.verdict.as_str()
        );

        report.ts = Some(latest.ts);
        report.onchain_rows = onchain.len();
        report.onchain_live = live;
        report.probability = Some(snapshot.probability);
        Ok(report)
    }

    /// Live rows when the provider covers the symbol, else the deterministic mock.
    async fn onchain_rows(&self, symbol: &str, ts_list: &[i64]) -> (Vec<OnchainRow>, bool) {
        if self.onchain.supports(symbol) {
            let days = ts_list.len().min(MAX_ONCHAIN_DAYS);
            match self.onchain.fetch_daily(symbol, days).await {
                Ok(rows) if !rows.is_empty() => return (rows, true),
                Ok(_) => warn!("on-chain provider returned nothing for {}, using mock", symbol),
                Err(e) => warn!("on-chain fetch failed for {}: {}, using mock", symbol, e),
            }
        }
        (generate_mock(ts_list, mock_seed(symbol)), false)
    }

    /// Fill on-chain rows straight from the live provider. Returns rows stored,
    /// zero when the provider does not cover the symbol.
    pub async fn backfill_onchain(&self, symbol: &str, days: usize) -> Result<usize> {
        if !self.onchain.supports(symbol) {
            return Ok(0);
        }
        let rows = self
            .onchain
            .fetch_daily(symbol, days.clamp(1, MAX_ONCHAIN_DAYS))
            .await
            .map_err(|e| AppError::ExternalApi(e.to_string()))?;
        self.market.store().upsert_onchain(symbol, &rows)
    }

    /// Sync every canonical symbol. Failures are logged and skipped.
    pub async fn sync_all(&self) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        for symbol in canonical_symbols() {
            match self.sync_symbol(symbol).await {
                Ok(report) => reports.push(report),
                Err(e) => error!("Sync failed for {}: {}", symbol, e),
            }
        }
        reports
    }

    /// Warm symbols whose stored daily history is too short, in background tasks.
    pub fn bootstrap(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for symbol in canonical_symbols() {
            let count = match self.market.store().candle_count(symbol, Timeframe::OneDay) {
                Ok(count) => count,
                Err(e) => {
                    error!("Init data error for {}: {}", symbol, e);
                    continue;
                }
            };
            if count >= self.bootstrap_min {
                continue;
            }

            info!("Bootstrapping {} candles ({} stored)", symbol, count);
            let this = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                this.warm(symbol).await;
            }));
        }
        handles
    }

    async fn warm(&self, symbol: &str) {
        match self
            .market
            .sources()
            .fetch_candles(symbol, Timeframe::OneDay, BOOTSTRAP_DAYS)
            .await
        {
            Ok(candles) => {
                if let Err(e) = self
                    .market
                    .store()
                    .upsert_candles(symbol, Timeframe::OneDay, &candles)
                {
                    warn!("Bootstrap upsert failed for {}: {}", symbol, e);
                }
            }
            Err(e) => debug!("Bootstrap fetch failed for {}: {}", symbol, e),
        }
        if let Err(e) = self.sync_symbol(symbol).await {
            warn!("Bootstrap sync failed for {}: {}", symbol, e);
        }
    }

    /// Run [`SyncService::sync_all`] every `interval`, starting one interval from now.
    pub fn spawn_scheduler(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                info!("Sync tick: {}", chrono::Utc::now().to_rfc3339());
                let reports = self.sync_all().await;
                debug!("Sync tick finished, {} symbols updated", reports.len());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SqliteStore;
    use crate::sources::{MarketSource, SourceChain};
    use crate::types::Candle;
    use async_trait::async_trait;

    struct Trend;

    #[async_trait]
    impl MarketSource for Trend {
        fn name(&self) -> &'static str {
            "trend"
        }

        async fn fetch_candles(
            &self,
            symbol: &str,
            _timeframe: Timeframe,
            limit: usize,
        ) -> anyhow::Result<Vec<Candle>> {
            if symbol == "SNEK" {
                return Err(anyhow::anyhow!("delisted"));
            }
            Ok((0..limit as i64)
                .map(|i| {
                    let c = 100.0 + i as f64;
                    Candle::new(i * 86_400_000, c, c + 1.0, c - 1.0, c, 1000.0)
                })
                .collect())
        }

        async fn fetch_price(&self, _symbol: &str) -> anyhow::Result<f64> {
            Ok(100.0)
        }
    }

    struct NoOnchain;

    #[async_trait]
    impl OnchainSource for NoOnchain {
        fn supports(&self, symbol: &str) -> bool {
            symbol == "BTC"
        }

        async fn fetch_daily(&self, _symbol: &str, _days: usize) -> anyhow::Result<Vec<OnchainRow>> {
            Err(anyhow::anyhow!("offline"))
        }
    }

    fn service() -> Arc<SyncService> {
        let store = Arc::new(SqliteStore::new_in_memory().unwrap());
        let market = Arc::new(MarketDataService::new(
            store,
            SourceChain::new(vec![Arc::new(Trend)]),
        ));
        Arc::new(SyncService::new(
            market,
            Arc::new(NoOnchain),
            SignalPipeline::default(),
            10,
        ))
    }

    #[tokio::test]
    async fn test_sync_symbol_persists_everything() {
        let sync = service();
        let report = sync.sync_symbol("BTC").await.unwrap();
        assert_eq!(report.fetched, SYNC_DAYS);
        assert_eq!(report.ts, Some((SYNC_DAYS as i64 - 1) * 86_400_000));
        assert!(!report.onchain_live);
        assert_eq!(report.onchain_rows, SYNC_DAYS);

        let store = sync.market.store();
        let levels = store.latest_levels("BTC").unwrap();
        assert!(levels.is_complete());
        assert_eq!(levels.pivot.unwrap().len(), 5);

        let prob = store.latest_probability("BTC", DAILY_HORIZON).unwrap().unwrap();
        assert_eq!(prob.ts, report.ts.unwrap());
        assert!(prob.snapshot.p_up > 0.5);
        assert_eq!(store.onchain_rows("BTC").unwrap().len(), SYNC_DAYS);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent_for_keyed_rows() {
        let sync = service();
        sync.sync_symbol("ETH").await.unwrap();
        sync.sync_symbol("ETH").await.unwrap();
        let store = sync.market.store();
        assert_eq!(store.candle_count("ETH", Timeframe::OneDay).unwrap(), SYNC_DAYS);
        assert_eq!(store.onchain_rows("ETH").unwrap().len(), SYNC_DAYS);
    }

    #[tokio::test]
    async fn test_sync_all_skips_failures() {
        let reports = service().sync_all().await;
        assert_eq!(reports.len(), 7);
        assert!(reports.iter().all(|r| r.symbol != "SNEK"));
    }

    #[tokio::test]
    async fn test_bootstrap_warms_short_histories() {
        let sync = service();
        sync.sync_symbol("BTC").await.unwrap();
        let handles = sync.bootstrap();
        // BTC already has 90 rows; the rest need warming.
        assert_eq!(handles.len(), 7);
        for h in handles {
            h.await.unwrap();
        }
        let store = sync.market.store();
        assert_eq!(store.candle_count("ETH", Timeframe::OneDay).unwrap(), BOOTSTRAP_DAYS);
        assert_eq!(store.candle_count("SNEK", Timeframe::OneDay).unwrap(), 0);
    }
}
