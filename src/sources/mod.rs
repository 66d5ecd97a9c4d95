//! Market-data and on-chain providers.
//!
//! Every price provider implements [`MarketSource`]; a [`SourceChain`] tries them
//! in order until one answers. Providers return USD values and ascending candles.

pub mod binance;
pub mod coingecko;
pub mod cryptocom;
pub mod onchain;

pub use binance::BinanceSource;
pub use coingecko::CoinGeckoSource;
pub use cryptocom::CryptoComSource;
pub use onchain::{generate_mock, mock_seed, BlockchainInfo, OnchainSource};

use crate::config::Config;
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A supported asset and its provider identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    pub symbol: &'static str,
    /// CoinGecko ids, tried in order.
    pub coingecko_ids: &'static [&'static str],
    pub binance_pair: Option<&'static str>,
}

/// Canonical symbols served by the API and kept in sync.
pub const SYMBOLS: &[SymbolInfo] = &[
    SymbolInfo { symbol: "BTC", coingecko_ids: &["bitcoin"], binance_pair: Some("BTCUSDT") },
    SymbolInfo { symbol: "ETH", coingecko_ids: &["ethereum"], binance_pair: Some("ETHUSDT") },
    SymbolInfo { symbol: "ADA", coingecko_ids: &["cardano"], binance_pair: Some("ADAUSDT") },
    SymbolInfo {
        symbol: "CRO",
        coingecko_ids: &["cronos", "crypto-com-chain"],
        binance_pair: None,
    },
    SymbolInfo { symbol: "PEPE", coingecko_ids: &["pepe"], binance_pair: Some("PEPEUSDT") },
    SymbolInfo { symbol: "LUNC", coingecko_ids: &["terra-luna"], binance_pair: Some("LUNCUSDT") },
    SymbolInfo { symbol: "TRX", coingecko_ids: &["tron"], binance_pair: Some("TRXUSDT") },
    SymbolInfo { symbol: "SNEK", coingecko_ids: &["snek"], binance_pair: None },
];

/// Alternative spellings accepted at the API boundary.
const ALIASES: &[(&str, &str)] = &[("LUNAC", "LUNC"), ("TRON", "TRX")];

/// Map user input to a canonical symbol. `None` when it is not whitelisted.
pub fn normalize_symbol(raw: &str) -> Option<&'static str> {
    let upper = raw.trim().to_uppercase();
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == upper) {
        return Some(*canonical);
    }
    SYMBOLS
        .iter()
        .find(|info| info.symbol == upper)
        .map(|info| info.symbol)
}

pub fn symbol_info(symbol: &str) -> Option<&'static SymbolInfo> {
    SYMBOLS.iter().find(|info| info.symbol == symbol)
}

pub fn canonical_symbols() -> impl Iterator<Item = &'static str> {
    SYMBOLS.iter().map(|info| info.symbol)
}

/// Shared HTTP client for provider adapters.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent("Chainscope/0.1")
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Read a number that providers send either as a JSON number or a string.
pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// A price provider.
#[async_trait]
pub trait MarketSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ascending USD candles. Errors when the symbol or timeframe is not covered.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>>;

    /// Latest USD price.
    async fn fetch_price(&self, symbol: &str) -> anyhow::Result<f64>;
}

/// Ordered provider fallback.
#[derive(Clone, Default)]
pub struct SourceChain {
    sources: Vec<Arc<dyn MarketSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Arc<dyn MarketSource>>) -> Self {
        Self { sources }
    }

    /// Binance, then Crypto.com, then CoinGecko.
    pub fn from_config(config: &Config) -> Self {
        let client = http_client(config.http_timeout());
        Self::new(vec![
            Arc::new(BinanceSource::new(client.clone())),
            Arc::new(CryptoComSource::new(client.clone())),
            Arc::new(CoinGeckoSource::new(client, config.coingecko_base.clone())),
        ])
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First non-empty candle series.
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        for source in &self.sources {
            match source.fetch_candles(symbol, timeframe, limit).await {
                Ok(candles) if !candles.is_empty() => {
                    debug!(
                        "{} returned {} {} candles for {}",
                        source.name(),
                        candles.len(),
                        timeframe.as_str(),
                        symbol
                    );
                    return Ok(candles);
                }
                Ok(_) => debug!("{} returned no candles for {}, trying next", source.name(), symbol),
                Err(e) => debug!("{} candles failed for {}: {}", source.name(), symbol, e),
            }
        }
        Err(anyhow::anyhow!(
            "no source returned {} candles for {}",
            timeframe.as_str(),
            symbol
        ))
    }

    /// First positive price.
    pub async fn fetch_price(&self, symbol: &str) -> anyhow::Result<f64> {
        for source in &self.sources {
            match source.fetch_price(symbol).await {
                Ok(price) if price > 0.0 && price.is_finite() => return Ok(price),
                Ok(price) => debug!("{} returned unusable price {} for {}", source.name(), price, symbol),
                Err(e) => debug!("{} price failed for {}: {}", source.name(), symbol, e),
            }
        }
        Err(anyhow::anyhow!("live price unavailable for {}", symbol))
    }
}
