use super::{json_f64, MarketSource};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

const CRYPTOCOM_API_URL: &str = "https://api.crypto.com/v2/public";

/// Symbols listed on Crypto.com but not on Binance.
const COVERED: &[&str] = &["CRO", "SNEK"];

/// Crypto.com Exchange public REST source.
#[derive(Clone)]
pub struct CryptoComSource {
    client: Client,
    base_url: String,
}

impl CryptoComSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, CRYPTOCOM_API_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn instrument(symbol: &str) -> anyhow::Result<String> {
        if COVERED.contains(&symbol) {
            Ok(format!("{}_USDT", symbol))
        } else {
            Err(anyhow::anyhow!("{} not covered by Crypto.com", symbol))
        }
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4H",
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "7D",
        }
    }

    async fn get_json(&self, url: &str) -> anyhow::Result<Value> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            warn!("Crypto.com API returned {}", status);
            return Err(anyhow::anyhow!("Crypto.com API error: {}", status));
        }
        Ok(response.json().await?)
    }
}

fn field(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(json_f64))
}

/// Candles from either payload layout the exchange has used, sorted ascending.
/// Second timestamps are promoted to millis.
pub(crate) fn parse_candles(data: &Value) -> Vec<Candle> {
    let rows = data
        .pointer("/result/data")
        .or_else(|| data.pointer("/data/candlestick"))
        .or_else(|| data.get("data"))
        .and_then(Value::as_array);
    let Some(rows) = rows else {
        return Vec::new();
    };

    let mut candles: Vec<Candle> = rows
        .iter()
        .map(|k| {
            let raw_ts = field(k, &["t", "time", "T"]).unwrap_or(0.0);
            let ts = if raw_ts < 1e12 { raw_ts * 1000.0 } else { raw_ts };
            Candle::new(
                ts as i64,
                field(k, &["o", "open"]).unwrap_or(0.0),
                field(k, &["h", "high"]).unwrap_or(0.0),
                field(k, &["l", "low"]).unwrap_or(0.0),
                field(k, &["c", "close"]).unwrap_or(0.0),
                field(k, &["v", "volume"]).unwrap_or(0.0),
            )
        })
        .collect();
    candles.sort_by_key(|c| c.ts);
    candles
}

/// Ticker price from `result.data` (array or object) or the top level.
pub(crate) fn parse_ticker(data: &Value) -> Option<f64> {
    let result = data.get("result").unwrap_or(data);
    let item = match result.get("data") {
        Some(Value::Array(items)) => items.first()?,
        Some(obj @ Value::Object(_)) => obj,
        _ => result,
    };
    field(item, &["a", "price", "p", "last_price"]).filter(|p| *p > 0.0)
}

#[async_trait]
impl MarketSource for CryptoComSource {
    fn name(&self) -> &'static str {
        "cryptocom"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let inst = Self::instrument(symbol)?;
        let url = format!(
            "{}/get-candlestick?instrument_name={}&timeframe={}",
            self.base_url,
            inst,
            Self::interval(timeframe)
        );
        let data = self.get_json(&url).await?;
        let mut candles = parse_candles(&data);
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }

    async fn fetch_price(&self, symbol: &str) -> anyhow::Result<f64> {
        let inst = Self::instrument(symbol)?;
        let url = format!("{}/get-ticker?instrument_name={}", self.base_url, inst);
        let data = self.get_json(&url).await?;
        parse_ticker(&data).ok_or_else(|| anyhow::anyhow!("cryptocom ticker unavailable"))
    }
}
