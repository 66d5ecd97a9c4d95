use super::{json_f64, symbol_info, MarketSource};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Hard cap Binance applies to kline requests.
const MAX_KLINES: usize = 1000;

#[derive(Debug, Deserialize)]
struct BinancePrice {
    price: String,
}

/// Binance spot REST source for symbols with a USDT pair.
#[derive(Clone)]
pub struct BinanceSource {
    client: Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BINANCE_API_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn pair(symbol: &str) -> anyhow::Result<&'static str> {
        symbol_info(symbol)
            .and_then(|info| info.binance_pair)
            .ok_or_else(|| anyhow::anyhow!("no Binance pair for {}", symbol))
    }

    fn interval(timeframe: Timeframe) -> anyhow::Result<&'static str> {
        match timeframe {
            Timeframe::OneHour => Ok("1h"),
            Timeframe::FourHours => Ok("4h"),
            Timeframe::OneDay => Ok("1d"),
            Timeframe::OneWeek => Err(anyhow::anyhow!("weekly klines are aggregated locally")),
        }
    }

    async fn get_json(&self, url: &str) -> anyhow::Result<Value> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Binance API returned {}: {}",
                status,
                &text[..text.len().min(200)]
            );
            return Err(anyhow::anyhow!("Binance API error: {}", status));
        }
        Ok(response.json().await?)
    }
}

/// Parse kline rows `[openTime, open, high, low, close, volume, closeTime, ...]`.
/// The close time becomes the candle timestamp.
pub(crate) fn parse_klines(data: &Value) -> anyhow::Result<Vec<Candle>> {
    let rows = data
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("unexpected klines payload"))?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let field = |i: usize| row.get(i).and_then(json_f64);
        let (Some(open), Some(high), Some(low), Some(close), Some(close_time)) =
            (field(1), field(2), field(3), field(4), field(6))
        else {
            continue;
        };
        candles.push(Candle::new(
            close_time as i64,
            open,
            high,
            low,
            close,
            field(5).unwrap_or(0.0),
        ));
    }
    Ok(candles)
}

#[async_trait]
impl MarketSource for BinanceSource {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let pair = Self::pair(symbol)?;
        let interval = Self::interval(timeframe)?;
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            pair,
            interval,
            limit.clamp(1, MAX_KLINES)
        );
        let data = self.get_json(&url).await?;
        parse_klines(&data)
    }

    async fn fetch_price(&self, symbol: &str) -> anyhow::Result<f64> {
        let pair = Self::pair(symbol)?;
        let url = format!("{}/ticker/price?symbol={}", self.base_url, pair);
        let data = self.get_json(&url).await?;
        let ticker: BinancePrice = serde_json::from_value(data)?;
        Ok(ticker.price.parse()?)
    }
}
