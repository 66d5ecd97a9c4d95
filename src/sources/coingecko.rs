use super::{json_f64, symbol_info, MarketSource};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Free-tier OHLC history is limited to 90 daily bars.
const MAX_DAYS: usize = 90;

#[derive(Debug, Default, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

enum Fetch<T> {
    Found(T),
    Missing,
}

/// CoinGecko REST source. Daily candles only.
#[derive(Clone)]
pub struct CoinGeckoSource {
    client: Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn ids(symbol: &str) -> anyhow::Result<&'static [&'static str]> {
        symbol_info(symbol)
            .map(|info| info.coingecko_ids)
            .ok_or_else(|| anyhow::anyhow!("no CoinGecko id for {}", symbol))
    }

    async fn get(&self, url: &str) -> anyhow::Result<Fetch<Value>> {
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(Fetch::Missing),
            status if status.is_success() => Ok(Fetch::Found(response.json().await?)),
            status => {
                warn!("CoinGecko API returned {}", status);
                Err(anyhow::anyhow!("CoinGecko API error: {}", status))
            }
        }
    }

    async fn market_chart(&self, id: &str, days: usize) -> anyhow::Result<Fetch<MarketChart>> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}&interval=daily",
            self.base_url, id, days
        );
        Ok(match self.get(&url).await? {
            Fetch::Found(v) => Fetch::Found(serde_json::from_value(v)?),
            Fetch::Missing => Fetch::Missing,
        })
    }

    /// OHLC for the first id that exists, falling back to flat candles from
    /// the price chart when an id has no OHLC endpoint.
    async fn daily_ohlc(&self, ids: &[&str], days: usize) -> anyhow::Result<Vec<Candle>> {
        for id in ids {
            let url = format!("{}/coins/{}/ohlc?vs_currency=usd&days={}", self.base_url, id, days);
            if let Fetch::Found(data) = self.get(&url).await? {
                return Ok(parse_ohlc(&data));
            }
            if let Fetch::Found(chart) = self.market_chart(id, days).await? {
                debug!("CoinGecko {} has no OHLC, deriving from prices", id);
                return Ok(flat_from_prices(&chart.prices));
            }
        }
        Err(anyhow::anyhow!("all CoinGecko id candidates failed"))
    }

    async fn daily_volumes(&self, ids: &[&str], days: usize) -> anyhow::Result<Vec<(f64, f64)>> {
        for id in ids {
            if let Fetch::Found(chart) = self.market_chart(id, days).await? {
                return Ok(chart.total_volumes);
            }
        }
        Ok(Vec::new())
    }
}

fn utc_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ts).map(|dt| dt.date_naive())
}

pub(crate) fn parse_ohlc(data: &Value) -> Vec<Candle> {
    data.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let f = |i: usize| row.get(i).and_then(json_f64);
                    Some(Candle::new(f(0)? as i64, f(1)?, f(2)?, f(3)?, f(4)?, 0.0))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Candles from `[ts, price]` points: open is the previous close.
pub(crate) fn flat_from_prices(prices: &[(f64, f64)]) -> Vec<Candle> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &(ts, close))| {
            let open = if i > 0 { prices[i - 1].1 } else { close };
            Candle::new(ts as i64, open, close, close, close, 0.0)
        })
        .collect()
}

/// Attach daily volumes keyed by UTC date. Missing days get zero.
pub(crate) fn merge_volumes(candles: Vec<Candle>, volumes: &[(f64, f64)]) -> Vec<Candle> {
    let by_day: HashMap<NaiveDate, f64> = volumes
        .iter()
        .filter_map(|&(ts, v)| Some((utc_date(ts as i64)?, v)))
        .collect();
    candles
        .into_iter()
        .map(|c| Candle {
            volume: utc_date(c.ts)
                .and_then(|d| by_day.get(&d).copied())
                .unwrap_or(0.0),
            ..c
        })
        .collect()
}

#[async_trait]
impl MarketSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        if timeframe != Timeframe::OneDay {
            return Err(anyhow::anyhow!("CoinGecko only serves daily candles"));
        }
        let ids = Self::ids(symbol)?;
        let days = limit.clamp(1, MAX_DAYS);

        let (ohlc, volumes) = tokio::join!(self.daily_ohlc(ids, days), self.daily_volumes(ids, days));
        let ohlc = ohlc?;
        let volumes = volumes.unwrap_or_else(|e| {
            debug!("CoinGecko volumes failed for {}: {}", symbol, e);
            Vec::new()
        });
        Ok(merge_volumes(ohlc, &volumes))
    }

    async fn fetch_price(&self, symbol: &str) -> anyhow::Result<f64> {
        for id in Self::ids(symbol)? {
            let url = format!("{}/simple/price?ids={}&vs_currencies=usd", self.base_url, id);
            if let Fetch::Found(data) = self.get(&url).await? {
                if let Some(price) = data.pointer(&format!("/{}/usd", id)).and_then(json_f64) {
                    if price > 0.0 {
                        return Ok(price);
                    }
                }
            }
        }
        Err(anyhow::anyhow!("live price unavailable"))
    }
}
