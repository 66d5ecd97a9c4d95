//! On-chain activity providers.

use super::json_f64;
use crate::types::OnchainRow;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const BLOCKCHAIN_INFO_URL: &str = "https://api.blockchain.info";

/// A provider of daily on-chain rows.
#[async_trait]
pub trait OnchainSource: Send + Sync {
    fn supports(&self, symbol: &str) -> bool;

    /// Ascending daily rows covering roughly the last `days` days.
    async fn fetch_daily(&self, symbol: &str, days: usize) -> anyhow::Result<Vec<OnchainRow>>;
}

/// blockchain.info public charts. Bitcoin only.
#[derive(Clone)]
pub struct BlockchainInfo {
    client: Client,
    base_url: String,
}

impl BlockchainInfo {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BLOCKCHAIN_INFO_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `(ts_ms, value)` points of one chart. A failed chart is empty.
    async fn chart(&self, name: &str, days: usize) -> Vec<(i64, f64)> {
        let url = format!(
            "{}/charts/{}?timespan={}days&format=json",
            self.base_url, name, days
        );
        let result = async {
            let response = self.client.get(&url).send().await?.error_for_status()?;
            Ok::<Value, anyhow::Error>(response.json().await?)
        }
        .await;

        match result {
            Ok(data) => parse_chart(&data),
            Err(e) => {
                warn!("blockchain.info chart {} failed: {}", name, e);
                Vec::new()
            }
        }
    }
}

pub(crate) fn parse_chart(data: &Value) -> Vec<(i64, f64)> {
    data.get("values")
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(|p| {
                    let x = p.get("x").and_then(json_f64)?;
                    let y = p.get("y").and_then(json_f64)?;
                    Some(((x * 1000.0) as i64, y))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Merge active-address and transaction series by timestamp, ascending.
pub(crate) fn merge_charts(active: &[(i64, f64)], txs: &[(i64, f64)]) -> Vec<OnchainRow> {
    let mut rows: BTreeMap<i64, OnchainRow> = BTreeMap::new();
    for &(ts, v) in active {
        rows.entry(ts).or_insert_with(|| OnchainRow::new(ts)).active_addr = Some(v.round() as i64);
    }
    for &(ts, v) in txs {
        rows.entry(ts).or_insert_with(|| OnchainRow::new(ts)).tx_count = Some(v.round() as i64);
    }
    rows.into_values().collect()
}

#[async_trait]
impl OnchainSource for BlockchainInfo {
    fn supports(&self, symbol: &str) -> bool {
        symbol == "BTC"
    }

    async fn fetch_daily(&self, symbol: &str, days: usize) -> anyhow::Result<Vec<OnchainRow>> {
        if !self.supports(symbol) {
            return Err(anyhow::anyhow!("blockchain.info does not cover {}", symbol));
        }
        let days = days.max(1);
        let (active, txs) = tokio::join!(
            self.chart("active_addresses", days),
            self.chart("n-transactions", days)
        );
        let rows = merge_charts(&active, &txs);
        if rows.is_empty() {
            return Err(anyhow::anyhow!("blockchain.info returned no data"));
        }
        debug!("blockchain.info returned {} rows for {}", rows.len(), symbol);
        Ok(rows)
    }
}

/// Linear congruential generator yielding values in `[0, 1)`.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = (self.0 * 9301 + 49297) % 233280;
        self.0 as f64 / 233280.0
    }
}

/// Deterministic synthetic on-chain rows, one per timestamp.
///
/// Active addresses, transactions and gas follow a slow random walk; stable-coin
/// netflow is within ±25M and whale transactions within 50..150.
pub fn generate_mock(ts_list: &[i64], seed: u32) -> Vec<OnchainRow> {
    let mut rng = Lcg(seed as u64);
    let mut active = 500_000.0 + rng.next() * 200_000.0;
    let mut txs = 200_000.0 + rng.next() * 100_000.0;
    let mut gas = 1e12 + rng.next() * 2e12;

    ts_list
        .iter()
        .map(|&ts| {
            active *= 0.999 + rng.next() * 0.002;
            txs *= 0.999 + rng.next() * 0.002;
            gas *= 0.999 + rng.next() * 0.002;
            let stable = ((rng.next() - 0.5) * 5e7).round();
            let whales = (50.0 + rng.next() * 100.0).floor() as i64;
            OnchainRow {
                ts,
                active_addr: Some(active.round() as i64),
                tx_count: Some(txs.round() as i64),
                gas_used: Some(gas.round() as i64),
                stable_netflow: Some(stable),
                whale_tx: Some(whales),
            }
        })
        .collect()
}

/// Mock seed for a symbol: its first byte.
pub fn mock_seed(symbol: &str) -> u32 {
    symbol.bytes().next().map(u32::from).unwrap_or(1)
}
