use serde::{Deserialize, Serialize};

/// One day of on-chain activity for a symbol. Every metric is optional:
/// providers rarely report all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OnchainRow {
    pub ts: i64,
    #[serde(default)]
    pub active_addr: Option<i64>,
    #[serde(default)]
    pub tx_count: Option<i64>,
    #[serde(default)]
    pub gas_used: Option<i64>,
    #[serde(default)]
    pub stable_netflow: Option<f64>,
    #[serde(default)]
    pub whale_tx: Option<i64>,
}

impl OnchainRow {
    pub fn new(ts: i64) -> Self {
        Self {
            ts,
            ..Default::default()
        }
    }
}

/// Latest on-chain row per symbol, for the overview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnchainOverviewEntry {
    pub symbol: String,
    #[serde(flatten)]
    pub row: Option<OnchainRow>,
}
