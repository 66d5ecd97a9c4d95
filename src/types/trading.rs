//! Paper Trading Types
//!
//! Simulated trades recorded against live prices. Prices and PnL are stored in USD;
//! the `*_conv` fields carry the same values converted into the requested currency.

use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "long" => Some(TradeSide::Long),
            "short" => Some(TradeSide::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }

    /// Profit or loss of `qty` units moved from `entry` to `close`.
    pub fn pnl(&self, entry: f64, close: f64, qty: f64) -> f64 {
        let diff = match self {
            TradeSide::Long => close - entry,
            TradeSide::Short => entry - close,
        };
        diff * qty
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trade lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TradeStatus::Open),
            "closed" => Some(TradeStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

/// A stored paper trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperTrade {
    pub id: i64,
    pub ts_open: i64,
    pub ts_close: Option<i64>,
    pub symbol: String,
    pub side: TradeSide,
    pub entry: f64,
    pub qty: f64,
    pub tp: Option<f64>,
    pub sl: Option<f64>,
    pub close_price: Option<f64>,
    pub pnl: Option<f64>,
    pub room: Option<String>,
    pub status: TradeStatus,
}

/// Request to open a paper trade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPaperTrade {
    pub symbol: String,
    pub side: TradeSide,
    pub entry: f64,
    pub qty: f64,
    #[serde(default)]
    pub tp: Option<f64>,
    #[serde(default)]
    pub sl: Option<f64>,
    #[serde(default)]
    pub room: Option<String>,
}

/// Request to close a paper trade. Without a price the live price is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ClosePaperTrade {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Result of closing a trade.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedTrade {
    pub id: i64,
    pub close_price: f64,
    pub pnl: f64,
}

/// A paper trade annotated for display.
#[derive(Debug, Clone, Serialize)]
pub struct PaperTradeView {
    #[serde(flatten)]
    pub trade: PaperTrade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl_conv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_conv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_price_conv: Option<f64>,
    pub entry_conv: f64,
    pub currency: String,
}

/// One point on the realized equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub ts: Option<i64>,
    pub equity: f64,
}

/// Aggregate performance over closed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperMetrics {
    pub currency: String,
    pub winrate: f64,
    pub trades: usize,
    pub pnl: f64,
    pub max_drawdown: f64,
    pub unrealized_pnl: f64,
    pub curve: Vec<EquityPoint>,
}
