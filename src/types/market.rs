use serde::{Deserialize, Serialize};

/// Fear & Greed Index reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreed {
    /// Index value 0..100, `None` when the provider is unavailable.
    pub value: Option<i64>,
    pub classification: String,
    /// Reading timestamp in epoch millis.
    pub ts: i64,
}

impl FearGreed {
    /// Get the classification for a fear & greed value.
    pub fn classify(value: i64) -> &'static str {
        match value {
            v if v >= 75 => "Extreme Greed",
            v if v >= 55 => "Greed",
            v if v > 45 => "Neutral",
            v if v >= 25 => "Fear",
            _ => "Extreme Fear",
        }
    }

    /// Placeholder returned when the index cannot be fetched.
    pub fn unavailable(ts: i64) -> Self {
        Self {
            value: None,
            classification: "N/A".to_string(),
            ts,
        }
    }
}

/// Latest price of a symbol in a currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub currency: String,
    pub ts: i64,
}

/// Output of the DCA calculator. Money fields are in the requested currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaResult {
    pub symbol: String,
    pub freq: String,
    pub periods: usize,
    pub amount_per_period: f64,
    pub currency: String,
    pub buys: usize,
    pub avg_cost: f64,
    pub total_invested: f64,
    /// Units bought, independent of currency.
    pub total_units: f64,
    pub latest_price: f64,
    pub current_value: f64,
    pub pnl_amount: f64,
    pub return_pct: f64,
}
