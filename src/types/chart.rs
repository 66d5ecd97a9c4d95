use serde::{Deserialize, Serialize};

/// Candle timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Timeframe {
    /// Get the timeframe from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1h" => Some(Timeframe::OneHour),
            "4h" => Some(Timeframe::FourHours),
            "1d" => Some(Timeframe::OneDay),
            "1w" => Some(Timeframe::OneWeek),
            _ => None,
        }
    }

    /// Storage / wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
        }
    }

    /// Bar length in milliseconds.
    pub fn millis(&self) -> i64 {
        match self {
            Timeframe::OneHour => 3_600_000,
            Timeframe::FourHours => 14_400_000,
            Timeframe::OneDay => 86_400_000,
            Timeframe::OneWeek => 604_800_000,
        }
    }
}

/// One OHLCV observation. `ts` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(ts: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Multiply the price fields by an FX rate. Volume is left untouched.
    pub fn scaled(&self, rate: f64) -> Self {
        Self {
            ts: self.ts,
            open: self.open * rate,
            high: self.high * rate,
            low: self.low * rate,
            close: self.close * rate,
            volume: self.volume,
        }
    }
}

/// Market summary response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub candles: Vec<Candle>,
    pub price: Option<f64>,
    pub change24h: Option<f64>,
    pub currency: String,
}

impl MarketSummary {
    /// Build a summary from converted candles.
    pub fn from_candles(candles: Vec<Candle>, currency: &str) -> Self {
        let price = candles.last().map(|c| c.close);
        let change24h = match candles.len() {
            n if n > 1 => {
                let prev = candles[n - 2].close;
                price.map(|p| (p - prev) / prev)
            }
            _ => None,
        };

        Self {
            candles,
            price,
            change24h,
            currency: currency.to_string(),
        }
    }
}
