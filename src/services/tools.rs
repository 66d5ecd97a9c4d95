//! Calculators over stored daily candles.

use super::sqlite_store::SqliteStore;
use crate::error::{AppError, Result};
use crate::types::{Candle, DcaResult, Timeframe};
use std::sync::Arc;

pub const DEFAULT_PERIODS: usize = 12;
pub const MAX_PERIODS: usize = 365;
pub const DEFAULT_AMOUNT: f64 = 100.0;

/// Buying cadence for dollar-cost averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DcaFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl DcaFrequency {
    /// Unknown labels fall back to weekly.
    pub fn parse(s: &str) -> Self {
        match s {
            "1d" => Self::Daily,
            "1m" => Self::Monthly,
            _ => Self::Weekly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "1w",
            Self::Monthly => "1m",
        }
    }

    /// Daily bars between buys.
    pub fn step(&self) -> usize {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }
}

/// Normalized DCA request.
#[derive(Debug, Clone, PartialEq)]
pub struct DcaPlan {
    pub periods: usize,
    /// USD per buy.
    pub amount: f64,
    pub freq: DcaFrequency,
}

impl DcaPlan {
    pub fn new(periods: Option<usize>, amount: Option<f64>, freq: Option<&str>) -> Self {
        Self {
            periods: periods.unwrap_or(DEFAULT_PERIODS).clamp(1, MAX_PERIODS),
            amount: amount.filter(|a| a.is_finite()).unwrap_or(DEFAULT_AMOUNT).max(0.0),
            freq: freq.map(DcaFrequency::parse).unwrap_or_default(),
        }
    }

    /// Daily candles needed, newest first.
    pub fn lookback(&self) -> usize {
        self.periods * self.freq.step() + 1
    }
}

/// Simulate equal USD buys over `newest_first` closes.
///
/// Buys start at the oldest candle in the window and advance by the step
/// until `periods` buys are made. Money fields are multiplied by `rate`;
/// units are not.
pub fn simulate_dca(
    symbol: &str,
    plan: &DcaPlan,
    newest_first: &[Candle],
    rate: f64,
    currency: &str,
) -> Option<DcaResult> {
    let latest = newest_first.first()?;
    let buys: Vec<f64> = newest_first
        .iter()
        .rev()
        .step_by(plan.freq.step())
        .take(plan.periods)
        .map(|c| c.close)
        .collect();
    if buys.is_empty() {
        return None;
    }

    let mut invested = 0.0;
    let mut units = 0.0;
    for close in &buys {
        invested += plan.amount;
        if *close > 0.0 {
            units += plan.amount / close;
        }
    }
    let avg_cost = if units > 0.0 { invested / units } else { 0.0 };
    let current_value = units * latest.close;
    let pnl = current_value - invested;
    let return_pct = if invested > 0.0 { pnl / invested * 100.0 } else { 0.0 };

    Some(DcaResult {
        symbol: symbol.to_string(),
        freq: plan.freq.as_str().to_string(),
        periods: plan.periods,
        amount_per_period: plan.amount * rate,
        currency: currency.to_string(),
        buys: buys.len(),
        avg_cost: avg_cost * rate,
        total_invested: invested * rate,
        total_units: units,
        latest_price: latest.close * rate,
        current_value: current_value * rate,
        pnl_amount: pnl * rate,
        return_pct,
    })
}

pub struct ToolsService {
    store: Arc<SqliteStore>,
}

impl ToolsService {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    pub fn dca(&self, symbol: &str, plan: &DcaPlan, rate: f64, currency: &str) -> Result<DcaResult> {
        let mut candles = self
            .store
            .recent_candles(symbol, Timeframe::OneDay, plan.lookback())?;
        if candles.is_empty() {
            return Err(AppError::NotFound("no candles".to_string()));
        }
        candles.reverse();
        simulate_dca(symbol, plan, &candles, rate, currency)
            .ok_or_else(|| AppError::NotFound("not enough data".to_string()))
    }
}
