//! Candle access across timeframes: stored daily history plus live provider data.

use super::sqlite_store::SqliteStore;
use crate::error::Result;
use crate::sources::SourceChain;
use crate::types::{Candle, MarketSummary, Timeframe};
use chrono::{DateTime, Datelike, IsoWeek, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// 4h candles requested from providers.
const FOUR_HOUR_LIMIT: usize = 120;
/// Provider cap for hourly candles.
const ONE_HOUR_LIMIT: usize = 1000;
const THREE_HOURS_MS: i64 = 3 * 3_600_000;
const DAY_MS: i64 = 86_400_000;

pub struct MarketDataService {
    store: Arc<SqliteStore>,
    sources: SourceChain,
}

/// A summary and whether it was served from live data because the store was empty.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub summary: MarketSummary,
    pub needs_backfill: bool,
}

impl MarketDataService {
    pub fn new(store: Arc<SqliteStore>, sources: SourceChain) -> Self {
        Self { store, sources }
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn sources(&self) -> &SourceChain {
        &self.sources
    }

    /// Stored daily candles, ascending.
    pub fn daily_candles(&self, symbol: &str) -> Result<Vec<Candle>> {
        self.store.candles(symbol, Timeframe::OneDay)
    }

    /// USD candles for any timeframe, at most `limit` bars where the timeframe
    /// is served live. Provider failures yield an empty series.
    pub async fn candles_for(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        match timeframe {
            Timeframe::OneDay => self.daily_candles(symbol),
            Timeframe::OneWeek => Ok(aggregate_weekly(&self.daily_candles(symbol)?)),
            Timeframe::FourHours => Ok(self.live_four_hour(symbol).await),
            Timeframe::OneHour => {
                let limit = limit.clamp(1, ONE_HOUR_LIMIT);
                match self.sources.fetch_candles(symbol, Timeframe::OneHour, limit).await {
                    Ok(candles) => Ok(candles),
                    Err(e) => {
                        debug!("1h candles unavailable for {} ({}), deriving from 4h", symbol, e);
                        Ok(hourly_from_four_hour(&self.live_four_hour(symbol).await))
                    }
                }
            }
        }
    }

    async fn live_four_hour(&self, symbol: &str) -> Vec<Candle> {
        self.sources
            .fetch_candles(symbol, Timeframe::FourHours, FOUR_HOUR_LIMIT)
            .await
            .unwrap_or_else(|e| {
                debug!("4h candles unavailable for {}: {}", symbol, e);
                Vec::new()
            })
    }

    /// Live USD price, falling back to the newest stored close.
    pub async fn live_price(&self, symbol: &str) -> Result<Option<f64>> {
        match self.sources.fetch_price(symbol).await {
            Ok(price) => Ok(Some(price)),
            Err(e) => {
                debug!("live price failed for {}: {}", symbol, e);
                self.store.last_close(symbol)
            }
        }
    }

    /// Candles for the chart, converted by `rate`, newest `days` bars.
    pub async fn summary(
        &self,
        symbol: &str,
        interval: Timeframe,
        days: usize,
        rate: f64,
        currency: &str,
    ) -> Result<SummaryOutcome> {
        let mut needs_backfill = false;
        let mut candles = match interval {
            Timeframe::OneDay => {
                let stored = self.store.recent_candles(symbol, Timeframe::OneDay, days)?;
                if stored.is_empty() {
                    needs_backfill = true;
                    self.live_daily_backfill(symbol, days).await?
                } else {
                    stored
                }
            }
            other => {
                let mut all = self.candles_for(symbol, other, days).await?;
                if all.len() > days {
                    all.drain(..all.len() - days);
                }
                all
            }
        };

        if interval == Timeframe::OneDay && !candles.is_empty() {
            if let Ok(live) = self.sources.fetch_price(symbol).await {
                provisional_today(&mut candles, live, Utc::now().timestamp_millis());
            }
        }

        let converted = candles.iter().map(|c| c.scaled(rate)).collect();
        Ok(SummaryOutcome {
            summary: MarketSummary::from_candles(converted, currency),
            needs_backfill,
        })
    }

    /// Live daily candles for an empty store, persisted as they are fetched.
    async fn live_daily_backfill(&self, symbol: &str, days: usize) -> Result<Vec<Candle>> {
        match self.sources.fetch_candles(symbol, Timeframe::OneDay, days).await {
            Ok(candles) => {
                self.store.upsert_candles(symbol, Timeframe::OneDay, &candles)?;
                Ok(candles)
            }
            Err(e) => {
                warn!("no stored or live daily candles for {}: {}", symbol, e);
                Ok(Vec::new())
            }
        }
    }
}

fn datetime(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts)
}

fn utc_midnight(ts: i64) -> i64 {
    ts.div_euclid(DAY_MS) * DAY_MS
}

/// Aggregate ascending daily candles into ISO-week candles.
///
/// Each week is stamped with UTC midnight of its first daily bar.
pub fn aggregate_weekly(daily: &[Candle]) -> Vec<Candle> {
    let mut weeks: Vec<Candle> = Vec::new();
    let mut current: Option<IsoWeek> = None;

    for c in daily {
        let week = datetime(c.ts).map(|dt| dt.iso_week());
        match weeks.last_mut() {
            Some(w) if week.is_some() && week == current => {
                w.high = w.high.max(c.high);
                w.low = w.low.min(c.low);
                w.close = c.close;
                w.volume += c.volume;
            }
            _ => {
                current = week;
                weeks.push(Candle {
                    ts: utc_midnight(c.ts),
                    ..*c
                });
            }
        }
    }
    weeks
}

/// Shift 4h candles back 3h so they sit on hourly boundaries.
pub fn hourly_from_four_hour(candles: &[Candle]) -> Vec<Candle> {
    candles
        .iter()
        .map(|c| Candle {
            ts: c.ts - THREE_HOURS_MS,
            ..*c
        })
        .collect()
}

/// Append a flat candle for today when the last daily bar predates today's
/// UTC midnight. Opens at the previous close, every other price is `live`.
pub fn provisional_today(candles: &mut Vec<Candle>, live: f64, now_ms: i64) {
    let midnight = utc_midnight(now_ms);
    let Some(last) = candles.last() else {
        return;
    };
    if last.ts >= midnight {
        return;
    }
    let open = if last.close > 0.0 { last.close } else { live };
    candles.push(Candle::new(midnight, open, live, live, live, 0.0));
}
