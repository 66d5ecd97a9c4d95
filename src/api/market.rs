//! Market endpoints: chart summary, live price, sentiment and rainbow bands.

use super::{currency_rate, require_symbol, ApiResponse, ApiResult};
use crate::error::AppError;
use crate::services::signals::{rainbow, Rainbow};
use crate::services::FearGreedLookup;
use crate::types::{FearGreed, MarketSummary, PriceQuote, Timeframe};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_DAYS: usize = 90;
const MAX_DAYS: usize = 365;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub days: Option<usize>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RainbowResponse {
    pub symbol: &'static str,
    #[serde(flatten)]
    pub rainbow: Rainbow,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/market/summary", get(get_summary))
        .route("/api/market/fear_greed", get(get_fear_greed))
        .route("/api/market/rainbow", get(get_rainbow))
        .route("/api/price", get(get_price))
}

/// GET /api/market/summary
async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<MarketSummary> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let interval = match query.interval.as_deref() {
        None => Timeframe::OneDay,
        Some(raw) => Timeframe::from_str(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unsupported interval {}", raw)))?,
    };
    let days = query.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;

    let outcome = state
        .market
        .summary(symbol, interval, days, rate, &currency)
        .await?;

    if outcome.needs_backfill {
        let sync = state.sync.clone();
        tokio::spawn(async move {
            if let Err(e) = sync.sync_symbol(symbol).await {
                warn!("Background backfill failed for {}: {}", symbol, e);
            }
        });
    }

    Ok(Json(ApiResponse::new(outcome.summary)))
}

/// GET /api/market/fear_greed
async fn get_fear_greed(State(state): State<AppState>) -> ApiResult<FearGreed> {
    let response = match state.sentiment.fear_greed().await {
        FearGreedLookup::Fresh(fg) => ApiResponse::new(fg),
        FearGreedLookup::Cached(fg) => ApiResponse::cached(fg),
        FearGreedLookup::Unavailable(fg) => ApiResponse::new(fg).with_message("fng unavailable"),
    };
    Ok(Json(response))
}

/// GET /api/market/rainbow
async fn get_rainbow(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<RainbowResponse> {
    let symbol = require_symbol(Some(query.symbol.as_deref().unwrap_or("BTC")))?;
    let candles = state.market.daily_candles(symbol)?;
    let rainbow = rainbow(&candles).ok_or_else(|| AppError::NotFound("no candle data".to_string()))?;
    Ok(Json(ApiResponse::new(RainbowResponse { symbol, rainbow })))
}

/// GET /api/price
async fn get_price(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<PriceQuote> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let usd = state
        .market
        .live_price(symbol)
        .await?
        .ok_or_else(|| AppError::Internal("live price unavailable".to_string()))?;
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;

    Ok(Json(ApiResponse::new(PriceQuote {
        symbol: symbol.to_string(),
        price: usd * rate,
        currency,
        ts: chrono::Utc::now().timestamp_millis(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_query_parsing() {
        let q: SummaryQuery =
            serde_urlencoded::from_str("symbol=eth&interval=4h&days=30&currency=eur").unwrap();
        assert_eq!(q.symbol.as_deref(), Some("eth"));
        assert_eq!(q.interval.as_deref(), Some("4h"));
        assert_eq!(q.days, Some(30));

        let q: SummaryQuery = serde_urlencoded::from_str("symbol=BTC").unwrap();
        assert!(q.days.is_none());
        assert!(q.currency.is_none());
    }
}
