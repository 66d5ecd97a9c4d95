//! Signal API endpoints.

use super::{currency_rate, require_symbol, ApiResponse, ApiResult};
use crate::error::{AppError, Result};
use crate::services::signals::indicators::Atr;
use crate::services::signals::{advise, candidate_targets, plan_targets, probability, Advice};
use crate::services::sync::DAILY_HORIZON;
use crate::types::{
    Candle, LevelSet, SignalSnapshot, StoredProbability, TargetCandidate, TargetPlan, Timeframe,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// 4h bars requested for the intraday probability.
const FOUR_HOUR_BARS: usize = 120;

#[derive(Debug, Default, Deserialize)]
pub struct SignalQuery {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub horizon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LevelsResponse {
    #[serde(flatten)]
    pub levels: LevelSet,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct ProbabilityResponse {
    #[serde(flatten)]
    pub probability: StoredProbability,
    pub currency: String,
    pub plan: TargetPlan,
    pub targets: Vec<TargetCandidate>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub symbol: &'static str,
    #[serde(flatten)]
    pub snapshot: SignalSnapshot,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    #[serde(flatten)]
    pub advice: Advice,
    pub currency: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/levels", get(get_levels))
        .route("/api/probability", get(get_probability))
        .route("/api/signals/snapshot", get(get_snapshot))
        .route("/api/advice", get(get_advice))
}

/// GET /api/levels
async fn get_levels(
    State(state): State<AppState>,
    Query(query): Query<SignalQuery>,
) -> ApiResult<LevelsResponse> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;
    let levels = state.store.latest_levels(symbol)?.scaled(rate);
    Ok(Json(ApiResponse::new(LevelsResponse { levels, currency })))
}

/// Stored probability for the horizon, computed and persisted when missing.
fn stored_or_computed(
    state: &AppState,
    symbol: &str,
    horizon: &str,
    candles: &[Candle],
) -> Result<StoredProbability> {
    if let Some(stored) = state.store.latest_probability(symbol, horizon)? {
        return Ok(stored);
    }
    let latest = candles
        .last()
        .ok_or_else(|| AppError::NotFound("no candle data".to_string()))?;
    let onchain = state.store.onchain_rows(symbol)?;
    let snapshot = probability(candles, Some(onchain.as_slice()));
    state
        .store
        .upsert_probability(symbol, latest.ts, horizon, &snapshot)?;
    Ok(StoredProbability {
        ts: latest.ts,
        horizon: horizon.to_string(),
        snapshot,
    })
}

/// GET /api/probability
async fn get_probability(
    State(state): State<AppState>,
    Query(query): Query<SignalQuery>,
) -> ApiResult<ProbabilityResponse> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let horizon = query.horizon.as_deref().unwrap_or(DAILY_HORIZON);
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;

    let candles = state.market.daily_candles(symbol)?;
    let stored = stored_or_computed(&state, symbol, horizon, &candles)?;

    // Targets always come from the latest candles and levels.
    let bands = state.store.latest_levels(symbol)?.tagged();
    let verdict = stored.snapshot.verdict;
    let (plan, targets) = match candles.last() {
        Some(last) => {
            let atr = Atr::default().calculate(&candles);
            (
                plan_targets(state.pipeline.policy(), last.close, verdict, &bands),
                candidate_targets(last.close, verdict, &bands, atr),
            )
        }
        None => (TargetPlan::default(), Vec::new()),
    };

    Ok(Json(ApiResponse::new(ProbabilityResponse {
        probability: stored,
        currency,
        plan: plan.scaled(rate),
        targets: targets.iter().map(|t| t.scaled(rate)).collect(),
    })))
}

/// GET /api/signals/snapshot
async fn get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SignalQuery>,
) -> ApiResult<SnapshotResponse> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;

    let candles = state.market.daily_candles(symbol)?;
    let onchain = state.store.onchain_rows(symbol)?;
    let onchain = (!onchain.is_empty()).then_some(onchain.as_slice());
    let snapshot = state.pipeline.run(&candles, onchain).scaled(rate);

    Ok(Json(ApiResponse::new(SnapshotResponse {
        symbol,
        snapshot,
        currency,
    })))
}

/// GET /api/advice
async fn get_advice(
    State(state): State<AppState>,
    Query(query): Query<SignalQuery>,
) -> ApiResult<AdviceResponse> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;

    let daily = state.market.daily_candles(symbol)?;
    let prob_1d = stored_or_computed(&state, symbol, DAILY_HORIZON, &daily)?.snapshot;
    let four_hour = state
        .market
        .candles_for(symbol, Timeframe::FourHours, FOUR_HOUR_BARS)
        .await?;
    let prob_4h = probability(&four_hour, None);

    let price = state
        .market
        .live_price(symbol)
        .await?
        .ok_or_else(|| AppError::NotFound("no price data".to_string()))?;
    let bands = state.store.latest_levels(symbol)?.tagged();
    let atr = Atr::default().calculate(&daily);

    let advice = advise(symbol, &prob_1d, &prob_4h, price, &bands, atr).scaled(rate);
    Ok(Json(ApiResponse::new(AdviceResponse { advice, currency })))
}
