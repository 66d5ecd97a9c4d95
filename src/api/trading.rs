//! Paper Trading API
//!
//! - GET /api/paper/trades - List trades (optionally by room) with live PnL
//! - POST /api/paper/trades - Open a trade
//! - POST /api/paper/close - Close an open trade
//! - GET /api/paper/metrics - Win rate, equity curve and drawdown

use super::{currency_rate, ApiResponse, ApiResult};
use crate::error::AppError;
use crate::types::{ClosePaperTrade, ClosedTrade, NewPaperTrade, PaperMetrics, PaperTrade, PaperTradeView};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct TradesQuery {
    pub room: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub trades: Vec<PaperTradeView>,
    pub currency: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/paper/trades", get(list_trades).post(open_trade))
        .route("/api/paper/close", post(close_trade))
        .route("/api/paper/metrics", get(get_metrics))
}

/// GET /api/paper/trades
async fn list_trades(
    State(state): State<AppState>,
    Query(query): Query<TradesQuery>,
) -> ApiResult<TradesResponse> {
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;
    let trades = state
        .trading
        .list(query.room.as_deref(), rate, &currency)
        .await?;
    Ok(Json(ApiResponse::new(TradesResponse { trades, currency })))
}

/// POST /api/paper/trades
async fn open_trade(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<PaperTrade> {
    let req: NewPaperTrade = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("missing fields".to_string()))?;
    let trade = state.trading.open(req)?;
    Ok(Json(ApiResponse::new(trade)))
}

/// POST /api/paper/close
async fn close_trade(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<ClosedTrade> {
    let req: ClosePaperTrade = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("id required".to_string()))?;
    let closed = state.trading.close(req).await?;
    Ok(Json(ApiResponse::new(closed)))
}

/// GET /api/paper/metrics
async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<CurrencyQuery>,
) -> ApiResult<PaperMetrics> {
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;
    let metrics = state.trading.metrics(rate, &currency).await?;
    Ok(Json(ApiResponse::new(metrics)))
}
