use super::{require_symbol, ApiResponse, ApiResult};
use crate::sources::canonical_symbols;
use crate::types::{OnchainOverviewEntry, OnchainRow};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_LIMIT: usize = 90;
const MAX_LIMIT: usize = 365;

#[derive(Debug, Default, Deserialize)]
pub struct OnchainQuery {
    pub symbol: Option<String>,
    pub limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/onchain/metrics", get(get_metrics))
        .route("/api/onchain/overview", get(get_overview))
}

/// GET /api/onchain/metrics
///
/// Newest `limit` rows, oldest first. An empty table is filled from the live
/// provider when one covers the symbol.
async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<OnchainQuery>,
) -> ApiResult<Vec<OnchainRow>> {
    let symbol = require_symbol(query.symbol.as_deref())?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut rows = state.store.recent_onchain(symbol, limit)?;
    if rows.is_empty() {
        match state.sync.backfill_onchain(symbol, limit).await {
            Ok(0) => {}
            Ok(_) => rows = state.store.recent_onchain(symbol, limit)?,
            Err(e) => debug!("on-chain backfill for {} failed: {}", symbol, e),
        }
    }
    Ok(Json(ApiResponse::new(rows)))
}

/// GET /api/onchain/overview
async fn get_overview(State(state): State<AppState>) -> ApiResult<Vec<OnchainOverviewEntry>> {
    let mut out = Vec::new();
    for symbol in canonical_symbols() {
        if let Some(row) = state.store.latest_onchain(symbol)? {
            out.push(OnchainOverviewEntry {
                symbol: symbol.to_string(),
                row: Some(row),
            });
        }
    }
    Ok(Json(ApiResponse::new(out)))
}
