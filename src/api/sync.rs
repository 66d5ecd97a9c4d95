//! On-demand sync endpoint.

use super::{require_symbol, ApiResponse, ApiResult};
use crate::services::SyncReport;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/sync/:symbol", post(sync_symbol))
}

/// POST /api/sync/:symbol
async fn sync_symbol(State(state): State<AppState>, Path(raw): Path<String>) -> ApiResult<SyncReport> {
    let symbol = require_symbol(Some(&raw))?;
    info!("Manual sync requested for {}", symbol);
    let report = state.sync.sync_symbol(symbol).await?;
    Ok(Json(ApiResponse::new(report)))
}
