use super::{ApiResponse, ApiResult};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    db: String,
}

async fn health(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    state.store.ping()?;
    Ok(Json(ApiResponse::new(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        db: state.config.database_path.clone(),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
