pub mod health;
pub mod market;
pub mod onchain;
pub mod signals;
pub mod sync;
pub mod tools;
pub mod trading;

use crate::error::{AppError, Result};
use crate::services::fx::normalize_currency;
use crate::sources::normalize_symbol;
use crate::AppState;
use axum::{Json, Router};
use serde::Serialize;

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            ok: true,
            data,
            cached: None,
            message: None,
        }
    }

    pub fn cached(data: T) -> Self {
        Self {
            cached: Some(true),
            ..Self::new(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>>;

/// Whitelisted canonical symbol, or `400 symbol not allowed`.
pub fn require_symbol(raw: Option<&str>) -> Result<&'static str> {
    raw.and_then(normalize_symbol)
        .ok_or_else(|| AppError::BadRequest("symbol not allowed".to_string()))
}

/// Requested currency with its USD rate.
pub async fn currency_rate(state: &AppState, currency: Option<&str>) -> (String, f64) {
    let currency = normalize_currency(currency.unwrap_or_default());
    let rate = state.fx.rate(&currency).await;
    (currency, rate)
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(market::router())
        .merge(signals::router())
        .merge(onchain::router())
        .merge(trading::router())
        .merge(tools::router())
        .merge(sync::router())
}
