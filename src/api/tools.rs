use super::{currency_rate, require_symbol, ApiResponse, ApiResult};
use crate::services::DcaPlan;
use crate::types::DcaResult;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DcaQuery {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub periods: Option<usize>,
    pub amount: Option<f64>,
    pub freq: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/tools/dca", get(get_dca))
}

/// GET /api/tools/dca
async fn get_dca(State(state): State<AppState>, Query(query): Query<DcaQuery>) -> ApiResult<DcaResult> {
    let symbol = require_symbol(Some(query.symbol.as_deref().unwrap_or("BTC")))?;
    let (currency, rate) = currency_rate(&state, query.currency.as_deref()).await;
    let plan = DcaPlan::new(query.periods, query.amount, query.freq.as_deref());
    let result = state.tools.dca(symbol, &plan, rate, &currency)?;
    Ok(Json(ApiResponse::new(result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dca_query_parsing() {
        let q: DcaQuery =
            serde_urlencoded::from_str("symbol=ada&periods=24&amount=50.5&freq=1m").unwrap();
        assert_eq!(q.periods, Some(24));
        assert_eq!(q.amount, Some(50.5));
        let plan = DcaPlan::new(q.periods, q.amount, q.freq.as_deref());
        assert_eq!(plan.lookback(), 24 * 30 + 1);
    }
}
