//! Integration tests for API endpoints
//!
//! The router runs against an in-memory store and an in-process candle source;
//! FX and sentiment providers point at an unreachable address.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chainscope::config::Config;
use chainscope::services::{FxService, SentimentService, SqliteStore};
use chainscope::sources::{http_client, MarketSource, OnchainSource, SourceChain};
use chainscope::types::{Candle, OnchainRow, Timeframe};
use chainscope::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BASE_TS: i64 = 1_704_067_200_000;
const DAY_MS: i64 = 86_400_000;
const LIVE_PRICE: f64 = 150.0;
const OFFLINE: &str = "http://127.0.0.1:9";

struct StaticSource;

#[async_trait]
impl MarketSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_candles(
        &self,
        _symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        match timeframe {
            Timeframe::OneDay => Ok(daily(limit)),
            Timeframe::FourHours => Ok((0..30)
                .map(|i| {
                    let c = 140.0 + i as f64 * 0.2;
                    Candle::new(BASE_TS + i * 14_400_000, c, c + 0.5, c - 0.5, c, 50.0)
                })
                .collect()),
            _ => Err(anyhow::anyhow!("unsupported timeframe")),
        }
    }

    async fn fetch_price(&self, _symbol: &str) -> anyhow::Result<f64> {
        Ok(LIVE_PRICE)
    }
}

struct NoOnchain;

#[async_trait]
impl OnchainSource for NoOnchain {
    fn supports(&self, _symbol: &str) -> bool {
        false
    }

    async fn fetch_daily(&self, _symbol: &str, _days: usize) -> anyhow::Result<Vec<OnchainRow>> {
        Err(anyhow::anyhow!("not covered"))
    }
}

fn daily(count: usize) -> Vec<Candle> {
    (0..count as i64)
        .map(|i| {
            let c = 100.0 + i as f64 * 0.5;
            Candle::new(BASE_TS + i * DAY_MS, c - 0.2, c + 1.0, c - 1.0, c, 1_000.0 + i as f64)
        })
        .collect()
}

fn state() -> AppState {
    let config = Config {
        database_path: ":memory:".to_string(),
        ..Config::default()
    };
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let sources = SourceChain::new(vec![Arc::new(StaticSource)]);
    let client = http_client(Duration::from_secs(1));

    let fx = FxService::with_urls(client.clone(), Duration::from_secs(60), OFFLINE, OFFLINE);
    fx.set_rate("EUR", 0.5);
    let sentiment = SentimentService::with_url(client, Duration::from_secs(60), OFFLINE);

    AppState::new(config, store, sources, Arc::new(NoOnchain))
        .with_fx(fx)
        .with_sentiment(sentiment)
}

fn seeded(count: usize) -> (Router, AppState) {
    let state = state();
    state
        .store
        .upsert_candles("BTC", Timeframe::OneDay, &daily(count))
        .unwrap();
    (build_router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

// =============================================================================
// Health and validation
// =============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_unknown_symbol_rejected() {
        let app = build_router(state());
        for uri in [
            "/api/market/summary?symbol=DOGE",
            "/api/levels?symbol=XRP",
            "/api/probability",
            "/api/price?symbol=",
        ] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["ok"], false);
            assert_eq!(body["message"], "symbol not allowed");
            assert_eq!(body["status"], 400);
        }
    }
}

// =============================================================================
// Market endpoints
// =============================================================================

mod market_tests {
    use super::*;

    #[tokio::test]
    async fn test_summary_adds_provisional_today() {
        let (app, _) = seeded(60);
        let (status, body) = get(&app, "/api/market/summary?symbol=btc&days=30").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        let candles = data["candles"].as_array().unwrap();
        // 30 stored bars plus today's flat bar at the live price.
        assert_eq!(candles.len(), 31);
        assert_eq!(data["price"], LIVE_PRICE);
        assert_eq!(data["currency"], "USD");
        let today = &candles[30];
        assert_eq!(today["volume"], 0.0);
        assert_eq!(today["open"], candles[29]["close"]);
        assert_eq!(today["ts"].as_i64().unwrap() % DAY_MS, 0);
    }

    #[tokio::test]
    async fn test_summary_converts_prices_not_volume() {
        let (app, _) = seeded(10);
        let (_, usd) = get(&app, "/api/market/summary?symbol=BTC&days=5").await;
        let (_, eur) = get(&app, "/api/market/summary?symbol=BTC&days=5&currency=eur").await;
        assert_eq!(eur["data"]["currency"], "EUR");

        let usd0 = &usd["data"]["candles"][0];
        let eur0 = &eur["data"]["candles"][0];
        assert_eq!(eur0["close"].as_f64().unwrap(), usd0["close"].as_f64().unwrap() * 0.5);
        assert_eq!(eur0["volume"], usd0["volume"]);
        assert_eq!(eur["data"]["price"], LIVE_PRICE * 0.5);
    }

    #[tokio::test]
    async fn test_summary_intraday_and_bad_interval() {
        let (app, _) = seeded(10);
        let (status, body) = get(&app, "/api/market/summary?symbol=ETH&interval=4h&days=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["candles"].as_array().unwrap().len(), 10);

        let (status, body) = get(&app, "/api/market/summary?symbol=ETH&interval=1h&days=5").await;
        assert_eq!(status, StatusCode::OK);
        let first = body["data"]["candles"][0]["ts"].as_i64().unwrap();
        assert_eq!((first - BASE_TS) % 3_600_000, 0);

        let (status, _) = get(&app, "/api/market/summary?symbol=ETH&interval=15m").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary_weekly_from_daily() {
        let (app, _) = seeded(21);
        let (status, body) = get(&app, "/api/market/summary?symbol=BTC&interval=1w").await;
        assert_eq!(status, StatusCode::OK);
        // 2024-01-01 is a Monday: three full ISO weeks.
        assert_eq!(body["data"]["candles"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_summary_empty_store_serves_live_daily() {
        let state = state();
        let app = build_router(state.clone());
        let (status, body) = get(&app, "/api/market/summary?symbol=ADA&days=20").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["candles"].as_array().unwrap().len() >= 20);
        assert!(state.store.candle_count("ADA", Timeframe::OneDay).unwrap() >= 20);
    }

    #[tokio::test]
    async fn test_price_with_alias_and_currency() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/price?symbol=tron&currency=EUR").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["symbol"], "TRX");
        assert_eq!(body["data"]["price"], LIVE_PRICE * 0.5);
        assert_eq!(body["data"]["currency"], "EUR");
    }

    #[tokio::test]
    async fn test_fear_greed_unavailable_is_not_an_error() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/market/fear_greed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(body["data"]["value"].is_null());
        assert_eq!(body["data"]["classification"], "N/A");
        assert_eq!(body["message"], "fng unavailable");
    }

    #[tokio::test]
    async fn test_rainbow_defaults_to_btc() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/market/rainbow").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "no candle data");

        let (app, _) = seeded(120);
        let (status, body) = get(&app, "/api/market/rainbow").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["symbol"], "BTC");
        assert!(body["data"]["zone"].is_string());
        assert_eq!(body["data"]["current_bands"].as_array().unwrap().len(), 7);
    }
}

// =============================================================================
// Signal endpoints
// =============================================================================

mod signal_tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_then_levels() {
        let app = build_router(state());
        let (status, body) = post(&app, "/api/sync/btc", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["symbol"], "BTC");
        assert_eq!(body["data"]["fetched"], 90);
        assert_eq!(body["data"]["onchain_live"], false);

        let (status, usd) = get(&app, "/api/levels?symbol=BTC").await;
        assert_eq!(status, StatusCode::OK);
        let pivot = usd["data"]["pivot"].as_array().unwrap();
        assert_eq!(pivot.len(), 5);
        assert!(usd["data"]["swing"].is_array());
        assert!(usd["data"]["vbp"].is_array());
        assert_eq!(usd["data"]["ts"], BASE_TS + 89 * DAY_MS);

        let (_, eur) = get(&app, "/api/levels?symbol=BTC&currency=EUR").await;
        assert_eq!(eur["data"]["currency"], "EUR");
        let usd_min = pivot[0]["min"].as_f64().unwrap();
        let eur_min = eur["data"]["pivot"][0]["min"].as_f64().unwrap();
        assert!((eur_min - usd_min * 0.5).abs() < 1e-9);
        assert_eq!(eur["data"]["pivot"][0]["hits"], pivot[0]["hits"]);
    }

    #[tokio::test]
    async fn test_levels_empty_store_is_null() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/levels?symbol=ETH").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["pivot"].is_null());
        assert!(body["data"]["vbp"].is_null());
    }

    #[tokio::test]
    async fn test_probability_requires_candles() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/probability?symbol=BTC").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "no candle data");
    }

    #[tokio::test]
    async fn test_probability_computed_on_demand_and_persisted() {
        let (app, state) = seeded(90);
        assert!(state.store.latest_probability("BTC", "1d").unwrap().is_none());

        let (status, body) = get(&app, "/api/probability?symbol=BTC").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        let p_up = data["p_up"].as_f64().unwrap();
        let p_down = data["p_down"].as_f64().unwrap();
        assert!((p_up + p_down - 1.0).abs() < 1e-9);
        assert_eq!(data["ts"], BASE_TS + 89 * DAY_MS);
        assert_eq!(data["horizon"], "1d");
        assert!(data["targets"].is_array());
        assert!(data["plan"]["side"].is_string());

        let stored = state.store.latest_probability("BTC", "1d").unwrap().unwrap();
        assert_eq!(stored.snapshot.p_up, p_up);
    }

    #[tokio::test]
    async fn test_probability_targets_after_sync() {
        let app = build_router(state());
        post(&app, "/api/sync/ETH", json!({})).await;
        let (status, body) = get(&app, "/api/probability?symbol=eth&currency=EUR").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["currency"], "EUR");
        assert_eq!(data["verdict"], "bull");

        let targets = data["targets"].as_array().unwrap();
        let atr: Vec<&Value> = targets.iter().filter(|t| t["type"] == "atr").collect();
        assert_eq!(atr.len(), 2);
        assert_eq!(atr[0]["label"], "+0.5ATR");
        // The last close is 144.5 USD; EUR targets sit above half of it.
        assert!(atr[0]["price"].as_f64().unwrap() > 144.5 * 0.5);
    }

    #[tokio::test]
    async fn test_snapshot_is_not_persisted() {
        let (app, state) = seeded(90);
        let (status, body) = get(&app, "/api/signals/snapshot?symbol=BTC").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["symbol"], "BTC");
        assert_eq!(data["close"], 144.5);
        assert_eq!(data["pivot"].as_array().unwrap().len(), 5);
        assert!(data["atr"].as_f64().unwrap() > 0.0);
        assert!(state.store.latest_levels("BTC").unwrap().pivot.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_of_empty_store_is_neutral() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/signals/snapshot?symbol=CRO").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["ts"].is_null());
        assert_eq!(body["data"]["probability"]["verdict"], "neutral");
    }

    #[tokio::test]
    async fn test_advice_after_sync() {
        let app = build_router(state());
        post(&app, "/api/sync/BTC", json!({})).await;
        let (status, body) = get(&app, "/api/advice?symbol=BTC").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["symbol"], "BTC");
        assert_eq!(data["price"], LIVE_PRICE);
        assert!(["buy", "reduce", "hold"].contains(&data["action"].as_str().unwrap()));
        assert!(data["reason"].as_str().map_or(false, |r| !r.is_empty()));
        assert_eq!(data["fee"]["est_pct"], 0.0015);
        assert!(data["consistency"]["view"].is_string());
    }

    #[tokio::test]
    async fn test_sync_unknown_symbol() {
        let app = build_router(state());
        let (status, body) = post(&app, "/api/sync/DOGE", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "symbol not allowed");
    }
}

// =============================================================================
// On-chain endpoints
// =============================================================================

mod onchain_tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_limit_and_order() {
        let app = build_router(state());
        post(&app, "/api/sync/ADA", json!({})).await;

        let (status, body) = get(&app, "/api/onchain/metrics?symbol=ADA&limit=5").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4]["ts"], BASE_TS + 89 * DAY_MS);
        assert!(rows[0]["ts"].as_i64() < rows[4]["ts"].as_i64());
        assert!(rows[0]["active_addr"].is_number());
    }

    #[tokio::test]
    async fn test_metrics_empty_without_provider() {
        let app = build_router(state());
        let (status, body) = get(&app, "/api/onchain/metrics?symbol=BTC").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overview_lists_synced_symbols() {
        let app = build_router(state());
        post(&app, "/api/sync/ETH", json!({})).await;
        post(&app, "/api/sync/PEPE", json!({})).await;

        let (status, body) = get(&app, "/api/onchain/overview").await;
        assert_eq!(status, StatusCode::OK);
        let symbols: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["ETH", "PEPE"]);
    }
}

// =============================================================================
// Paper trading and tools
// =============================================================================

mod paper_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_requires_fields() {
        let app = build_router(state());
        let (status, body) = post(
            &app,
            "/api/paper/trades",
            json!({"symbol": "BTC", "side": "long", "entry": 100.0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing fields");

        let (status, _) = post(
            &app,
            "/api/paper/trades",
            json!({"symbol": "BTC", "side": "sideways", "entry": 100.0, "qty": 1.0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_trade_lifecycle() {
        let app = build_router(state());
        let (status, body) = post(
            &app,
            "/api/paper/trades",
            json!({"symbol": "btc", "side": "long", "entry": 100.0, "qty": 2.0, "room": "desk"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["symbol"], "BTC");
        assert_eq!(body["data"]["status"], "open");
        let id = body["data"]["id"].as_i64().unwrap();

        let (_, list) = get(&app, "/api/paper/trades?room=desk&currency=EUR").await;
        let trades = list["data"]["trades"].as_array().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(list["data"]["currency"], "EUR");
        assert_eq!(trades[0]["current_price"], LIVE_PRICE);
        assert_eq!(trades[0]["unrealized_pnl"], 100.0);
        assert_eq!(trades[0]["unrealized_pnl_conv"], 50.0);
        assert_eq!(trades[0]["entry_conv"], 50.0);

        let (_, other_room) = get(&app, "/api/paper/trades?room=elsewhere").await;
        assert!(other_room["data"]["trades"].as_array().unwrap().is_empty());

        let (status, closed) = post(&app, "/api/paper/close", json!({"id": id, "price": 120.0})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["data"]["pnl"], 40.0);

        let (status, again) = post(&app, "/api/paper/close", json!({"id": id})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(again["message"], "not open");

        let (_, metrics) = get(&app, "/api/paper/metrics").await;
        let m = &metrics["data"];
        assert_eq!(m["trades"], 1);
        assert_eq!(m["winrate"], 1.0);
        assert_eq!(m["pnl"], 40.0);
        assert_eq!(m["max_drawdown"], 0.0);
        assert_eq!(m["curve"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_requires_id() {
        let app = build_router(state());
        let (status, body) = post(&app, "/api/paper/close", json!({"price": 1.0})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "id required");
    }

    #[tokio::test]
    async fn test_close_defaults_to_live_price() {
        let app = build_router(state());
        let (_, body) = post(
            &app,
            "/api/paper/trades",
            json!({"symbol": "ETH", "side": "short", "entry": 160.0, "qty": 1.0}),
        )
        .await;
        let id = body["data"]["id"].as_i64().unwrap();
        let (_, closed) = post(&app, "/api/paper/close", json!({"id": id})).await;
        assert_eq!(closed["data"]["close_price"], LIVE_PRICE);
        assert_eq!(closed["data"]["pnl"], 10.0);
    }

    #[tokio::test]
    async fn test_dca() {
        let (app, _) = seeded(30);
        let (status, body) = get(&app, "/api/tools/dca?periods=4&freq=1d&amount=10").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["symbol"], "BTC");
        assert_eq!(data["buys"], 4);
        assert_eq!(data["total_invested"], 40.0);
        assert_eq!(data["latest_price"], 114.5);

        let (status, body) = get(&app, "/api/tools/dca?symbol=SNEK").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "no candles");
    }
}
