//! Paper Trading Service
//!
//! Simulated positions against live prices:
//! - open and close trades, optionally tagged with a room
//! - list trades with unrealized or realized PnL in the requested currency
//! - aggregate win rate, equity curve and drawdown over closed trades
//!
//! Amounts are stored in USD and converted on the way out.

use super::market_data::MarketDataService;
use crate::error::{AppError, Result};
use crate::types::{
    ClosePaperTrade, ClosedTrade, EquityPoint, NewPaperTrade, PaperMetrics, PaperTrade,
    PaperTradeView, TradeStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Trades returned by a list call.
pub const LIST_LIMIT: usize = 200;

pub struct PaperTradingService {
    market: Arc<MarketDataService>,
}

impl PaperTradingService {
    pub fn new(market: Arc<MarketDataService>) -> Self {
        Self { market }
    }

    /// Live USD price, or `fallback` when no provider answers.
    async fn price_or(&self, symbol: &str, fallback: f64) -> f64 {
        match self.market.sources().fetch_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                debug!("No live price for {} ({}), using entry", symbol, e);
                fallback
            }
        }
    }

    pub fn open(&self, req: NewPaperTrade) -> Result<PaperTrade> {
        let symbol = req.symbol.trim().to_uppercase();
        if symbol.is_empty() || !req.entry.is_finite() || !(req.qty > 0.0) {
            return Err(AppError::BadRequest("missing fields".to_string()));
        }
        let room = req
            .room
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let trade = NewPaperTrade { symbol, room, ..req };

        let store = self.market.store();
        let id = store.insert_paper_trade(&trade, chrono::Utc::now().timestamp_millis())?;
        info!(
            "Opened paper trade {}: {} {} {} @ {}",
            id, trade.side, trade.qty, trade.symbol, trade.entry
        );
        store
            .paper_trade(id)?
            .ok_or_else(|| AppError::Internal(format!("paper trade {} vanished", id)))
    }

    /// Newest trades first, annotated for display in the rate's currency.
    pub async fn list(
        &self,
        room: Option<&str>,
        rate: f64,
        currency: &str,
    ) -> Result<Vec<PaperTradeView>> {
        let room = room.map(str::trim).filter(|r| !r.is_empty());
        let trades = self.market.store().list_paper_trades(room, LIST_LIMIT)?;

        let mut prices: HashMap<String, f64> = HashMap::new();
        let mut out = Vec::with_capacity(trades.len());
        for trade in trades {
            let mut view = PaperTradeView {
                current_price: None,
                unrealized_pnl: None,
                unrealized_pnl_conv: None,
                pnl_conv: None,
                close_price_conv: None,
                entry_conv: trade.entry * rate,
                currency: currency.to_string(),
                trade,
            };
            let trade = &view.trade;
            match trade.status {
                TradeStatus::Open => {
                    let price = match prices.get(&trade.symbol) {
                        Some(p) => *p,
                        None => {
                            let p = self.price_or(&trade.symbol, trade.entry).await;
                            prices.insert(trade.symbol.clone(), p);
                            p
                        }
                    };
                    let pnl = trade.side.pnl(trade.entry, price, trade.qty);
                    view.current_price = Some(price);
                    view.unrealized_pnl = Some(pnl);
                    view.unrealized_pnl_conv = Some(pnl * rate);
                }
                TradeStatus::Closed => {
                    view.pnl_conv = Some(trade.pnl.unwrap_or(0.0) * rate);
                    view.close_price_conv = trade.close_price.map(|p| p * rate);
                }
            }
            out.push(view);
        }
        Ok(out)
    }

    /// Close an open trade at the given price, or the live price.
    pub async fn close(&self, req: ClosePaperTrade) -> Result<ClosedTrade> {
        let id = match req.id {
            Some(id) if id != 0 => id,
            _ => return Err(AppError::BadRequest("id required".to_string())),
        };
        let store = self.market.store();
        let trade = match store.paper_trade(id)? {
            Some(t) if t.status == TradeStatus::Open => t,
            _ => return Err(AppError::NotFound("not open".to_string())),
        };

        let close_price = match req.price {
            Some(p) => p,
            None => self.price_or(&trade.symbol, trade.entry).await,
        };
        let pnl = trade.side.pnl(trade.entry, close_price, trade.qty);
        let ts_close = chrono::Utc::now().timestamp_millis();
        if !store.close_paper_trade(id, ts_close, close_price, pnl)? {
            return Err(AppError::NotFound("not open".to_string()));
        }

        info!("Closed paper trade {} @ {} (pnl {:.4})", id, close_price, pnl);
        Ok(ClosedTrade {
            id,
            close_price,
            pnl,
        })
    }

    pub async fn metrics(&self, rate: f64, currency: &str) -> Result<PaperMetrics> {
        let store = self.market.store();
        let closed = store.trades_by_status(TradeStatus::Closed)?;
        let open = store.trades_by_status(TradeStatus::Open)?;

        let mut metrics = realized_metrics(&closed, rate, currency);

        let mut unrealized = 0.0;
        for trade in &open {
            let price = self.price_or(&trade.symbol, trade.entry).await;
            unrealized += trade.side.pnl(trade.entry, price, trade.qty);
        }
        metrics.unrealized_pnl = unrealized * rate;
        Ok(metrics)
    }
}

/// Win rate, equity curve and drawdown over trades ordered by close time.
/// A break-even trade counts as a win.
pub fn realized_metrics(closed: &[PaperTrade], rate: f64, currency: &str) -> PaperMetrics {
    let mut wins = 0usize;
    let mut equity = 0.0;
    let mut peak = 0.0f64;
    let mut max_dd = 0.0f64;
    let mut curve = Vec::with_capacity(closed.len());

    for trade in closed {
        let realized = trade.pnl.unwrap_or(0.0);
        equity += realized;
        if realized >= 0.0 {
            wins += 1;
        }
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
        curve.push(EquityPoint {
            ts: trade.ts_close,
            equity: equity * rate,
        });
    }

    let trades = closed.len();
    PaperMetrics {
        currency: currency.to_string(),
        winrate: if trades > 0 { wins as f64 / trades as f64 } else { 0.0 },
        trades,
        pnl: equity * rate,
        max_drawdown: max_dd * rate,
        unrealized_pnl: 0.0,
        curve,
    }
}
