//! SQLite persistence for candles, derived levels, probability snapshots,
//! on-chain rows and paper trades.
//!
//! All writes are idempotent upserts keyed the way readers look rows up:
//! candles by (symbol, ts, timeframe), probabilities by (symbol, ts, horizon),
//! on-chain rows by (symbol, ts). Level rows are append-only; readers take
//! the newest row per method.

use crate::error::{AppError, Result};
use crate::types::{
    Band, Candle, LevelMethod, LevelSet, NewPaperTrade, OnchainRow, PaperTrade,
    ProbabilitySnapshot, StoredProbability, Timeframe, TradeSide, TradeStatus, Verdict,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// SQLite store shared by the server and the batch sync.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS candles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ts INTEGER NOT NULL,
                timeframe TEXT NOT NULL DEFAULT '1d',
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL DEFAULT 0,
                UNIQUE (symbol, ts, timeframe)
            );
            CREATE INDEX IF NOT EXISTS idx_candles_symbol_ts ON candles(symbol, timeframe, ts);

            CREATE TABLE IF NOT EXISTS levels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ts INTEGER NOT NULL,
                method TEXT NOT NULL,
                bands_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_levels_symbol_ts ON levels(symbol, ts, method);

            CREATE TABLE IF NOT EXISTS prob_signal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ts INTEGER NOT NULL,
                horizon TEXT NOT NULL DEFAULT '1d',
                p_up REAL NOT NULL,
                p_down REAL NOT NULL,
                verdict TEXT NOT NULL,
                features_json TEXT,
                UNIQUE (symbol, ts, horizon)
            );

            CREATE TABLE IF NOT EXISTS onchain_daily (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ts INTEGER NOT NULL,
                active_addr INTEGER,
                tx_count INTEGER,
                gas_used INTEGER,
                stable_netflow REAL,
                whale_tx INTEGER,
                UNIQUE (symbol, ts)
            );

            CREATE TABLE IF NOT EXISTS paper_trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_open INTEGER NOT NULL,
                ts_close INTEGER,
                symbol TEXT NOT NULL,
                side TEXT NOT NULL,
                entry REAL NOT NULL,
                qty REAL NOT NULL,
                tp REAL,
                sl REAL,
                close_price REAL,
                pnl REAL,
                room TEXT,
                status TEXT NOT NULL DEFAULT 'open'
            );
            CREATE INDEX IF NOT EXISTS idx_paper_open ON paper_trades(status, ts_open);",
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    /// Cheap liveness check.
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    // ========== Candle Methods ==========

    /// Insert or update candles. Returns the number of rows written.
    pub fn upsert_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize> {
        if candles.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO candles (symbol, ts, timeframe, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(symbol, ts, timeframe) DO UPDATE SET
                    open = excluded.open, high = excluded.high, low = excluded.low,
                    close = excluded.close, volume = excluded.volume",
            )?;
            for c in candles {
                stmt.execute(params![
                    symbol,
                    c.ts,
                    timeframe.as_str(),
                    c.open,
                    c.high,
                    c.low,
                    c.close,
                    c.volume
                ])?;
            }
        }
        tx.commit()?;

        debug!("Upserted {} {} candles for {}", candles.len(), timeframe.as_str(), symbol);
        Ok(candles.len())
    }

    fn candle_from_row(row: &Row<'_>) -> rusqlite::Result<Candle> {
        Ok(Candle {
            ts: row.get(0)?,
            open: row.get(1)?,
            high: row.get(2)?,
            low: row.get(3)?,
            close: row.get(4)?,
            volume: row.get(5)?,
        })
    }

    /// Full candle history, oldest first.
    pub fn candles(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ts, open, high, low, close, volume FROM candles
             WHERE symbol = ?1 AND timeframe = ?2 ORDER BY ts ASC",
        )?;
        let rows = stmt
            .query_map(params![symbol, timeframe.as_str()], Self::candle_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// The newest `limit` candles, oldest first.
    pub fn recent_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ts, open, high, low, close, volume FROM candles
             WHERE symbol = ?1 AND timeframe = ?2 ORDER BY ts DESC LIMIT ?3",
        )?;
        let mut rows = stmt
            .query_map(
                params![symbol, timeframe.as_str(), limit as i64],
                Self::candle_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.reverse();
        Ok(rows)
    }

    pub fn candle_count(&self, symbol: &str, timeframe: Timeframe) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM candles WHERE symbol = ?1 AND timeframe = ?2",
            params![symbol, timeframe.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Close of the newest daily candle.
    pub fn last_close(&self, symbol: &str) -> Result<Option<f64>> {
        let conn = self.lock()?;
        let close = conn
            .query_row(
                "SELECT close FROM candles WHERE symbol = ?1 AND timeframe = '1d'
                 ORDER BY ts DESC LIMIT 1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;
        Ok(close)
    }

    // ========== Level Methods ==========

    pub fn insert_levels(
        &self,
        symbol: &str,
        ts: i64,
        method: LevelMethod,
        bands: &[Band],
    ) -> Result<()> {
        let json = serde_json::to_string(bands)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO levels (symbol, ts, method, bands_json) VALUES (?1, ?2, ?3, ?4)",
            params![symbol, ts, method.as_str(), json],
        )?;
        Ok(())
    }

    /// Newest band list per method. Methods never stored stay `None`.
    pub fn latest_levels(&self, symbol: &str) -> Result<LevelSet> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT method, bands_json, ts FROM levels WHERE symbol = ?1
             ORDER BY ts DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![symbol], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut levels = LevelSet::default();
        for (method, json, ts) in rows {
            let method = match LevelMethod::from_str(&method) {
                Some(m) => m,
                None => continue,
            };
            if levels.get(method).is_some() {
                continue;
            }
            match serde_json::from_str::<Vec<Band>>(&json) {
                Ok(bands) => levels.set(method, bands),
                Err(e) => {
                    warn!("Skipping malformed {} levels for {}: {}", method.as_str(), symbol, e);
                    continue;
                }
            }
            levels.ts = Some(levels.ts.map_or(ts, |t| t.max(ts)));
            if levels.is_complete() {
                break;
            }
        }
        Ok(levels)
    }

    // ========== Probability Methods ==========

    pub fn upsert_probability(
        &self,
        symbol: &str,
        ts: i64,
        horizon: &str,
        snapshot: &ProbabilitySnapshot,
    ) -> Result<()> {
        let features = serde_json::to_string(&snapshot.features)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO prob_signal (symbol, ts, horizon, p_up, p_down, verdict, features_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(symbol, ts, horizon) DO UPDATE SET
                p_up = excluded.p_up, p_down = excluded.p_down,
                verdict = excluded.verdict, features_json = excluded.features_json",
            params![
                symbol,
                ts,
                horizon,
                snapshot.p_up,
                snapshot.p_down,
                snapshot.verdict.as_str(),
                features
            ],
        )?;
        Ok(())
    }

    pub fn latest_probability(
        &self,
        symbol: &str,
        horizon: &str,
    ) -> Result<Option<StoredProbability>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT ts, p_up, p_down, verdict, features_json FROM prob_signal
                 WHERE symbol = ?1 AND horizon = ?2 ORDER BY ts DESC LIMIT 1",
                params![symbol, horizon],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(ts, p_up, p_down, verdict, features)| StoredProbability {
            ts,
            horizon: horizon.to_string(),
            snapshot: ProbabilitySnapshot {
                p_up,
                p_down,
                verdict: Verdict::from_str(&verdict).unwrap_or_default(),
                features: features
                    .and_then(|f| serde_json::from_str(&f).ok())
                    .unwrap_or_default(),
            },
        }))
    }

    // ========== On-chain Methods ==========

    pub fn upsert_onchain(&self, symbol: &str, rows: &[OnchainRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO onchain_daily
                    (symbol, ts, active_addr, tx_count, gas_used, stable_netflow, whale_tx)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(symbol, ts) DO UPDATE SET
                    active_addr = excluded.active_addr, tx_count = excluded.tx_count,
                    gas_used = excluded.gas_used, stable_netflow = excluded.stable_netflow,
                    whale_tx = excluded.whale_tx",
            )?;
            for r in rows {
                stmt.execute(params![
                    symbol,
                    r.ts,
                    r.active_addr,
                    r.tx_count,
                    r.gas_used,
                    r.stable_netflow,
                    r.whale_tx
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn onchain_from_row(row: &Row<'_>) -> rusqlite::Result<OnchainRow> {
        Ok(OnchainRow {
            ts: row.get(0)?,
            active_addr: row.get(1)?,
            tx_count: row.get(2)?,
            gas_used: row.get(3)?,
            stable_netflow: row.get(4)?,
            whale_tx: row.get(5)?,
        })
    }

    /// All on-chain rows, oldest first.
    pub fn onchain_rows(&self, symbol: &str) -> Result<Vec<OnchainRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ts, active_addr, tx_count, gas_used, stable_netflow, whale_tx
             FROM onchain_daily WHERE symbol = ?1 ORDER BY ts ASC",
        )?;
        let rows = stmt
            .query_map(params![symbol], Self::onchain_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// The newest `limit` on-chain rows, oldest first.
    pub fn recent_onchain(&self, symbol: &str, limit: usize) -> Result<Vec<OnchainRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ts, active_addr, tx_count, gas_used, stable_netflow, whale_tx
             FROM onchain_daily WHERE symbol = ?1 ORDER BY ts DESC LIMIT ?2",
        )?;
        let mut rows = stmt
            .query_map(params![symbol, limit as i64], Self::onchain_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.reverse();
        Ok(rows)
    }

    pub fn latest_onchain(&self, symbol: &str) -> Result<Option<OnchainRow>> {
        Ok(self.recent_onchain(symbol, 1)?.pop())
    }

    // ========== Paper Trade Methods ==========

    const TRADE_COLUMNS: &'static str = "id, ts_open, ts_close, symbol, side, entry, qty, tp, sl,
        close_price, pnl, room, status";

    fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<PaperTrade> {
        let side: String = row.get(4)?;
        let status: String = row.get(12)?;
        Ok(PaperTrade {
            id: row.get(0)?,
            ts_open: row.get(1)?,
            ts_close: row.get(2)?,
            symbol: row.get(3)?,
            side: TradeSide::from_str(&side).unwrap_or(TradeSide::Long),
            entry: row.get(5)?,
            qty: row.get(6)?,
            tp: row.get(7)?,
            sl: row.get(8)?,
            close_price: row.get(9)?,
            pnl: row.get(10)?,
            room: row.get(11)?,
            status: TradeStatus::from_str(&status).unwrap_or(TradeStatus::Open),
        })
    }

    /// Store a new open trade. Returns its id.
    pub fn insert_paper_trade(&self, trade: &NewPaperTrade, ts_open: i64) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO paper_trades (ts_open, symbol, side, entry, qty, tp, sl, room, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'open')",
            params![
                ts_open,
                trade.symbol,
                trade.side.as_str(),
                trade.entry,
                trade.qty,
                trade.tp,
                trade.sl,
                trade.room
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn paper_trade(&self, id: i64) -> Result<Option<PaperTrade>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM paper_trades WHERE id = ?1", Self::TRADE_COLUMNS);
        let trade = conn
            .query_row(&sql, params![id], Self::trade_from_row)
            .optional()?;
        Ok(trade)
    }

    /// Newest trades first, optionally restricted to a room.
    pub fn list_paper_trades(&self, room: Option<&str>, limit: usize) -> Result<Vec<PaperTrade>> {
        let conn = self.lock()?;
        let trades = match room {
            Some(room) => {
                let sql = format!(
                    "SELECT {} FROM paper_trades WHERE room = ?1
                     ORDER BY ts_open DESC, id DESC LIMIT ?2",
                    Self::TRADE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![room, limit as i64], Self::trade_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM paper_trades ORDER BY ts_open DESC, id DESC LIMIT ?1",
                    Self::TRADE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![limit as i64], Self::trade_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(trades)
    }

    /// Trades with the given status: closed ones by close time, open ones by open time.
    pub fn trades_by_status(&self, status: TradeStatus) -> Result<Vec<PaperTrade>> {
        let order = match status {
            TradeStatus::Open => "ts_open ASC, id ASC",
            TradeStatus::Closed => "ts_close ASC, id ASC",
        };
        let sql = format!(
            "SELECT {} FROM paper_trades WHERE status = ?1 ORDER BY {}",
            Self::TRADE_COLUMNS,
            order
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![status.as_str()], Self::trade_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Mark an open trade closed. Returns false when no open trade had that id.
    pub fn close_paper_trade(
        &self,
        id: i64,
        ts_close: i64,
        close_price: f64,
        pnl: f64,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE paper_trades SET ts_close = ?1, close_price = ?2, pnl = ?3, status = 'closed'
             WHERE id = ?4 AND status = 'open'",
            params![ts_close, close_price, pnl, id],
        )?;
        Ok(updated == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureVector;

    fn daily(ts: i64, close: f64) -> Candle {
        Candle::new(ts, close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[test]
    fn test_candle_upsert_is_idempotent() {
        let store = SqliteStore::new_in_memory().unwrap();
        let candles = vec![daily(2, 101.0), daily(1, 100.0)];
        store.upsert_candles("BTC", Timeframe::OneDay, &candles).unwrap();
        store.upsert_candles("BTC", Timeframe::OneDay, &[daily(2, 105.0)]).unwrap();

        let rows = store.candles("BTC", Timeframe::OneDay).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ts, 1);
        assert_eq!(rows[1].close, 105.0);
        assert_eq!(store.candle_count("BTC", Timeframe::OneDay).unwrap(), 2);
        assert_eq!(store.candle_count("BTC", Timeframe::FourHours).unwrap(), 0);
        assert_eq!(store.last_close("BTC").unwrap(), Some(105.0));
        assert_eq!(store.last_close("ETH").unwrap(), None);
    }

    #[test]
    fn test_recent_candles_ascending() {
        let store = SqliteStore::new_in_memory().unwrap();
        let candles: Vec<Candle> = (0..10).map(|i| daily(i, 100.0 + i as f64)).collect();
        store.upsert_candles("ETH", Timeframe::OneDay, &candles).unwrap();

        let recent = store.recent_candles("ETH", Timeframe::OneDay, 3).unwrap();
        let ts: Vec<i64> = recent.iter().map(|c| c.ts).collect();
        assert_eq!(ts, vec![7, 8, 9]);
    }

    #[test]
    fn test_latest_levels_newest_per_method() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .insert_levels("BTC", 1, LevelMethod::Pivot, &[Band::new(1.0, 2.0, 0)])
            .unwrap();
        store
            .insert_levels("BTC", 2, LevelMethod::Pivot, &[Band::new(3.0, 4.0, 0)])
            .unwrap();
        store
            .insert_levels("BTC", 1, LevelMethod::Vbp, &[Band::new(5.0, 6.0, 9)])
            .unwrap();

        let levels = store.latest_levels("BTC").unwrap();
        assert_eq!(levels.pivot.as_ref().unwrap()[0].min, 3.0);
        assert_eq!(levels.vbp.as_ref().unwrap()[0].hits, 9);
        assert!(levels.swing.is_none());
        assert_eq!(levels.ts, Some(2));

        assert_eq!(store.latest_levels("ADA").unwrap(), LevelSet::default());
    }

    #[test]
    fn test_probability_upsert_and_read() {
        let store = SqliteStore::new_in_memory().unwrap();
        let snap = ProbabilitySnapshot {
            p_up: 0.7,
            p_down: 0.3,
            verdict: Verdict::Bull,
            features: FeatureVector {
                rsi: Some(60.0),
                ..Default::default()
            },
        };
        store.upsert_probability("BTC", 10, "1d", &snap).unwrap();
        store.upsert_probability("BTC", 10, "1d", &snap).unwrap();
        store
            .upsert_probability("BTC", 5, "1d", &ProbabilitySnapshot::neutral())
            .unwrap();

        let latest = store.latest_probability("BTC", "1d").unwrap().unwrap();
        assert_eq!(latest.ts, 10);
        assert_eq!(latest.snapshot, snap);
        assert!(store.latest_probability("BTC", "4h").unwrap().is_none());
    }

    #[test]
    fn test_onchain_roundtrip_keeps_nulls() {
        let store = SqliteStore::new_in_memory().unwrap();
        let rows = vec![
            OnchainRow {
                ts: 1,
                active_addr: Some(10),
                ..Default::default()
            },
            OnchainRow {
                ts: 2,
                tx_count: Some(20),
                stable_netflow: Some(-1.5),
                ..Default::default()
            },
        ];
        store.upsert_onchain("BTC", &rows).unwrap();
        store.upsert_onchain("BTC", &rows[1..]).unwrap();

        assert_eq!(store.onchain_rows("BTC").unwrap(), rows);
        assert_eq!(store.latest_onchain("BTC").unwrap(), Some(rows[1]));
        assert_eq!(store.recent_onchain("BTC", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_paper_trade_lifecycle() {
        let store = SqliteStore::new_in_memory().unwrap();
        let trade = NewPaperTrade {
            symbol: "BTC".to_string(),
            side: TradeSide::Long,
            entry: 100.0,
            qty: 2.0,
            tp: Some(120.0),
            sl: None,
            room: Some("alpha".to_string()),
        };
        let id = store.insert_paper_trade(&trade, 1_000).unwrap();
        let other = store
            .insert_paper_trade(&NewPaperTrade { room: None, ..trade.clone() }, 2_000)
            .unwrap();

        assert_eq!(store.list_paper_trades(None, 200).unwrap()[0].id, other);
        assert_eq!(store.list_paper_trades(Some("alpha"), 200).unwrap().len(), 1);

        assert!(store.close_paper_trade(id, 3_000, 110.0, 20.0).unwrap());
        assert!(!store.close_paper_trade(id, 4_000, 90.0, -20.0).unwrap());

        let closed = store.paper_trade(id).unwrap().unwrap();
        assert_eq!(closed.status, TradeStatus::Closed);
        assert_eq!(closed.pnl, Some(20.0));
        assert_eq!(closed.ts_close, Some(3_000));

        assert_eq!(store.trades_by_status(TradeStatus::Open).unwrap().len(), 1);
        assert_eq!(store.trades_by_status(TradeStatus::Closed).unwrap().len(), 1);
        assert!(store.paper_trade(999).unwrap().is_none());
    }

    #[test]
    fn test_ping() {
        SqliteStore::new_in_memory().unwrap().ping().unwrap();
    }
}
