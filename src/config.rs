use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::signals::PlanPolicy;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite database file.
    pub database_path: String,
    /// Seconds between scheduled syncs of every symbol.
    pub sync_interval_secs: u64,
    /// CoinGecko API base URL.
    pub coingecko_base: String,
    /// FX rate cache lifetime.
    pub fx_cache_ttl_secs: u64,
    /// Fear & Greed cache lifetime.
    pub sentiment_cache_ttl_secs: u64,
    /// Symbols with fewer daily candles are synced at startup.
    pub bootstrap_min_candles: usize,
    /// Maximum stop distance as a fraction of price.
    pub max_risk_pct: f64,
    /// Band snap tolerance for the stop, as a fraction of price.
    pub sl_snap_pct: f64,
    /// Timeout for outbound HTTP requests.
    pub http_timeout_secs: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8080),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "chainscope.db".to_string()),
            sync_interval_secs: env_or("SYNC_INTERVAL_SECS", 900),
            coingecko_base: env::var("COINGECKO_BASE")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string()),
            fx_cache_ttl_secs: env_or("FX_CACHE_TTL_SECS", 3600),
            sentiment_cache_ttl_secs: env_or("SENTIMENT_CACHE_TTL_SECS", 1800),
            bootstrap_min_candles: env_or("BOOTSTRAP_MIN_CANDLES", 10),
            max_risk_pct: env_or("MAX_RISK_PCT", 0.10),
            sl_snap_pct: env_or("SL_SNAP_PCT", 0.01),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", 20),
        }
    }

    /// Planner policy built from the risk settings.
    pub fn plan_policy(&self) -> PlanPolicy {
        PlanPolicy {
            max_risk_pct: self.max_risk_pct,
            snap_tolerance_pct: self.sl_snap_pct,
            ..PlanPolicy::default()
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "chainscope.db".to_string(),
            sync_interval_secs: 900,
            coingecko_base: "https://api.coingecko.com/api/v3".to_string(),
            fx_cache_ttl_secs: 3600,
            sentiment_cache_ttl_secs: 1800,
            bootstrap_min_candles: 10,
            max_risk_pct: 0.10,
            sl_snap_pct: 0.01,
            http_timeout_secs: 20,
        }
    }
}
