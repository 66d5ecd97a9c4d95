//! USD to fiat conversion rates.

use super::cache::TtlCache;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const OPEN_ER_API_URL: &str = "https://open.er-api.com/v6/latest/USD";
const EXCHANGERATE_HOST_URL: &str = "https://api.exchangerate.host/latest";

/// Resolves USD→currency rates with a TTL cache.
///
/// Lookup order: fresh cache, open.er-api.com, exchangerate.host, stale cache,
/// then `1.0`. Never fails.
pub struct FxService {
    client: Client,
    cache: TtlCache<f64>,
    primary_url: String,
    secondary_url: String,
}

impl FxService {
    pub fn new(client: Client, ttl: Duration) -> Self {
        Self::with_urls(client, ttl, OPEN_ER_API_URL, EXCHANGERATE_HOST_URL)
    }

    pub fn with_urls(
        client: Client,
        ttl: Duration,
        primary_url: impl Into<String>,
        secondary_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl),
            primary_url: primary_url.into(),
            secondary_url: secondary_url.into(),
        }
    }

    /// Seed or override a rate, e.g. for offline use.
    pub fn set_rate(&self, currency: &str, rate: f64) {
        self.cache.set(currency.to_uppercase(), rate);
    }

    /// Rate to multiply USD amounts by.
    pub async fn rate(&self, currency: &str) -> f64 {
        let cur = normalize_currency(currency);
        if cur == "USD" {
            return 1.0;
        }
        if let Some(rate) = self.cache.get(&cur) {
            return rate;
        }

        let secondary = format!("{}?base=USD&symbols={}", self.secondary_url, cur);
        for url in [self.primary_url.as_str(), secondary.as_str()] {
            match self.fetch_rate(url, &cur).await {
                Ok(Some(rate)) => {
                    debug!("FX USD->{} = {}", cur, rate);
                    self.cache.set(cur.clone(), rate);
                    return rate;
                }
                Ok(None) => debug!("FX provider {} has no rate for {}", url, cur),
                Err(e) => debug!("FX provider {} failed: {}", url, e),
            }
        }

        match self.cache.get_stale(&cur) {
            Some(rate) => {
                warn!("FX providers unavailable, using stale USD->{} rate", cur);
                rate
            }
            None => {
                warn!("FX providers unavailable, no rate for {}; using 1", cur);
                1.0
            }
        }
    }

    async fn fetch_rate(&self, url: &str, currency: &str) -> anyhow::Result<Option<f64>> {
        let data: Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(extract_rate(&data, currency))
    }
}

/// Upper-cased currency code, `USD` when blank.
pub fn normalize_currency(currency: &str) -> String {
    let cur = currency.trim().to_uppercase();
    if cur.is_empty() {
        "USD".to_string()
    } else {
        cur
    }
}

fn extract_rate(data: &Value, currency: &str) -> Option<f64> {
    data.get("rates")?
        .get(currency)?
        .as_f64()
        .filter(|r| *r > 0.0)
}
