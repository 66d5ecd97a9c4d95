//! Fear & Greed index from alternative.me.

use super::cache::TtlCache;
use crate::types::FearGreed;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const FNG_URL: &str = "https://api.alternative.me/fng/?limit=1&format=json";
const CACHE_KEY: &str = "fng";

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngItem>,
}

#[derive(Debug, Default, Deserialize)]
struct FngItem {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    value_classification: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Outcome of a Fear & Greed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FearGreedLookup {
    Fresh(FearGreed),
    Cached(FearGreed),
    /// Provider failed; carries the placeholder reading.
    Unavailable(FearGreed),
}

impl FearGreedLookup {
    pub fn reading(&self) -> &FearGreed {
        match self {
            Self::Fresh(fg) | Self::Cached(fg) | Self::Unavailable(fg) => fg,
        }
    }
}

pub struct SentimentService {
    client: Client,
    cache: TtlCache<FearGreed>,
    url: String,
}

impl SentimentService {
    pub fn new(client: Client, ttl: Duration) -> Self {
        Self::with_url(client, ttl, FNG_URL)
    }

    pub fn with_url(client: Client, ttl: Duration, url: impl Into<String>) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl),
            url: url.into(),
        }
    }

    pub async fn fear_greed(&self) -> FearGreedLookup {
        if let Some(fg) = self.cache.get(CACHE_KEY) {
            return FearGreedLookup::Cached(fg);
        }
        // Expired readings are never served.
        self.cache.cleanup();

        let now = chrono::Utc::now().timestamp_millis();
        match self.fetch().await {
            Ok(body) => {
                let fg = reading_from(body, now);
                self.cache.set(CACHE_KEY, fg.clone());
                FearGreedLookup::Fresh(fg)
            }
            Err(e) => {
                warn!("Fear & Greed fetch failed: {}", e);
                FearGreedLookup::Unavailable(FearGreed::unavailable(now))
            }
        }
    }

    async fn fetch(&self) -> anyhow::Result<FngResponse> {
        Ok(self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

/// Reading from the first item; the classification is derived when absent.
fn reading_from(body: FngResponse, now: i64) -> FearGreed {
    let item = body.data.into_iter().next().unwrap_or_default();
    let value = item
        .value
        .as_deref()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0) as i64;
    let classification = item
        .value_classification
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| FearGreed::classify(value).to_string());
    let ts = item
        .timestamp
        .as_deref()
        .and_then(|t| t.parse::<i64>().ok())
        .map(|secs| secs * 1000)
        .unwrap_or(now);

    FearGreed {
        value: Some(value),
        classification,
        ts,
    }
}
