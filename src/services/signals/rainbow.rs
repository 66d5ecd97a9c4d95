//! Log-linear "rainbow" regression bands.

use serde::{Deserialize, Serialize};

use crate::types::Candle;

/// Band offsets in residual standard deviations, lowest first.
pub const BAND_SIGMAS: [f64; 7] = [-2.5, -1.5, -0.5, 0.0, 0.5, 1.5, 2.5];

/// Days projected past the last candle.
pub const PROJECTION_DAYS: usize = 365;

const DAY_MS: i64 = 86_400_000;
const MIN_PRICE: f64 = 1e-9;

/// Where the latest close sits relative to the bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainbowZone {
    DeepValue,
    Undervalued,
    SlightlyUndervalued,
    FairValue,
    SlightlyOvervalued,
    Overvalued,
    Overheated,
}

/// Least-squares fit of `ln(close) = a + b * index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogFit {
    pub a: f64,
    pub b: f64,
    /// Sample standard deviation of the residuals.
    pub sigma: f64,
}

impl LogFit {
    /// Band prices at bar index `t`.
    pub fn bands_at(&self, t: f64) -> [f64; 7] {
        let f = self.a + self.b * t;
        BAND_SIGMAS.map(|k| (f + k * self.sigma).exp())
    }

    pub fn fair_value_at(&self, t: f64) -> f64 {
        (self.a + self.b * t).exp()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainbowPoint {
    pub ts: i64,
    pub close: Option<f64>,
    pub bands: [f64; 7],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rainbow {
    pub fit: LogFit,
    pub zone: RainbowZone,
    pub latest_close: f64,
    pub fair_value: f64,
    pub fair_value_1y: f64,
    pub current_bands: [f64; 7],
    pub projected_bands: [f64; 7],
    pub history: Vec<RainbowPoint>,
    pub projection: Vec<RainbowPoint>,
}

/// Ordinary least squares `y = a + b x`.
fn linear_regression(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    if x.is_empty() {
        return (0.0, 0.0);
    }
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_xx: f64 = x.iter().map(|a| a * a).sum();

    let denom = match n * sum_xx - sum_x * sum_x {
        d if d == 0.0 => 1e-9,
        d => d,
    };
    let b = (n * sum_xy - sum_x * sum_y) / denom;
    let a = (sum_y - b * sum_x) / n;
    (a, b)
}

/// Fit the log-price regression over the closes.
pub fn fit(closes: &[f64]) -> LogFit {
    let t: Vec<f64> = (0..closes.len()).map(|i| i as f64).collect();
    let log_p: Vec<f64> = closes.iter().map(|c| c.max(MIN_PRICE).ln()).collect();
    let (a, b) = linear_regression(&t, &log_p);

    let ss: f64 = log_p
        .iter()
        .zip(&t)
        .map(|(y, x)| (y - (a + b * x)).powi(2))
        .sum();
    let dof = closes.len().saturating_sub(1).max(1) as f64;

    LogFit {
        a,
        b,
        sigma: (ss / dof).sqrt(),
    }
}

fn zone_for(price: f64, bands: &[f64; 7]) -> RainbowZone {
    const ZONES: [RainbowZone; 6] = [
        RainbowZone::DeepValue,
        RainbowZone::Undervalued,
        RainbowZone::SlightlyUndervalued,
        RainbowZone::FairValue,
        RainbowZone::SlightlyOvervalued,
        RainbowZone::Overvalued,
    ];
    ZONES
        .iter()
        .zip(bands.iter())
        .find(|(_, edge)| price <= **edge)
        .map(|(zone, _)| *zone)
        .unwrap_or(RainbowZone::Overheated)
}

/// Build rainbow bands over daily candles. `None` for an empty series.
pub fn rainbow(candles: &[Candle]) -> Option<Rainbow> {
    let last = candles.last()?;
    let closes: Vec<f64> = candles.iter().map(|c| c.close.max(MIN_PRICE)).collect();
    let fit = fit(&closes);
    let last_idx = (closes.len() - 1) as f64;

    let history = candles
        .iter()
        .enumerate()
        .map(|(i, c)| RainbowPoint {
            ts: c.ts,
            close: Some(c.close),
            bands: fit.bands_at(i as f64),
        })
        .collect();

    let projection = (1..=PROJECTION_DAYS)
        .map(|d| RainbowPoint {
            ts: last.ts + d as i64 * DAY_MS,
            close: None,
            bands: fit.bands_at(last_idx + d as f64),
        })
        .collect();

    let latest_close = closes[closes.len() - 1];
    let current_bands = fit.bands_at(last_idx);
    let horizon = last_idx + PROJECTION_DAYS as f64;

    Some(Rainbow {
        fit,
        zone: zone_for(latest_close, &current_bands),
        latest_close,
        fair_value: fit.fair_value_at(last_idx),
        fair_value_1y: fit.fair_value_at(horizon),
        current_bands,
        projected_bands: fit.bands_at(horizon),
        history,
        projection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Candle::new(i as i64 * DAY_MS, *c, *c, *c, *c, 0.0))
            .collect()
    }

    #[test]
    fn test_exact_exponential_fit() {
        let closes: Vec<f64> = (0..50).map(|i| (1.0 + 0.01 * i as f64).exp()).collect();
        let fit = fit(&closes);
        assert!((fit.a - 1.0).abs() < 1e-9);
        assert!((fit.b - 0.01).abs() < 1e-9);
        assert!(fit.sigma < 1e-6);
    }

    #[test]
    fn test_single_point_uses_fallback_denominator() {
        let fit = fit(&[100.0]);
        assert_eq!(fit.b, 0.0);
        assert!((fit.a - 100.0_f64.ln()).abs() < 1e-12);
        assert_eq!(fit.sigma, 0.0);
    }

    #[test]
    fn test_bands_ordered() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 * (1.0 + 0.3 * ((i as f64) / 5.0).sin()))
            .collect();
        let rb = rainbow(&daily(&closes)).unwrap();
        assert!(rb.current_bands.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(rb.history.len(), 100);
        assert_eq!(rb.projection.len(), PROJECTION_DAYS);
        assert_eq!(rb.projection[0].ts, 100 * DAY_MS);
        assert!((rb.current_bands[3] - rb.fair_value).abs() < 1e-9);
    }

    #[test]
    fn test_zone_lookup() {
        let bands = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(zone_for(0.5, &bands), RainbowZone::DeepValue);
        assert_eq!(zone_for(4.0, &bands), RainbowZone::FairValue);
        assert_eq!(zone_for(5.5, &bands), RainbowZone::Overvalued);
        assert_eq!(zone_for(6.5, &bands), RainbowZone::Overheated);
    }

    #[test]
    fn test_empty() {
        assert!(rainbow(&[]).is_none());
    }
}
