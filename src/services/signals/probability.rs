//! Rule-based up/down probability.
//!
//! Features at the last bar feed an additive score which is mapped to a
//! bounded probability and a three-way verdict.

use super::indicators::{Ema, Macd, Rsi, ZScore};
use crate::types::{Candle, FeatureVector, OnchainRow, ProbabilitySnapshot, Verdict};

/// Bars needed before scoring; shorter series score neutral.
pub const MIN_BARS: usize = 40;

/// On-chain growth is measured over this many rows.
const ONCHAIN_LOOKBACK: usize = 5;

const P_MIN: f64 = 0.01;
const P_MAX: f64 = 0.99;

/// Compute the feature vector at the last bar.
///
/// Returns `None` when there are fewer than [`MIN_BARS`] candles.
pub fn features(candles: &[Candle], onchain: Option<&[OnchainRow]>) -> Option<FeatureVector> {
    if candles.len() < MIN_BARS {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let macd = Macd::default().series(&closes);
    let (macd_line, macd_signal, macd_hist) = match macd.latest() {
        Some((m, s, h)) => (Some(m), Some(s), Some(h)),
        None => (None, None, None),
    };

    let mut fv = FeatureVector {
        rsi: Rsi::default().latest(&closes),
        macd: macd_line,
        macd_signal,
        macd_hist,
        ma20_slope: Ema::new(20).slope(&closes),
        ma50_slope: Ema::new(50).slope(&closes),
        volume_z: ZScore::default().latest(&volumes),
        ..Default::default()
    };

    if let Some(rows) = onchain.filter(|rows| rows.len() > ONCHAIN_LOOKBACK) {
        let last = &rows[rows.len() - 1];
        let base = &rows[rows.len() - 1 - ONCHAIN_LOOKBACK];
        let growth = |now: Option<i64>, then: Option<i64>| {
            (now.unwrap_or(0) - then.unwrap_or(0)) as f64
        };
        fv.active_growth_5d = Some(growth(last.active_addr, base.active_addr));
        fv.tx_growth_5d = Some(growth(last.tx_count, base.tx_count));
    }

    Some(fv)
}

/// Additive score of a feature vector. Each rule contributes once.
pub fn score_features(fv: &FeatureVector) -> f64 {
    let mut score = 0.0;

    if let Some(rsi) = fv.rsi {
        if rsi > 55.0 {
            score += 0.15;
        } else if rsi < 45.0 {
            score -= 0.15;
        }
    }

    if let (Some(macd), Some(signal)) = (fv.macd, fv.macd_signal) {
        if macd > signal {
            score += 0.2;
        } else {
            score -= 0.2;
        }
    }

    // Missing slopes count against the trend.
    if fv.ma20_slope.map_or(false, |s| s > 0.0) {
        score += 0.2;
    } else {
        score -= 0.1;
    }
    if fv.ma50_slope.map_or(false, |s| s > 0.0) {
        score += 0.1;
    } else {
        score -= 0.1;
    }

    if fv.volume_z.map_or(false, |z| z > 1.0) {
        score += 0.1;
    }
    if fv.active_growth_5d.map_or(false, |g| g > 0.0) {
        score += 0.1;
    }
    if fv.tx_growth_5d.map_or(false, |g| g > 0.0) {
        score += 0.05;
    }

    score
}

/// Map a score to a probability snapshot.
pub fn snapshot_from_score(score: f64, features: FeatureVector) -> ProbabilitySnapshot {
    let p_up = (0.5 + score).clamp(P_MIN, P_MAX);
    let p_down = 1.0 - p_up;
    let verdict = if p_up > 0.6 {
        Verdict::Bull
    } else if p_up < 0.4 {
        Verdict::Bear
    } else {
        Verdict::Neutral
    };

    ProbabilitySnapshot {
        p_up,
        p_down,
        verdict,
        features,
    }
}

/// Score a candle series (plus optional on-chain rows).
pub fn probability(candles: &[Candle], onchain: Option<&[OnchainRow]>) -> ProbabilitySnapshot {
    match features(candles, onchain) {
        Some(fv) => snapshot_from_score(score_features(&fv), fv),
        None => ProbabilitySnapshot::neutral(),
    }
}
