//! Support/resistance band detection.
//!
//! Three independent detectors over an ascending candle series. Each returns a
//! fresh band list; the caller attaches the method tag.

use crate::types::{Band, Candle, LevelMethod, LevelSet};

/// Pivot band half-width as a fraction of the close.
const PIVOT_HALF_WIDTH: f64 = 0.003;

/// Classic floor-trader pivots from the most recent candle.
///
/// Emits five bands centred at S2, S1, P, R1, R2 (ascending), each
/// `0.3%` of the close wide on either side, with zero hits.
pub fn pivot_bands(candles: &[Candle]) -> Vec<Band> {
    let last = match candles.last() {
        Some(c) => c,
        None => return Vec::new(),
    };

    let (h, l, c) = (last.high, last.low, last.close);
    let p = (h + l + c) / 3.0;
    let r1 = 2.0 * p - l;
    let s1 = 2.0 * p - h;
    let r2 = p + (h - l);
    let s2 = p - (h - l);
    let width = c * PIVOT_HALF_WIDTH;

    [s2, s1, p, r1, r2]
        .iter()
        .map(|centre| Band::new(centre - width, centre + width, 0))
        .collect()
}

/// Swing high/low detector.
#[derive(Debug, Clone, Copy)]
pub struct SwingDetector {
    /// Bars on each side of the candidate.
    pub lookback: usize,
    /// Relative distance above a band's max within which a point joins it.
    pub proximity: f64,
}

impl Default for SwingDetector {
    fn default() -> Self {
        Self {
            lookback: 5,
            proximity: 0.01,
        }
    }
}

impl SwingDetector {
    /// Swing points in ascending price order.
    ///
    /// A bar is a swing high (low) when its high (low) is strictly above
    /// (below) every other bar within `lookback` on each side.
    pub fn points(&self, candles: &[Candle]) -> Vec<f64> {
        let w = self.lookback;
        if candles.len() < 2 * w + 1 {
            return Vec::new();
        }

        let mut points = Vec::new();
        for i in w..candles.len() - w {
            let window = (i - w..=i + w).filter(|k| *k != i);
            let (h, l) = (candles[i].high, candles[i].low);

            let mut is_high = true;
            let mut is_low = true;
            for k in window {
                if candles[k].high >= h {
                    is_high = false;
                }
                if candles[k].low <= l {
                    is_low = false;
                }
            }

            if is_high {
                points.push(h);
            }
            if is_low {
                points.push(l);
            }
        }

        points.sort_by(|a, b| a.total_cmp(b));
        points
    }

    /// Greedily merge ascending swing points into bands.
    pub fn bands(&self, candles: &[Candle]) -> Vec<Band> {
        let mut bands: Vec<Band> = Vec::new();
        for p in self.points(candles) {
            match bands.last_mut() {
                Some(last) if (p - last.max) / last.max <= self.proximity => {
                    last.max = last.max.max(p);
                    last.min = last.min.min(p);
                    last.hits += 1;
                }
                _ => bands.push(Band::new(p, p, 1)),
            }
        }
        bands
    }
}

/// Volume-by-price histogram detector.
#[derive(Debug, Clone, Copy)]
pub struct VolumeProfile {
    pub buckets: usize,
    pub top: usize,
}

impl Default for VolumeProfile {
    fn default() -> Self {
        Self { buckets: 12, top: 5 }
    }
}

impl VolumeProfile {
    /// Top buckets by accumulated volume, re-sorted ascending by `min`.
    /// Empty when the series has no price range.
    pub fn bands(&self, candles: &[Candle]) -> Vec<Band> {
        if candles.is_empty() || self.buckets == 0 {
            return Vec::new();
        }

        let min_p = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let max_p = candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let width = (max_p - min_p) / self.buckets as f64;
        if !(width > 0.0) {
            return Vec::new();
        }

        let mut volumes = vec![0.0_f64; self.buckets];
        for c in candles {
            let idx = ((c.close - min_p) / width).floor();
            let idx = if idx < 0.0 {
                0
            } else {
                (idx as usize).min(self.buckets - 1)
            };
            volumes[idx] += c.volume;
        }

        let mut bands: Vec<Band> = volumes
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Band::new(
                    min_p + i as f64 * width,
                    min_p + (i + 1) as f64 * width,
                    v.round().max(0.0) as u64,
                )
            })
            .collect();

        // Stable sort keeps lower buckets first among equal volumes.
        bands.sort_by(|a, b| b.hits.cmp(&a.hits));
        bands.truncate(self.top);
        bands.sort_by(|a, b| a.min.total_cmp(&b.min));
        bands
    }
}

/// Run all three detectors with default parameters.
pub fn detect_all(candles: &[Candle]) -> LevelSet {
    let mut levels = LevelSet::default();
    levels.set(LevelMethod::Pivot, pivot_bands(candles));
    levels.set(LevelMethod::Swing, SwingDetector::default().bands(candles));
    levels.set(LevelMethod::Vbp, VolumeProfile::default().bands(candles));
    levels.ts = candles.last().map(|c| c.ts);
    levels
}
