//! Average True Range (ATR) indicator.

use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|), with the first bar's
/// TR being plain High-Low. Wilder-smoothed from the mean of TR[1..=period].
#[derive(Debug, Clone, Copy)]
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn min_periods(&self) -> usize {
        self.period + 1
    }

    /// Calculate True Range.
    fn true_range(current: &Candle, previous: Option<&Candle>) -> f64 {
        let hl = current.high - current.low;
        match previous {
            Some(prev) => {
                let hc = (current.high - prev.close).abs();
                let lc = (current.low - prev.close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }

    /// ATR at the last bar, `None` with fewer than `period + 1` candles.
    pub fn calculate(&self, candles: &[Candle]) -> Option<f64> {
        if self.period == 0 || candles.len() < self.min_periods() {
            return None;
        }

        let true_ranges: Vec<f64> = candles
            .iter()
            .enumerate()
            .map(|(i, c)| Self::true_range(c, i.checked_sub(1).map(|p| &candles[p])))
            .collect();

        let period = self.period as f64;
        let mut atr = true_ranges[1..=self.period].iter().sum::<f64>() / period;
        for tr in true_ranges.iter().skip(self.period + 1) {
            atr = (atr * (period - 1.0) + tr) / period;
        }

        Some(atr)
    }
}
