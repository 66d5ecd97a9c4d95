//! Relative Strength Index (RSI) indicator.

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100. Averages are seeded with the simple mean of the
/// first `period` deltas and then Wilder-smoothed.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }

    /// RSI series, same length as `closes`. Indices before `period` are `None`,
    /// and the whole series is `None` when there are fewer than `period + 1` closes.
    pub fn series(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let period = self.period;
        let mut out = vec![None; closes.len()];
        if period == 0 || closes.len() < self.min_periods() {
            return out;
        }

        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 1..=period {
            let change = closes[i] - closes[i - 1];
            if change >= 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let mut avg_gain = gains / period as f64;
        let mut avg_loss = losses / period as f64;
        out[period] = Some(Self::value(avg_gain, avg_loss));

        for i in (period + 1)..closes.len() {
            let change = closes[i] - closes[i - 1];
            avg_gain = (avg_gain * (period - 1) as f64 + change.max(0.0)) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + (-change).max(0.0)) / period as f64;
            out[i] = Some(Self::value(avg_gain, avg_loss));
        }

        out
    }

    /// RSI at the last bar.
    pub fn latest(&self, closes: &[f64]) -> Option<f64> {
        self.series(closes).last().copied().flatten()
    }
}
