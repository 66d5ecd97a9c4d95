//! MACD (Moving Average Convergence Divergence) indicator.

use super::Ema;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD output series, each the same length as the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub hist: Vec<f64>,
}

impl MacdSeries {
    /// `(macd, signal, hist)` at the last bar.
    pub fn latest(&self) -> Option<(f64, f64, f64)> {
        Some((
            *self.macd_line.last()?,
            *self.signal_line.last()?,
            *self.hist.last()?,
        ))
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    pub fn series(&self, closes: &[f64]) -> MacdSeries {
        let fast = Ema::new(self.fast_period).series(closes);
        let slow = Ema::new(self.slow_period).series(closes);

        let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = Ema::new(self.signal_period).series(&macd_line);
        let hist = macd_line
            .iter()
            .zip(&signal_line)
            .map(|(m, s)| m - s)
            .collect();

        MacdSeries {
            macd_line,
            signal_line,
            hist,
        }
    }
}
