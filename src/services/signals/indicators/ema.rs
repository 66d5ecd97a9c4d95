//! Exponential Moving Average (EMA) indicator.

/// EMA (Exponential Moving Average) indicator.
///
/// Seeded with the first value rather than an SMA, so the series is defined
/// from the first bar even when there are fewer values than `period`.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Smoothing factor `2 / (period + 1)`.
    pub fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// EMA series, same length as `values`.
    pub fn series(&self, values: &[f64]) -> Vec<f64> {
        let k = self.multiplier();
        let mut out = Vec::with_capacity(values.len());
        let mut prev = match values.first() {
            Some(first) => *first,
            None => return out,
        };

        out.push(prev);
        for v in values.iter().skip(1) {
            prev = v * k + prev * (1.0 - k);
            out.push(prev);
        }
        out
    }

    /// Difference between the last two EMA values.
    pub fn slope(&self, values: &[f64]) -> Option<f64> {
        let ema = self.series(values);
        match ema.len() {
            n if n >= 2 => Some(ema[n - 1] - ema[n - 2]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_first_value_is_seed() {
        let ema = Ema::new(10).series(&[5.0, 6.0, 7.0]);
        assert_eq!(ema.len(), 3);
        assert_eq!(ema[0], 5.0);
    }

    #[test]
    fn test_ema_recurrence() {
        let ema = Ema::new(3).series(&[10.0, 20.0]);
        // k = 0.5
        assert_eq!(ema[1], 15.0);
    }

    #[test]
    fn test_ema_short_input_defined() {
        let ema = Ema::new(50).series(&[1.0, 2.0]);
        assert_eq!(ema.len(), 2);
        assert!(ema[1] > 1.0 && ema[1] < 2.0);
    }

    #[test]
    fn test_ema_empty() {
        assert!(Ema::new(5).series(&[]).is_empty());
        assert!(Ema::new(5).slope(&[1.0]).is_none());
    }

    #[test]
    fn test_ema_slope_sign() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert!(Ema::new(20).slope(&rising).unwrap() > 0.0);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert!(Ema::new(20).slope(&falling).unwrap() < 0.0);
    }
}
