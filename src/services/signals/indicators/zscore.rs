//! Rolling z-score.

/// Rolling z-score over a trailing window.
///
/// The window is clipped at the start of the series and missing samples are
/// skipped. Uses the sample standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct ZScore {
    window: usize,
}

impl Default for ZScore {
    fn default() -> Self {
        Self { window: 20 }
    }
}

impl ZScore {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Z-score series, same length as `series`.
    ///
    /// `None` where the window holds fewer than two samples or the current
    /// value itself is missing; `0` where the window has no spread.
    pub fn series<T>(&self, series: &[T]) -> Vec<Option<f64>>
    where
        T: Into<Option<f64>> + Copy,
    {
        let values: Vec<Option<f64>> = series.iter().map(|v| (*v).into()).collect();
        let window = self.window.max(1);

        (0..values.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(window);
                let slice: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
                if slice.len() < 2 {
                    return None;
                }

                let n = slice.len() as f64;
                let mean = slice.iter().sum::<f64>() / n;
                let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                let sd = var.sqrt();
                if sd == 0.0 {
                    return Some(0.0);
                }
                values[i].map(|v| (v - mean) / sd)
            })
            .collect()
    }

    pub fn latest<T>(&self, series: &[T]) -> Option<f64>
    where
        T: Into<Option<f64>> + Copy,
    {
        self.series(series).last().copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zscore_first_is_null() {
        let z = ZScore::default().series(&[1.0, 2.0, 3.0]);
        assert!(z[0].is_none());
        assert!(z[1].is_some());
    }

    #[test]
    fn test_zscore_constant_is_zero() {
        let z = ZScore::default().series(&[5.0; 10]);
        assert!(z[1..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_zscore_sample_sd() {
        // mean 2, sample sd 1
        let z = ZScore::new(3).series(&[1.0, 2.0, 3.0]);
        assert!((z[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zscore_window_clips() {
        // window 2 at the last index only sees the last two values
        let z = ZScore::new(2).series(&[100.0, 1.0, 3.0]);
        let expected = (3.0 - 2.0) / 2.0_f64.sqrt();
        assert!((z[2].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zscore_skips_missing() {
        let series = [Some(1.0), None, Some(3.0), None];
        let z = ZScore::default().series(&series);
        assert!(z[1].is_none());
        assert!(z[2].is_some());
        assert!(z[3].is_none());
    }

    #[test]
    fn test_zscore_spike() {
        let mut volumes = vec![100.0; 19];
        volumes.push(1000.0);
        assert!(ZScore::default().latest(&volumes).unwrap() > 1.0);
    }
}
