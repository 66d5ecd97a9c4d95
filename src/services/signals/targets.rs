//! Take-profit / stop-loss planning.
//!
//! The planner anchors the stop to the nearest band on the loss side, caps the
//! stop distance, and picks targets at fixed reward multiples snapped outward
//! to the next band.

use crate::types::{
    Band, LevelMethod, PlanSide, TaggedBand, TargetCandidate, TargetPlan, Verdict,
};

/// Risk policy for the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanPolicy {
    /// Maximum stop distance as a fraction of price.
    pub max_risk_pct: f64,
    /// A band within this fraction of price from the capped stop replaces it.
    pub snap_tolerance_pct: f64,
    pub tp1_multiple: f64,
    pub tp2_multiple: f64,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            max_risk_pct: 0.10,
            snap_tolerance_pct: 0.01,
            tp1_multiple: 1.8,
            tp2_multiple: 3.0,
        }
    }
}

/// Raw plan prices before display checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPlan {
    pub side: PlanSide,
    pub entry: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub sl: f64,
}

/// Band mids above `price` ascending, and below `price` descending.
fn split_mids(price: f64, bands: &[TaggedBand]) -> (Vec<f64>, Vec<f64>) {
    let mut upper: Vec<f64> = bands.iter().map(|b| b.mid()).filter(|m| *m > price).collect();
    let mut lower: Vec<f64> = bands.iter().map(|b| b.mid()).filter(|m| *m < price).collect();
    upper.sort_by(|a, b| a.total_cmp(b));
    lower.sort_by(|a, b| b.total_cmp(a));
    (upper, lower)
}

impl PlanPolicy {
    /// Stop price for a position, `dir` being `+1` for long and `-1` for short.
    fn stop(&self, price: f64, band_stop: Option<f64>, dir: f64) -> f64 {
        let band_risk = band_stop.map(|b| dir * (price - b) / price);
        let risk_pct = band_risk.map_or(self.max_risk_pct, |r| r.min(self.max_risk_pct));
        let candidate = price * (1.0 - dir * risk_pct);

        match band_stop {
            Some(b) if (b - candidate).abs() / price < self.snap_tolerance_pct => b,
            _ => candidate,
        }
    }

    /// Build a long or short plan; neutral verdicts and non-positive prices yield `None`.
    pub fn plan(&self, price: f64, verdict: Verdict, bands: &[TaggedBand]) -> Option<RiskPlan> {
        if !(price > 0.0) {
            return None;
        }
        let (upper, lower) = split_mids(price, bands);

        let (side, dir, targets_side, stop_side) = match verdict {
            Verdict::Bull => (PlanSide::Long, 1.0, &upper, &lower),
            Verdict::Bear => (PlanSide::Short, -1.0, &lower, &upper),
            Verdict::Neutral => return None,
        };

        let sl = self.stop(price, stop_side.first().copied(), dir);
        let risk = dir * (price - sl);
        let target1 = price + dir * self.tp1_multiple * risk;
        let target2 = price + dir * self.tp2_multiple * risk;

        // Targets sides are ordered nearest-first, so `find` returns the
        // closest band at or beyond the raw target.
        let beyond = |raw: f64| targets_side.iter().copied().find(|m| dir * (m - raw) >= 0.0);
        let tp1 = beyond(target1).unwrap_or(target1);
        let mut tp2 = beyond(target2).unwrap_or(target2);

        // Both targets collapsed onto a band at or past the raw TP2. Move TP2
        // to the next band out, else one multiple gap past TP1.
        if dir * (tp2 - tp1) <= 0.0 {
            let gap = (self.tp2_multiple - self.tp1_multiple).abs() * risk;
            tp2 = targets_side
                .iter()
                .copied()
                .find(|m| dir * (m - tp1) > 0.0)
                .unwrap_or(tp1 + dir * gap);
        }

        Some(RiskPlan {
            side,
            entry: price,
            tp1,
            tp2,
            sl,
        })
    }
}

impl TargetPlan {
    /// Display form of a plan: signed percentages, with prices on the wrong
    /// side of entry blanked out.
    pub fn from_plan(plan: Option<RiskPlan>) -> Self {
        let plan = match plan {
            Some(p) if p.side != PlanSide::None => p,
            _ => return TargetPlan::default(),
        };

        let entry = plan.entry;
        let dir = if plan.side == PlanSide::Long { 1.0 } else { -1.0 };
        let target = |tp: f64| {
            if dir * (tp - entry) > 0.0 {
                (Some(tp), Some(dir * (tp - entry) / entry * 100.0))
            } else {
                (None, None)
            }
        };
        let (tp1, tp1_pct) = target(plan.tp1);
        let (tp2, tp2_pct) = target(plan.tp2);
        let (sl, sl_pct) = if dir * (entry - plan.sl) > 0.0 {
            (Some(plan.sl), Some(-(dir * (entry - plan.sl)) / entry * 100.0))
        } else {
            (None, None)
        };

        TargetPlan {
            side: plan.side,
            entry: Some(entry),
            tp1,
            tp2,
            sl,
            tp1_pct,
            tp2_pct,
            sl_pct,
        }
    }
}

/// Plan and convert for display in one step.
pub fn plan_targets(
    policy: &PlanPolicy,
    price: f64,
    verdict: Verdict,
    bands: &[TaggedBand],
) -> TargetPlan {
    TargetPlan::from_plan(policy.plan(price, verdict, bands))
}

/// Nearby levels in the verdict direction plus ATR projections.
///
/// Bullish verdicts look above the close, everything else below.
pub fn candidate_targets(
    close: f64,
    verdict: Verdict,
    bands: &[TaggedBand],
    atr: Option<f64>,
) -> Vec<TargetCandidate> {
    if !(close > 0.0) {
        return Vec::new();
    }

    let bull = verdict == Verdict::Bull;
    let mut picked: Vec<&TaggedBand> = bands
        .iter()
        .filter(|b| if bull { b.mid() > close } else { b.mid() < close })
        .collect();
    if bull {
        picked.sort_by(|a, b| a.mid().total_cmp(&b.mid()));
    } else {
        picked.sort_by(|a, b| b.mid().total_cmp(&a.mid()));
    }

    let mut out: Vec<TargetCandidate> = picked
        .into_iter()
        .take(3)
        .map(|b| TargetCandidate::Band {
            method: b.method,
            min: b.band.min,
            max: b.band.max,
            mid: b.mid(),
            distance_pct: ((b.mid() - close) / close).abs(),
        })
        .collect();

    if let Some(atr) = atr.filter(|a| *a > 0.0) {
        let (sign, prefix) = if bull { (1.0, '+') } else { (-1.0, '-') };
        for mult in [0.5, 1.0] {
            out.push(TargetCandidate::Atr {
                label: format!("{}{:.1}ATR", prefix, mult),
                price: close + sign * mult * atr,
            });
        }
    }

    out
}

/// Tag a single list of bands.
pub fn tag_bands(bands: &[Band], method: LevelMethod) -> Vec<TaggedBand> {
    bands
        .iter()
        .map(|band| TaggedBand {
            band: *band,
            method,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mids(values: &[f64]) -> Vec<TaggedBand> {
        let bands: Vec<Band> = values.iter().map(|m| Band::new(m - 0.5, m + 0.5, 1)).collect();
        tag_bands(&bands, LevelMethod::Swing)
    }

    #[test]
    fn test_long_snaps_to_near_support() {
        let policy = PlanPolicy::default();
        let plan = policy
            .plan(100.0, Verdict::Bull, &mids(&[95.0, 110.0, 120.0]))
            .unwrap();
        assert_eq!(plan.side, PlanSide::Long);
        assert_eq!(plan.sl, 95.0);
        // risk 5 -> raw targets 109 and 115 -> snapped to 110 and 120
        assert_eq!(plan.tp1, 110.0);
        assert_eq!(plan.tp2, 120.0);
    }

    #[test]
    fn test_long_caps_risk_without_support() {
        let plan = PlanPolicy::default()
            .plan(100.0, Verdict::Bull, &[])
            .unwrap();
        assert!((plan.sl - 90.0).abs() < 1e-9);
        assert!((plan.tp1 - 118.0).abs() < 1e-9);
        assert!((plan.tp2 - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_far_support_is_capped() {
        let plan = PlanPolicy::default()
            .plan(100.0, Verdict::Bull, &mids(&[70.0]))
            .unwrap();
        assert!((plan.sl - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_support_near_cap_snaps() {
        let plan = PlanPolicy::default()
            .plan(100.0, Verdict::Bull, &mids(&[89.5]))
            .unwrap();
        assert_eq!(plan.sl, 89.5);
    }

    #[test]
    fn test_tp2_advances_to_next_band() {
        // Raw targets 109 and 115 both snap to 150; 160 is the next band out.
        let plan = PlanPolicy::default()
            .plan(100.0, Verdict::Bull, &mids(&[95.0, 150.0, 160.0]))
            .unwrap();
        assert_eq!(plan.tp1, 150.0);
        assert_eq!(plan.tp2, 160.0);
    }

    #[test]
    fn test_tp2_steps_past_distant_tp1() {
        // Only one upper band, beyond both raw targets. The raw 3R target (115)
        // sits below TP1, so TP2 steps 1.2R past it.
        let plan = PlanPolicy::default()
            .plan(100.0, Verdict::Bull, &mids(&[95.0, 150.0]))
            .unwrap();
        assert_eq!(plan.tp1, 150.0);
        assert!((plan.tp2 - 156.0).abs() < 1e-9);

        let short = PlanPolicy::default()
            .plan(100.0, Verdict::Bear, &mids(&[105.0, 50.0]))
            .unwrap();
        assert_eq!(short.tp1, 50.0);
        assert!((short.tp2 - 44.0).abs() < 1e-9);
        assert!(short.tp2 < short.tp1);
    }

    #[test]
    fn test_short_mirrors_long() {
        let plan = PlanPolicy::default()
            .plan(100.0, Verdict::Bear, &mids(&[105.0, 90.0, 80.0]))
            .unwrap();
        assert_eq!(plan.side, PlanSide::Short);
        assert_eq!(plan.sl, 105.0);
        assert_eq!(plan.tp1, 90.0);
        assert_eq!(plan.tp2, 80.0);
    }

    #[test]
    fn test_neutral_has_no_plan() {
        let policy = PlanPolicy::default();
        assert!(policy.plan(100.0, Verdict::Neutral, &mids(&[90.0])).is_none());
        let display = plan_targets(&policy, 100.0, Verdict::Neutral, &mids(&[90.0]));
        assert_eq!(display, TargetPlan::default());
        assert_eq!(display.side, PlanSide::None);
    }

    #[test]
    fn test_display_percentages() {
        let display = plan_targets(
            &PlanPolicy::default(),
            100.0,
            Verdict::Bull,
            &mids(&[95.0, 110.0, 120.0]),
        );
        assert_eq!(display.entry, Some(100.0));
        assert!((display.tp1_pct.unwrap() - 10.0).abs() < 1e-9);
        assert!((display.tp2_pct.unwrap() - 20.0).abs() < 1e-9);
        assert!((display.sl_pct.unwrap() + 5.0).abs() < 1e-9);

        let short = plan_targets(
            &PlanPolicy::default(),
            100.0,
            Verdict::Bear,
            &mids(&[105.0, 90.0, 80.0]),
        );
        assert!((short.tp1_pct.unwrap() - 10.0).abs() < 1e-9);
        assert!((short.sl_pct.unwrap() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_blanks_wrong_side() {
        let plan = RiskPlan {
            side: PlanSide::Long,
            entry: 100.0,
            tp1: 99.0,
            tp2: 120.0,
            sl: 101.0,
        };
        let display = TargetPlan::from_plan(Some(plan));
        assert!(display.tp1.is_none());
        assert!(display.tp1_pct.is_none());
        assert_eq!(display.tp2, Some(120.0));
        assert!(display.sl.is_none());
    }

    #[test]
    fn test_candidates_bull() {
        let bands = mids(&[90.0, 104.0, 102.0, 110.0, 130.0]);
        let out = candidate_targets(100.0, Verdict::Bull, &bands, Some(4.0));
        assert_eq!(out.len(), 5);
        match &out[0] {
            TargetCandidate::Band { mid, distance_pct, .. } => {
                assert_eq!(*mid, 102.0);
                assert!((distance_pct - 0.02).abs() < 1e-12);
            }
            other => panic!("expected band, got {:?}", other),
        }
        assert_eq!(
            out[3],
            TargetCandidate::Atr {
                label: "+0.5ATR".to_string(),
                price: 102.0
            }
        );
    }

    #[test]
    fn test_candidates_neutral_look_below() {
        let bands = mids(&[90.0, 95.0, 110.0]);
        let out = candidate_targets(100.0, Verdict::Neutral, &bands, None);
        assert_eq!(out.len(), 2);
        match &out[0] {
            TargetCandidate::Band { mid, .. } => assert_eq!(*mid, 95.0),
            other => panic!("expected band, got {:?}", other),
        }
    }
}
