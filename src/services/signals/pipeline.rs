//! Signal pipeline orchestrator.

use super::indicators::Atr;
use super::levels::detect_all;
use super::probability::probability;
use super::targets::{plan_targets, PlanPolicy};
use crate::types::{Candle, OnchainRow, SignalSnapshot};

/// Runs levels, probability and targets over one candle series.
///
/// Holds only policy; every run is a pure function of its inputs, so one
/// pipeline can be shared freely across tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalPipeline {
    policy: PlanPolicy,
}

impl SignalPipeline {
    pub fn new(policy: PlanPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PlanPolicy {
        &self.policy
    }

    /// Compute a snapshot from ascending candles and optional on-chain rows.
    ///
    /// Short series degrade stage by stage: empty bands, neutral probability,
    /// no ATR, no plan.
    pub fn run(&self, candles: &[Candle], onchain: Option<&[OnchainRow]>) -> SignalSnapshot {
        let levels = detect_all(candles);
        let probability = probability(candles, onchain);
        let atr = Atr::default().calculate(candles);

        let last = candles.last();
        let targets = match last {
            Some(c) => plan_targets(&self.policy, c.close, probability.verdict, &levels.tagged()),
            None => Default::default(),
        };

        SignalSnapshot {
            ts: last.map(|c| c.ts),
            close: last.map(|c| c.close),
            pivot: levels.pivot.unwrap_or_default(),
            swing: levels.swing.unwrap_or_default(),
            vbp: levels.vbp.unwrap_or_default(),
            probability,
            atr,
            targets,
        }
    }
}
