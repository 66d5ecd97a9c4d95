//! Signal derivation.
//!
//! Pure computations over candle series: technical indicators, support and
//! resistance bands, the rule-based probability score, and target planning.
//! Nothing here performs I/O; persistence and currency conversion belong to
//! the callers.

pub mod advice;
pub mod indicators;
pub mod levels;
pub mod pipeline;
pub mod probability;
pub mod rainbow;
pub mod targets;

pub use advice::{advise, build_tpsl, estimate_fee_pct, smallest_tp_distance_pct, Advice};
pub use levels::{detect_all, pivot_bands, SwingDetector, VolumeProfile};
pub use pipeline::SignalPipeline;
pub use probability::{probability, score_features};
pub use rainbow::{rainbow, Rainbow};
pub use targets::{candidate_targets, plan_targets, tag_bands, PlanPolicy, RiskPlan};
