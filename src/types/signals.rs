use serde::{Deserialize, Serialize};

/// A price interval flagged as a support/resistance zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    /// Confidence weight: merged swing points or rounded bucket volume.
    pub hits: u64,
}

impl Band {
    pub fn new(min: f64, max: f64, hits: u64) -> Self {
        Self { min, max, hits }
    }

    /// Centre of the band.
    pub fn mid(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn scaled(&self, rate: f64) -> Self {
        Self {
            min: self.min * rate,
            max: self.max * rate,
            hits: self.hits,
        }
    }
}

/// Band extraction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMethod {
    Pivot,
    Swing,
    Vbp,
}

impl LevelMethod {
    pub const ALL: [LevelMethod; 3] = [LevelMethod::Pivot, LevelMethod::Swing, LevelMethod::Vbp];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pivot" => Some(Self::Pivot),
            "swing" => Some(Self::Swing),
            "vbp" => Some(Self::Vbp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pivot => "pivot",
            Self::Swing => "swing",
            Self::Vbp => "vbp",
        }
    }
}

/// A band tagged with the method that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaggedBand {
    #[serde(flatten)]
    pub band: Band,
    pub method: LevelMethod,
}

impl TaggedBand {
    pub fn mid(&self) -> f64 {
        self.band.mid()
    }
}

/// Bands from all three detectors. Absent methods are `None` when read back
/// from storage, empty when freshly computed from too little data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub pivot: Option<Vec<Band>>,
    pub swing: Option<Vec<Band>>,
    pub vbp: Option<Vec<Band>>,
    /// Timestamp of the candle the newest level row was computed at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl LevelSet {
    pub fn get(&self, method: LevelMethod) -> Option<&Vec<Band>> {
        match method {
            LevelMethod::Pivot => self.pivot.as_ref(),
            LevelMethod::Swing => self.swing.as_ref(),
            LevelMethod::Vbp => self.vbp.as_ref(),
        }
    }

    pub fn set(&mut self, method: LevelMethod, bands: Vec<Band>) {
        match method {
            LevelMethod::Pivot => self.pivot = Some(bands),
            LevelMethod::Swing => self.swing = Some(bands),
            LevelMethod::Vbp => self.vbp = Some(bands),
        }
    }

    /// True once every method has a band list.
    pub fn is_complete(&self) -> bool {
        self.pivot.is_some() && self.swing.is_some() && self.vbp.is_some()
    }

    /// Flatten into one list, tagging each band with its method.
    pub fn tagged(&self) -> Vec<TaggedBand> {
        LevelMethod::ALL
            .iter()
            .filter_map(|m| self.get(*m).map(|bands| (*m, bands)))
            .flat_map(|(method, bands)| {
                bands.iter().map(move |band| TaggedBand { band: *band, method })
            })
            .collect()
    }

    pub fn scaled(&self, rate: f64) -> Self {
        let scale = |bands: &Option<Vec<Band>>| {
            bands
                .as_ref()
                .map(|list| list.iter().map(|b| b.scaled(rate)).collect())
        };
        Self {
            pivot: scale(&self.pivot),
            swing: scale(&self.swing),
            vbp: scale(&self.vbp),
            ts: self.ts,
        }
    }
}

/// Technical features at the latest bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_hist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma20_slope: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma50_slope: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_growth_5d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_growth_5d: Option<f64>,
}

impl FeatureVector {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Three-way directional call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Bull,
    #[default]
    Neutral,
    Bear,
}

impl Verdict {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bull" => Some(Self::Bull),
            "neutral" => Some(Self::Neutral),
            "bear" => Some(Self::Bear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Neutral => "neutral",
            Self::Bear => "bear",
        }
    }
}

/// Up/down probability with the features it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilitySnapshot {
    pub p_up: f64,
    pub p_down: f64,
    pub verdict: Verdict,
    pub features: FeatureVector,
}

impl ProbabilitySnapshot {
    /// Result used when there is not enough data to score.
    pub fn neutral() -> Self {
        Self {
            p_up: 0.5,
            p_down: 0.5,
            verdict: Verdict::Neutral,
            features: FeatureVector::default(),
        }
    }
}

impl Default for ProbabilitySnapshot {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Probability row as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProbability {
    pub ts: i64,
    pub horizon: String,
    #[serde(flatten)]
    pub snapshot: ProbabilitySnapshot,
}

/// Trade direction of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanSide {
    Long,
    Short,
    #[default]
    None,
}

impl PlanSide {
    pub fn from_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Bull => Self::Long,
            Verdict::Bear => Self::Short,
            Verdict::Neutral => Self::None,
        }
    }
}

/// Entry/targets/stop for display. Prices that fail the side sign check
/// are `None`, as are their percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetPlan {
    pub side: PlanSide,
    pub entry: Option<f64>,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub sl: Option<f64>,
    pub tp1_pct: Option<f64>,
    pub tp2_pct: Option<f64>,
    pub sl_pct: Option<f64>,
}

impl TargetPlan {
    /// Convert price fields by an FX rate; percentages are unit-free.
    pub fn scaled(&self, rate: f64) -> Self {
        Self {
            entry: self.entry.map(|v| v * rate),
            tp1: self.tp1.map(|v| v * rate),
            tp2: self.tp2.map(|v| v * rate),
            sl: self.sl.map(|v| v * rate),
            ..*self
        }
    }
}

/// A candidate target level: nearby band or ATR projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetCandidate {
    Band {
        method: LevelMethod,
        min: f64,
        max: f64,
        mid: f64,
        distance_pct: f64,
    },
    Atr {
        label: String,
        price: f64,
    },
}

impl TargetCandidate {
    pub fn scaled(&self, rate: f64) -> Self {
        match self {
            Self::Band {
                method,
                min,
                max,
                mid,
                distance_pct,
            } => Self::Band {
                method: *method,
                min: min * rate,
                max: max * rate,
                mid: mid * rate,
                distance_pct: *distance_pct,
            },
            Self::Atr { label, price } => Self::Atr {
                label: label.clone(),
                price: price * rate,
            },
        }
    }
}

/// One atomic output of the signal pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Timestamp of the latest candle, `None` for an empty series.
    pub ts: Option<i64>,
    pub close: Option<f64>,
    pub pivot: Vec<Band>,
    pub swing: Vec<Band>,
    pub vbp: Vec<Band>,
    pub probability: ProbabilitySnapshot,
    pub atr: Option<f64>,
    pub targets: TargetPlan,
}

impl SignalSnapshot {
    /// Tagged view over the three band lists.
    pub fn tagged_bands(&self) -> Vec<TaggedBand> {
        self.levels().tagged()
    }

    pub fn levels(&self) -> LevelSet {
        LevelSet {
            pivot: Some(self.pivot.clone()),
            swing: Some(self.swing.clone()),
            vbp: Some(self.vbp.clone()),
            ts: self.ts,
        }
    }

    /// Convert every price-valued field by an FX rate.
    pub fn scaled(&self, rate: f64) -> Self {
        let scale = |bands: &[Band]| bands.iter().map(|b| b.scaled(rate)).collect();
        Self {
            ts: self.ts,
            close: self.close.map(|c| c * rate),
            pivot: scale(&self.pivot),
            swing: scale(&self.swing),
            vbp: scale(&self.vbp),
            probability: self.probability,
            atr: self.atr.map(|a| a * rate),
            targets: self.targets.scaled(rate),
        }
    }
}
