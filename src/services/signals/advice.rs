//! Per-symbol trading advice.
//!
//! Combines the stored daily probability, a fresh 4h probability, the nearest
//! resistance band and a fee estimate into a buy/reduce/hold call.

use serde::{Deserialize, Serialize};

use crate::types::{ProbabilitySnapshot, TaggedBand, Verdict};

/// Estimated one-way cost (fees + slippage) as a fraction.
pub fn estimate_fee_pct(symbol: &str) -> f64 {
    match symbol {
        "ETH" | "PEPE" => 0.004,
        "BTC" | "ADA" => 0.0015,
        "CRO" | "LUNC" => 0.002,
        _ => 0.002,
    }
}

/// A labelled price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub label: String,
    pub price: f64,
}

impl PriceLevel {
    fn new(label: &str, price: f64) -> Self {
        Self {
            label: label.to_string(),
            price,
        }
    }
}

/// Take-profit and stop-loss candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TpSl {
    pub tp: Vec<PriceLevel>,
    pub sl: Vec<PriceLevel>,
}

impl TpSl {
    pub fn scaled(&self, rate: f64) -> Self {
        let scale = |levels: &[PriceLevel]| {
            levels
                .iter()
                .map(|l| PriceLevel::new(&l.label, l.price * rate))
                .collect()
        };
        Self {
            tp: scale(&self.tp),
            sl: scale(&self.sl),
        }
    }
}

/// Two nearest band mids above price, ATR projections, and the nearest band
/// below price as stop.
pub fn build_tpsl(price: f64, bands: &[TaggedBand], atr: Option<f64>) -> TpSl {
    let mut upper: Vec<f64> = bands.iter().map(|b| b.mid()).filter(|m| *m > price).collect();
    let mut lower: Vec<f64> = bands.iter().map(|b| b.mid()).filter(|m| *m < price).collect();
    upper.sort_by(|a, b| a.total_cmp(b));
    lower.sort_by(|a, b| b.total_cmp(a));

    let atr = atr.filter(|a| *a > 0.0);
    let mut out = TpSl::default();

    if let Some(m) = upper.first() {
        out.tp.push(PriceLevel::new("Band-TP1", *m));
    }
    if let Some(m) = upper.get(1) {
        out.tp.push(PriceLevel::new("Band-TP2", *m));
    }
    if let Some(atr) = atr {
        out.tp.push(PriceLevel::new("+0.5ATR", price + 0.5 * atr));
        out.tp.push(PriceLevel::new("+1.0ATR", price + atr));
    }

    if let Some(m) = lower.first() {
        out.sl.push(PriceLevel::new("Band-SL1", *m));
    }
    if let Some(atr) = atr {
        out.sl.push(PriceLevel::new("-1.0ATR", price - atr));
    }

    out
}

/// Smallest percentage distance from `price` to any take-profit.
pub fn smallest_tp_distance_pct(price: f64, tps: &[PriceLevel]) -> Option<f64> {
    if price == 0.0 {
        return None;
    }
    tps.iter()
        .map(|t| (t.price / price - 1.0) * 100.0)
        .reduce(f64::min)
}

/// Advice action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Reduce,
    Hold,
}

/// Agreement between the daily and 4h probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyView {
    AlignedBull,
    AlignedBear,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consistency {
    pub p_up_4h: f64,
    pub p_up_1d: f64,
    pub view: ConsistencyView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCheck {
    pub est_pct: f64,
    pub min_tp_dist_pct: Option<f64>,
    /// Nearest target beats the round-trip cost. True when there is no target.
    pub pass: bool,
}

/// Advice for one symbol. Prices in USD until [`Advice::scaled`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub symbol: String,
    pub price: f64,
    pub verdict: Verdict,
    pub p_up: f64,
    pub p_down: f64,
    pub action: Action,
    pub reason: String,
    /// Distance to the nearest band above price, in percent.
    pub up_dist_pct: Option<f64>,
    pub tpsl: TpSl,
    pub consistency: Consistency,
    pub fee: FeeCheck,
}

impl Advice {
    pub fn scaled(&self, rate: f64) -> Self {
        Self {
            price: self.price * rate,
            tpsl: self.tpsl.scaled(rate),
            ..self.clone()
        }
    }
}

/// Build advice from daily and 4h probabilities, USD price, bands and daily ATR.
pub fn advise(
    symbol: &str,
    prob_1d: &ProbabilitySnapshot,
    prob_4h: &ProbabilitySnapshot,
    price: f64,
    bands: &[TaggedBand],
    atr: Option<f64>,
) -> Advice {
    let up_mid = bands
        .iter()
        .map(|b| b.mid())
        .filter(|m| *m > price)
        .reduce(f64::min);
    let up_dist_pct = match up_mid {
        Some(m) if price > 0.0 => Some((m - price) / price * 100.0),
        _ => None,
    };

    let mut action = Action::Hold;
    let mut reason = String::new();
    if prob_1d.p_up > 0.65 && up_mid.is_some() {
        action = Action::Buy;
        reason = match up_dist_pct {
            Some(d) => format!("p_up={:.2}, {:.1}% to resistance", prob_1d.p_up, d),
            None => format!("p_up={:.2}", prob_1d.p_up),
        };
    }
    if prob_1d.p_down > 0.6 || up_dist_pct.map_or(false, |d| d < 1.0) {
        action = Action::Reduce;
        reason = if reason.is_empty() {
            "downside risk or resistance nearby".to_string()
        } else {
            format!("{}, but resistance is close", reason)
        };
    }
    if reason.is_empty() {
        reason = format!("p_up={:.2}, no clear edge", prob_1d.p_up);
    }

    let tpsl = build_tpsl(price, bands, atr);
    let min_tp_dist_pct = smallest_tp_distance_pct(price, &tpsl.tp);
    let est_pct = estimate_fee_pct(symbol);
    let pass = min_tp_dist_pct.map_or(true, |d| d > est_pct * 100.0 * 2.0);

    let view = if prob_4h.p_up >= 0.55 && prob_1d.p_up >= 0.55 {
        ConsistencyView::AlignedBull
    } else if prob_4h.p_up <= 0.45 && prob_1d.p_up <= 0.45 {
        ConsistencyView::AlignedBear
    } else {
        ConsistencyView::Mixed
    };

    Advice {
        symbol: symbol.to_string(),
        price,
        verdict: prob_1d.verdict,
        p_up: prob_1d.p_up,
        p_down: prob_1d.p_down,
        action,
        reason,
        up_dist_pct,
        tpsl,
        consistency: Consistency {
            p_up_4h: prob_4h.p_up,
            p_up_1d: prob_1d.p_up,
            view,
        },
        fee: FeeCheck {
            est_pct,
            min_tp_dist_pct,
            pass,
        },
    }
}
