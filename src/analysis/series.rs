/// Chart-ready projections of core state.
///
/// The presentation layer renders these directly; the core produces plain
/// ordered tuples and never concerns itself with axes or colors.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::DepletionFactor;
use crate::registry::LevelSample;

/// One point on the level chart: the observed level and the value a
/// linear extrapolation of the two preceding samples would have predicted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelPoint {
    pub timestamp: DateTime<Utc>,
    pub level_m: f64,
    pub predicted_m: f64,
}

/// Project a station's rolling history into chart points, oldest first.
///
/// The first two points have no prediction basis and carry the observed
/// level; from the third point on, `predicted_m` extrapolates the straight
/// line through the two samples before it. Divergence between the two
/// curves is what the dashboard plots as "actual vs predicted".
pub fn level_series<'a, I>(history: I) -> Vec<LevelPoint>
where
    I: IntoIterator<Item = &'a LevelSample>,
{
    let samples: Vec<&LevelSample> = history.into_iter().collect();
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let predicted_m = if i < 2 {
                sample.level_m
            } else {
                let a = samples[i - 2].level_m;
                let b = samples[i - 1].level_m;
                b + (b - a)
            };
            LevelPoint {
                timestamp: sample.timestamp,
                level_m: sample.level_m,
                predicted_m,
            }
        })
        .collect()
}

/// One slice of the depletion breakdown chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorShare {
    pub factor: String,
    pub share_percent: f64,
}

/// Factor shares in configured order, for categorical charts.
pub fn factor_shares(factors: &[DepletionFactor]) -> Vec<FactorShare> {
    factors
        .iter()
        .map(|f| FactorShare {
            factor: f.name.clone(),
            share_percent: f.share_percent,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
