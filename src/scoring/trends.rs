//! Search-trends scoring.
//!
//! Converts keyword interest aggregates into a demand-volume score
//! (relative to the strongest keyword in the batch) and a consistency
//! score penalizing volatile search patterns.

use serde::Serialize;
use tracing::debug;

use crate::types::TrendObservation;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Weights for the trends sub-scores. Must sum to 1.
#[derive(Debug, Clone)]
pub struct TrendsWeights {
    pub volume: f64,
    pub consistency: f64,
}

impl Default for TrendsWeights {
    fn default() -> Self {
        Self {
            volume: 0.7,
            consistency: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Trends sub-scores for one keyword. All values in [0, 10].
#[derive(Debug, Clone, Serialize)]
pub struct TrendsScore {
    pub keyword: String,
    pub volume: f64,
    pub consistency: f64,
    pub total: f64,
    /// Carried through for the integrator's adjustment term.
    pub slope: f64,
    pub interest_mean: f64,
}

pub struct TrendsScorer {
    weights: TrendsWeights,
}

impl TrendsScorer {
    pub fn new(weights: TrendsWeights) -> Self {
        Self { weights }
    }

    /// Score a batch of keyword aggregates, preserving input order.
    ///
    /// Volume is relative: `(mean / batch max mean) × 10`, so the strongest
    /// keyword in a batch always lands at 10. Consistency is
    /// `clip(10 − volatility × 5, 1, 10)`. Both floor at 1 when the batch
    /// carries no interest at all (flat-zero series would otherwise divide
    /// by zero).
    pub fn score_all(&self, observations: &[TrendObservation]) -> Vec<TrendsScore> {
        let max_interest = observations
            .iter()
            .map(|o| o.interest_mean)
            .fold(0.0_f64, f64::max);

        observations
            .iter()
            .map(|obs| {
                let volume = if max_interest > 0.0 {
                    (obs.interest_mean / max_interest * 10.0).clamp(0.0, 10.0)
                } else {
                    1.0
                };

                let consistency = if obs.volatility.is_finite() {
                    (10.0 - obs.volatility * 5.0).clamp(1.0, 10.0)
                } else {
                    1.0
                };

                let total = volume * self.weights.volume + consistency * self.weights.consistency;

                debug!(
                    keyword = %obs.keyword,
                    volume = format!("{volume:.2}"),
                    consistency = format!("{consistency:.2}"),
                    total = format!("{total:.2}"),
                    "Trends keyword scored"
                );

                TrendsScore {
                    keyword: obs.keyword.clone(),
                    volume,
                    consistency,
                    total,
                    slope: obs.slope,
                    interest_mean: obs.interest_mean,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
