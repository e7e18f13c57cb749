//! Marketplace niche scoring.
//!
//! Maps a per-niche listing aggregate onto 0–10 sub-scores for demand
//! volume, competition, margin potential, and logistics, then combines
//! them with fixed weights into the source total.

use serde::Serialize;
use tracing::debug;

use crate::types::NicheObservation;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Weights for the marketplace sub-scores. Must sum to 1.
#[derive(Debug, Clone)]
pub struct MarketplaceWeights {
    pub volume: f64,
    pub competition: f64,
    pub margin: f64,
    pub logistics: f64,
    pub seasonality: f64,
}

impl Default for MarketplaceWeights {
    fn default() -> Self {
        Self {
            volume: 0.25,
            competition: 0.20,
            margin: 0.25,
            logistics: 0.15,
            seasonality: 0.15,
        }
    }
}

/// Seasonality has no historical backing yet; every niche gets the midpoint.
const SEASONALITY_DEFAULT: f64 = 5.0;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Marketplace sub-scores for one niche. All values in [0, 10].
#[derive(Debug, Clone, Serialize)]
pub struct MarketplaceScore {
    pub niche: String,
    pub volume: f64,
    pub competition: f64,
    pub margin: f64,
    pub logistics: f64,
    pub seasonality: f64,
    pub total: f64,
    /// Carried through for the profitability simulator.
    pub price_mean: f64,
    pub item_count: usize,
    pub total_sold: u64,
}

pub struct MarketplaceScorer {
    weights: MarketplaceWeights,
}

impl MarketplaceScorer {
    pub fn new(weights: MarketplaceWeights) -> Self {
        Self { weights }
    }

    /// Score one niche aggregate.
    ///
    /// Formulas (each bounded to [0, 10], higher = more favorable):
    /// - volume: `min(10, total_sold / 100)` when anything sold, else 1
    /// - competition: `max(1, 10 − item_count / 10)` — fewer listings is better
    /// - margin: `min(10, spread / mean × 2)` — wide price dispersion is
    ///   the arbitrage opportunity; 1 when the mean is degenerate
    /// - logistics: cheap items ship easily (10 < $1000, 5 < $5000, else 2)
    pub fn score(&self, obs: &NicheObservation) -> MarketplaceScore {
        let volume = if obs.total_sold > 0 {
            (obs.total_sold as f64 / 100.0).min(10.0)
        } else {
            1.0
        };

        let competition = (10.0 - obs.item_count as f64 / 10.0).max(1.0);

        let margin = if obs.price_mean > 0.0 {
            ((obs.price_max - obs.price_min) / obs.price_mean * 2.0).min(10.0)
        } else {
            1.0
        };

        let logistics = if obs.price_mean < 1000.0 {
            10.0
        } else if obs.price_mean < 5000.0 {
            5.0
        } else {
            2.0
        };

        let seasonality = SEASONALITY_DEFAULT;

        let total = volume * self.weights.volume
            + competition * self.weights.competition
            + margin * self.weights.margin
            + logistics * self.weights.logistics
            + seasonality * self.weights.seasonality;

        debug!(
            niche = %obs.niche,
            volume = format!("{volume:.2}"),
            competition = format!("{competition:.2}"),
            margin = format!("{margin:.2}"),
            logistics = format!("{logistics:.2}"),
            total = format!("{total:.2}"),
            "Marketplace niche scored"
        );

        MarketplaceScore {
            niche: obs.niche.clone(),
            volume,
            competition,
            margin,
            logistics,
            seasonality,
            total,
            price_mean: obs.price_mean,
            item_count: obs.item_count,
            total_sold: obs.total_sold,
        }
    }

    /// Score a batch of niche aggregates, preserving input order.
    pub fn score_all(&self, observations: &[NicheObservation]) -> Vec<MarketplaceScore> {
        observations.iter().map(|o| self.score(o)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
