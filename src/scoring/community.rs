//! Community discussion scoring.
//!
//! Converts per-niche post aggregates into mention-volume, demand, and
//! engagement sub-scores. Demand weighs heaviest: posts asking where to
//! buy something are the strongest qualitative signal this pipeline has.

use serde::Serialize;
use tracing::debug;

use crate::types::CommunityObservation;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Weights for the community sub-scores. Must sum to 1.
#[derive(Debug, Clone)]
pub struct CommunityWeights {
    pub mentions: f64,
    pub demand: f64,
    pub engagement: f64,
}

impl Default for CommunityWeights {
    fn default() -> Self {
        Self {
            mentions: 0.3,
            demand: 0.5,
            engagement: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Community sub-scores for one niche. All values in [0, 10].
#[derive(Debug, Clone, Serialize)]
pub struct CommunityScore {
    pub niche: String,
    pub mentions: f64,
    pub demand: f64,
    pub engagement: f64,
    pub total: f64,
    pub post_count: usize,
    pub opportunity_posts: usize,
}

pub struct CommunityScorer {
    weights: CommunityWeights,
}

impl CommunityScorer {
    pub fn new(weights: CommunityWeights) -> Self {
        Self { weights }
    }

    /// Score one niche aggregate.
    ///
    /// - mentions: `clamp(post_count / 10, 1, 10)`
    /// - demand: share of posts expressing a buying need, × 10
    /// - engagement: `min(10, mean_comments / 5)`
    /// The total is clamped to [1, 10].
    pub fn score(&self, obs: &CommunityObservation) -> CommunityScore {
        let mentions = (obs.post_count as f64 / 10.0).clamp(1.0, 10.0);

        let demand = if obs.post_count > 0 {
            (obs.opportunity_posts as f64 / obs.post_count as f64 * 10.0).clamp(0.0, 10.0)
        } else {
            0.0
        };

        let engagement = (obs.mean_comments / 5.0).clamp(0.0, 10.0);

        let total = (mentions * self.weights.mentions
            + demand * self.weights.demand
            + engagement * self.weights.engagement)
            .clamp(1.0, 10.0);

        debug!(
            niche = %obs.niche,
            mentions = format!("{mentions:.2}"),
            demand = format!("{demand:.2}"),
            engagement = format!("{engagement:.2}"),
            total = format!("{total:.2}"),
            "Community niche scored"
        );

        CommunityScore {
            niche: obs.niche.clone(),
            mentions,
            demand,
            engagement,
            total,
            post_count: obs.post_count,
            opportunity_posts: obs.opportunity_posts,
        }
    }

    /// Score a batch of niche aggregates, preserving input order.
    pub fn score_all(&self, observations: &[CommunityObservation]) -> Vec<CommunityScore> {
        observations.iter().map(|o| self.score(o)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
