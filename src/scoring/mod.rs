//! Scoring engine — per-source normalization, sub-scoring, and integration.

pub mod community;
pub mod integrator;
pub mod marketplace;
pub mod normalize;
pub mod trends;

use anyhow::Result;
use tracing::{info, warn};

use crate::types::{CommunityPost, IntegratedScore, Listing, TrendSeries};
use community::{CommunityScorer, CommunityWeights};
use integrator::{IntegrationWeights, Integrator, NicheMatcher};
use marketplace::{MarketplaceScorer, MarketplaceWeights};
use trends::{TrendsScorer, TrendsWeights};

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Pipelines normalization → per-source scoring → integration.
///
/// Instantiate once per run; call `run` with whatever raw data the sources
/// produced. A niche that one source came back empty for is simply unscored
/// by that source — the integrator fills the gap with the neutral default.
pub struct ScoringPipeline {
    marketplace: MarketplaceScorer,
    trends: TrendsScorer,
    community: CommunityScorer,
    integrator: Integrator,
    opportunity_keywords: Vec<String>,
}

impl ScoringPipeline {
    pub fn new(
        marketplace_weights: MarketplaceWeights,
        trends_weights: TrendsWeights,
        community_weights: CommunityWeights,
        integration_weights: IntegrationWeights,
        matcher: NicheMatcher,
        opportunity_keywords: Vec<String>,
    ) -> Self {
        Self {
            marketplace: MarketplaceScorer::new(marketplace_weights),
            trends: TrendsScorer::new(trends_weights),
            community: CommunityScorer::new(community_weights),
            integrator: Integrator::new(integration_weights, matcher),
            opportunity_keywords,
        }
    }

    /// A pipeline with all default weights and the built-in keyword list.
    pub fn with_defaults(matcher: NicheMatcher) -> Self {
        Self::new(
            MarketplaceWeights::default(),
            TrendsWeights::default(),
            CommunityWeights::default(),
            IntegrationWeights::default(),
            matcher,
            normalize::OPPORTUNITY_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        )
    }

    /// Run the full scoring pipeline over in-memory source data.
    ///
    /// `listings` and `posts` are per-niche batches as fetched; `series`
    /// is one time series per keyword. Errors only when every source was
    /// empty for every niche.
    pub fn run(
        &self,
        listings: &[(String, Vec<Listing>)],
        series: &[TrendSeries],
        posts: &[(String, Vec<CommunityPost>)],
    ) -> Result<Vec<IntegratedScore>> {
        let mut meli_obs = Vec::new();
        for (niche, batch) in listings {
            match normalize::observe_listings(niche, batch) {
                Ok(obs) => meli_obs.push(obs),
                Err(e) => warn!(error = %e, "Niche unscored by marketplace"),
            }
        }

        let mut trend_obs = Vec::new();
        for s in series {
            match normalize::observe_trend(s) {
                Ok(obs) => trend_obs.push(obs),
                Err(e) => warn!(error = %e, "Keyword unscored by trends"),
            }
        }

        let keywords: Vec<&str> = self.opportunity_keywords.iter().map(|k| k.as_str()).collect();
        let mut community_obs = Vec::new();
        for (niche, batch) in posts {
            match normalize::observe_posts(niche, batch, &keywords) {
                Ok(obs) => community_obs.push(obs),
                Err(e) => warn!(error = %e, "Niche unscored by community"),
            }
        }

        let meli_scores = self.marketplace.score_all(&meli_obs);
        let trend_scores = self.trends.score_all(&trend_obs);
        let community_scores = self.community.score_all(&community_obs);

        info!(
            marketplace = meli_scores.len(),
            trends = trend_scores.len(),
            community = community_scores.len(),
            "Per-source scoring complete"
        );

        self.integrator
            .integrate(&meli_scores, &trend_scores, &community_scores)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
