//! External data source clients.
//!
//! Thin, replaceable HTTP layers for the three signal sources: the
//! marketplace search API, the search-trends API, and the community
//! discussion API. The core pipeline never talks to these directly — it
//! consumes their output as in-memory collections, and a source that
//! fails or is disabled simply contributes nothing (the integrator fills
//! the gap with the neutral default).

pub mod mercado;
pub mod reddit;
pub mod trends;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, warn};

use crate::types::{CommunityPost, Listing, TrendSeries};

// ---------------------------------------------------------------------------
// Source abstractions
// ---------------------------------------------------------------------------

/// A source of marketplace listings for a niche search term.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn search_listings(&self, niche: &str) -> Result<Vec<Listing>>;
    fn name(&self) -> &str;
}

/// A source of search-interest time series for a keyword.
#[async_trait]
pub trait InterestSource: Send + Sync {
    async fn interest_over_time(&self, keyword: &str) -> Result<TrendSeries>;
    fn name(&self) -> &str;
}

/// A source of community discussion posts mentioning a niche.
#[async_trait]
pub trait DiscussionSource: Send + Sync {
    async fn search_posts(&self, niche: &str) -> Result<Vec<CommunityPost>>;
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Shared HTTP plumbing
// ---------------------------------------------------------------------------

pub(crate) fn build_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent.to_string())
        .build()
        .context("Failed to build HTTP client")
}

/// GET a JSON document, retrying on 429/403 with a growing delay.
///
/// The marketplace API rate-limits aggressively and sometimes answers 403
/// to unauthenticated bursts; waiting and retrying usually clears both.
pub(crate) async fn get_json_with_retry<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    max_retries: u32,
    base_delay: Duration,
) -> Result<T> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
                    if attempt >= max_retries {
                        bail!("{url} still answering {status} after {attempt} attempts");
                    }
                    let wait = base_delay * (attempt + 1);
                    warn!(%url, %status, attempt, wait_ms = wait.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    continue;
                }
                let resp = resp
                    .error_for_status()
                    .with_context(|| format!("Request failed: {url}"))?;
                return resp
                    .json::<T>()
                    .await
                    .with_context(|| format!("Failed to parse JSON from {url}"));
            }
            Err(e) => {
                if attempt >= max_retries {
                    return Err(e).with_context(|| format!("Request failed after {attempt} attempts: {url}"));
                }
                warn!(%url, error = %e, attempt, "Request error, retrying");
                tokio::time::sleep(base_delay).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Source hub
// ---------------------------------------------------------------------------

/// Everything the sources produced for one run, passed forward explicitly
/// to the scoring pipeline (nothing is rediscovered from disk).
#[derive(Debug, Default)]
pub struct CollectedData {
    pub listings: Vec<(String, Vec<Listing>)>,
    pub series: Vec<TrendSeries>,
    pub posts: Vec<(String, Vec<CommunityPost>)>,
}

/// Aggregates the enabled source clients and collects all raw data for a
/// run. Pass `None` for any source that is disabled in config.
pub struct SourceHub {
    mercado: Option<mercado::MercadoClient>,
    trends: Option<trends::TrendsClient>,
    reddit: Option<reddit::RedditClient>,
}

impl SourceHub {
    pub fn new(
        mercado: Option<mercado::MercadoClient>,
        trends: Option<trends::TrendsClient>,
        reddit: Option<reddit::RedditClient>,
    ) -> Self {
        Self {
            mercado,
            trends,
            reddit,
        }
    }

    /// Fetch every niche from every enabled source.
    ///
    /// A failing niche/source pair is logged and skipped — the niche is
    /// simply unscored by that source. Sources are polled sequentially on
    /// purpose: each client already spaces its own requests to respect
    /// rate limits.
    pub async fn collect(&self, niches: &[String]) -> CollectedData {
        let mut data = CollectedData::default();

        if let Some(mercado) = &self.mercado {
            for niche in niches {
                match mercado.search_listings(niche).await {
                    Ok(listings) => {
                        info!(niche = %niche, count = listings.len(), "Marketplace listings fetched");
                        data.listings.push((niche.clone(), listings));
                    }
                    Err(e) => warn!(niche = %niche, error = %e, "Marketplace fetch failed"),
                }
            }
        }

        if let Some(trends) = &self.trends {
            for niche in niches {
                match trends.interest_over_time(niche).await {
                    Ok(series) => {
                        info!(keyword = %niche, points = series.points.len(), "Trend series fetched");
                        data.series.push(series);
                    }
                    Err(e) => warn!(keyword = %niche, error = %e, "Trends fetch failed"),
                }
            }
        }

        if let Some(reddit) = &self.reddit {
            for niche in niches {
                match reddit.search_posts(niche).await {
                    Ok(posts) => {
                        info!(niche = %niche, count = posts.len(), "Community posts fetched");
                        data.posts.push((niche.clone(), posts));
                    }
                    Err(e) => warn!(niche = %niche, error = %e, "Community fetch failed"),
                }
            }
        }

        data
    }
}
