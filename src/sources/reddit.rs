//! Community discussion integration (Reddit).
//!
//! Uses the public JSON listing endpoints — no OAuth needed for
//! read-only search, just a descriptive User-Agent. Searches each
//! configured subreddit for the niche term and flattens the results
//! into plain posts.
//!
//! Endpoint: https://www.reddit.com/r/{sub}/search.json
//!           ?q={query}&restrict_sr=1&limit={n}&t={time_filter}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{build_client, get_json_with_retry, DiscussionSource};
use crate::config::RedditConfig;
use crate::types::CommunityPost;

const BASE_URL: &str = "https://www.reddit.com";
const SOURCE_NAME: &str = "reddit";
const MAX_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// API response types (Reddit listing JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: ApiPost,
}

#[derive(Debug, Deserialize)]
struct ApiPost {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u32,
    /// Seconds since epoch, as a float.
    created_utc: f64,
    subreddit: String,
    #[serde(default)]
    permalink: String,
}

impl ApiPost {
    fn into_post(self) -> CommunityPost {
        let created_at = Utc
            .timestamp_opt(self.created_utc as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        CommunityPost {
            id: self.id,
            title: self.title,
            body: self.selftext,
            score: self.score,
            num_comments: self.num_comments,
            created_at,
            subreddit: self.subreddit,
            permalink: format!("https://reddit.com{}", self.permalink),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reddit search client over the configured subreddits.
pub struct RedditClient {
    http: Client,
    subreddits: Vec<String>,
    limit: u32,
    time_filter: String,
    request_delay: Duration,
}

impl RedditClient {
    pub fn new(config: &RedditConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(&config.user_agent)?,
            subreddits: config.subreddits.clone(),
            limit: config.limit,
            time_filter: config.time_filter.clone(),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    async fn search_subreddit(&self, subreddit: &str, query: &str) -> Result<Vec<CommunityPost>> {
        let url = format!(
            "{BASE_URL}/r/{subreddit}/search.json?q={}&restrict_sr=1&limit={}&t={}",
            urlencoding::encode(query),
            self.limit,
            self.time_filter,
        );

        debug!(%url, "Searching subreddit");

        let envelope: ListingEnvelope =
            get_json_with_retry(&self.http, &url, MAX_RETRIES, self.request_delay).await?;

        Ok(envelope
            .data
            .children
            .into_iter()
            .map(|c| c.data.into_post())
            .collect())
    }
}

#[async_trait]
impl DiscussionSource for RedditClient {
    /// Search every configured subreddit for the niche term. A single
    /// subreddit failing is logged and skipped; the rest still count.
    async fn search_posts(&self, niche: &str) -> Result<Vec<CommunityPost>> {
        let mut posts = Vec::new();

        for subreddit in &self.subreddits {
            match self.search_subreddit(subreddit, niche).await {
                Ok(mut batch) => posts.append(&mut batch),
                Err(e) => warn!(subreddit = %subreddit, error = %e, "Subreddit search failed"),
            }
            tokio::time::sleep(self.request_delay).await;
        }

        Ok(posts)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
