//! Search-trends API integration.
//!
//! Talks to a trends proxy service that wraps the search-interest
//! backend and returns a date-indexed series of relative interest
//! values (0–100) per keyword. The proxy's base URL is configuration;
//! any service honoring the same tiny JSON contract can stand in.
//!
//! Endpoint: {base_url}/interest?keyword={kw}&geo={geo}&timeframe={tf}

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{build_client, get_json_with_retry, InterestSource};
use crate::config::TrendsSourceConfig;
use crate::types::{TrendPoint, TrendSeries};

const SOURCE_NAME: &str = "trends";
const USER_AGENT: &str = "DataFlipMX/1.0 (niche-analysis)";
const MAX_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InterestResponse {
    keyword: String,
    #[serde(default)]
    points: Vec<InterestPoint>,
}

#[derive(Debug, Deserialize)]
struct InterestPoint {
    date: NaiveDate,
    value: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Trends proxy client.
pub struct TrendsClient {
    http: Client,
    base_url: String,
    geo: String,
    timeframe: String,
    request_delay: Duration,
}

impl TrendsClient {
    pub fn new(config: &TrendsSourceConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(USER_AGENT)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo: config.geo.clone(),
            timeframe: config.timeframe.clone(),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }
}

#[async_trait]
impl InterestSource for TrendsClient {
    async fn interest_over_time(&self, keyword: &str) -> Result<TrendSeries> {
        let url = format!(
            "{}/interest?keyword={}&geo={}&timeframe={}",
            self.base_url,
            urlencoding::encode(keyword),
            urlencoding::encode(&self.geo),
            urlencoding::encode(&self.timeframe),
        );

        debug!(%url, "Fetching interest series");

        let response: InterestResponse =
            get_json_with_retry(&self.http, &url, MAX_RETRIES, self.request_delay).await?;

        tokio::time::sleep(self.request_delay).await;

        Ok(TrendSeries {
            keyword: response.keyword,
            points: response
                .points
                .into_iter()
                // Contract says 0–100; out-of-range values are clamped
                .map(|p| TrendPoint {
                    date: p.date,
                    value: p.value.clamp(0.0, 100.0),
                })
                .collect(),
        })
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interest_response() {
        let json = r#"{
            "keyword": "teclado mecanico",
            "points": [
                {"date": "2024-11-03", "value": 42.0},
                {"date": "2024-11-10", "value": 55.0},
                {"date": "2024-11-17", "value": 61.0}
            ]
        }"#;

        let response: InterestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.keyword, "teclado mecanico");
        assert_eq!(response.points.len(), 3);
        assert_eq!(response.points[1].value, 55.0);
        assert_eq!(
            response.points[0].date,
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap()
        );
    }

    #[test]
    fn test_missing_points_default_empty() {
        let response: InterestResponse =
            serde_json::from_str(r#"{"keyword": "ipod classic"}"#).unwrap();
        assert!(response.points.is_empty());
    }
}
