//! Marketplace search API integration.
//!
//! Public search endpoint: no authentication required for basic queries.
//! The API rate-limits unauthenticated traffic hard (429) and sometimes
//! blocks bursts outright (403), so every request goes through the shared
//! retry/backoff helper and requests are spaced by a configurable delay.
//!
//! Base URL: https://api.mercadolibre.com
//! Endpoint: /sites/{site_id}/search?q={query}&limit={limit}

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::{build_client, get_json_with_retry, ListingSource};
use crate::config::MercadoConfig;
use crate::types::{Condition, Listing};

const BASE_URL: &str = "https://api.mercadolibre.com";
const SOURCE_NAME: &str = "mercado";
const USER_AGENT: &str = "DataFlipMX/1.0 (niche-analysis)";

// ---------------------------------------------------------------------------
// API response types (marketplace JSON → Rust)
// ---------------------------------------------------------------------------

/// We only deserialize the fields we need.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    id: String,
    title: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    sold_quantity: Option<u32>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    shipping: Option<ApiShipping>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    seller: Option<ApiSeller>,
    #[serde(default)]
    permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiShipping {
    #[serde(default)]
    free_shipping: bool,
}

#[derive(Debug, Deserialize)]
struct ApiSeller {
    #[serde(default)]
    id: Option<u64>,
}

impl ApiItem {
    /// Convert to the internal record. Items without a usable price are
    /// dropped here; a missing sold count means zero, and an unknown
    /// condition string is treated as used (second-hand site default).
    fn into_listing(self) -> Option<Listing> {
        let price = self.price.filter(|p| p.is_finite() && *p > 0.0)?;
        let condition = self
            .condition
            .as_deref()
            .and_then(|c| Condition::from_str(c).ok())
            .unwrap_or(Condition::Used);

        Some(Listing {
            id: self.id,
            title: self.title,
            price,
            sold_quantity: self.sold_quantity.unwrap_or(0),
            condition,
            free_shipping: self.shipping.map(|s| s.free_shipping).unwrap_or(false),
            category_id: self.category_id.unwrap_or_default(),
            seller_id: self
                .seller
                .and_then(|s| s.id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
            permalink: self.permalink.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Marketplace search client.
pub struct MercadoClient {
    http: Client,
    site_id: String,
    limit: u32,
    max_retries: u32,
    request_delay: Duration,
}

impl MercadoClient {
    pub fn new(config: &MercadoConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(USER_AGENT)?,
            site_id: config.site_id.clone(),
            limit: config.limit,
            max_retries: config.max_retries,
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }
}

#[async_trait]
impl ListingSource for MercadoClient {
    async fn search_listings(&self, niche: &str) -> Result<Vec<Listing>> {
        let url = format!(
            "{BASE_URL}/sites/{}/search?q={}&limit={}",
            self.site_id,
            urlencoding::encode(niche),
            self.limit,
        );

        debug!(%url, "Searching marketplace");

        let response: SearchResponse =
            get_json_with_retry(&self.http, &url, self.max_retries, self.request_delay).await?;

        let listings: Vec<Listing> = response
            .results
            .into_iter()
            .filter_map(ApiItem::into_listing)
            .collect();

        // Space out the next request regardless of outcome.
        tokio::time::sleep(self.request_delay).await;

        Ok(listings)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
