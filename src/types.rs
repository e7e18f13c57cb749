//! Shared types for the DataFlip pipeline.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that source, scoring,
//! and simulation modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Raw source records
// ---------------------------------------------------------------------------

/// One marketplace listing, as returned by the search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Asking price in local currency. Always > 0 on the wire.
    pub price: f64,
    /// Lifetime units sold. The API omits this for some listings; absent = 0.
    #[serde(default)]
    pub sold_quantity: u32,
    pub condition: Condition,
    #[serde(default)]
    pub free_shipping: bool,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub seller_id: String,
    #[serde(default)]
    pub permalink: String,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (${:.2} | sold: {} | {})",
            self.title, self.price, self.sold_quantity, self.condition,
        )
    }
}

/// Listing condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::New => write!(f, "new"),
            Condition::Used => write!(f, "used"),
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Condition::New),
            "used" | "refurbished" => Ok(Condition::Used),
            _ => Err(anyhow::anyhow!("Unknown listing condition: {s}")),
        }
    }
}

/// One point of a search-interest time series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Relative interest, 0–100.
    pub value: f64,
}

/// Date-indexed search-interest series for one keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSeries {
    pub keyword: String,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// One community discussion post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub score: i64,
    pub num_comments: u32,
    pub created_at: DateTime<Utc>,
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
}

impl CommunityPost {
    /// Title and body joined, for keyword matching.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

// ---------------------------------------------------------------------------
// Per-niche aggregates
// ---------------------------------------------------------------------------

/// Data source identifier, carried on every aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    Marketplace,
    Trends,
    Community,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::Marketplace => write!(f, "marketplace"),
            SourceTag::Trends => write!(f, "trends"),
            SourceTag::Community => write!(f, "community"),
        }
    }
}

/// Marketplace aggregate for one niche: listing counts and price statistics.
///
/// Produced once per run by the normalizer and never mutated; scoring
/// always derives a new score row from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicheObservation {
    pub niche: String,
    pub item_count: usize,
    pub price_mean: f64,
    /// Sample standard deviation (n−1); 0 for single-listing niches.
    pub price_std: f64,
    pub price_min: f64,
    pub price_max: f64,
    /// Sum of `sold_quantity` across listings.
    pub total_sold: u64,
    pub source: SourceTag,
}

impl fmt::Display for NicheObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} listings | mean ${:.2} | sold {})",
            self.source, self.niche, self.item_count, self.price_mean, self.total_sold,
        )
    }
}

/// Trends aggregate for one keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendObservation {
    pub keyword: String,
    pub interest_mean: f64,
    pub interest_std: f64,
    pub interest_min: f64,
    pub interest_max: f64,
    /// std / mean of the series; high = inconsistent search demand.
    pub volatility: f64,
    /// Least-squares slope of the series (interest units per sample).
    pub slope: f64,
}

/// Community aggregate for one niche.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityObservation {
    pub niche: String,
    pub post_count: usize,
    /// Posts whose text matched a demand/need keyword.
    pub opportunity_posts: usize,
    pub mean_score: f64,
    pub mean_comments: f64,
}

// ---------------------------------------------------------------------------
// Integrated scoring output
// ---------------------------------------------------------------------------

/// A per-source score that may be missing for a niche.
///
/// The integrator resolves `Absent` to the configured neutral default;
/// absent data is never silently coerced to a number before that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SourceSignal {
    Present(f64),
    Absent,
}

impl SourceSignal {
    /// The score, or `default` when this source contributed nothing.
    pub fn resolve(&self, default: f64) -> f64 {
        match self {
            SourceSignal::Present(v) => *v,
            SourceSignal::Absent => default,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, SourceSignal::Present(_))
    }
}

impl fmt::Display for SourceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSignal::Present(v) => write!(f, "{v:.2}"),
            SourceSignal::Absent => write!(f, "-"),
        }
    }
}

/// Decision category assigned to a ranked niche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NicheLabel {
    /// High demand and low competition: act now.
    QuickWin,
    /// Established market with good margins.
    CashCow,
    /// Growing search demand ahead of supply.
    Emerging,
    /// Decent all-round; validate before scaling.
    Balanced,
    Avoid,
}

impl fmt::Display for NicheLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NicheLabel::QuickWin => write!(f, "quick-win"),
            NicheLabel::CashCow => write!(f, "cash-cow"),
            NicheLabel::Emerging => write!(f, "emerging"),
            NicheLabel::Balanced => write!(f, "balanced"),
            NicheLabel::Avoid => write!(f, "avoid"),
        }
    }
}

/// One row of the final ranked opportunity table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedScore {
    pub niche: String,
    pub marketplace: SourceSignal,
    pub trends: SourceSignal,
    pub community: SourceSignal,
    pub adjustment: SourceSignal,
    /// Weighted combination of the four terms, rounded to 2 decimals.
    pub final_score: f64,
    pub label: NicheLabel,
    /// Mean market price for the niche, when the marketplace saw it.
    pub representative_price: Option<f64>,
}

impl fmt::Display for IntegratedScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}/10 [{}] (meli: {} | trends: {} | community: {})",
            self.niche, self.final_score, self.label, self.marketplace, self.trends, self.community,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
