//! Per-source normalization.
//!
//! Turns raw records from one source into a per-niche numeric aggregate.
//! A niche with zero parseable records yields `EmptyNiche` — the caller
//! records the niche as unscored by that source and carries on; it is not
//! a pipeline abort.

use thiserror::Error;
use tracing::debug;

use crate::types::{
    CommunityObservation, CommunityPost, Listing, NicheObservation, SourceTag, TrendObservation,
    TrendSeries,
};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("no parseable {source_tag} records for niche '{niche}'")]
    EmptyNiche { niche: String, source_tag: SourceTag },
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n−1). Zero for fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Least-squares slope of `values` against their index (0, 1, 2, ...).
pub(crate) fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

// ---------------------------------------------------------------------------
// Marketplace listings → NicheObservation
// ---------------------------------------------------------------------------

/// Aggregate a niche's listings into count, price stats, and sold volume.
///
/// Listings with a non-positive or non-finite price are discarded before
/// aggregation; a missing `sold_quantity` has already been defaulted to 0
/// at deserialization.
pub fn observe_listings(niche: &str, listings: &[Listing]) -> Result<NicheObservation, NormalizeError> {
    let prices: Vec<f64> = listings
        .iter()
        .filter(|l| l.price.is_finite() && l.price > 0.0)
        .map(|l| l.price)
        .collect();

    if prices.is_empty() {
        return Err(NormalizeError::EmptyNiche {
            niche: niche.to_string(),
            source_tag: SourceTag::Marketplace,
        });
    }

    let total_sold: u64 = listings
        .iter()
        .filter(|l| l.price.is_finite() && l.price > 0.0)
        .map(|l| l.sold_quantity as u64)
        .sum();

    let obs = NicheObservation {
        niche: niche.to_string(),
        item_count: prices.len(),
        price_mean: mean(&prices),
        price_std: sample_std(&prices),
        price_min: prices.iter().cloned().fold(f64::INFINITY, f64::min),
        price_max: prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        total_sold,
        source: SourceTag::Marketplace,
    };

    debug!(%obs, "Marketplace niche aggregated");
    Ok(obs)
}

// ---------------------------------------------------------------------------
// Trend series → TrendObservation
// ---------------------------------------------------------------------------

/// Summarize a keyword's interest series: level, spread, volatility, slope.
pub fn observe_trend(series: &TrendSeries) -> Result<TrendObservation, NormalizeError> {
    let values = series.values();
    if values.is_empty() {
        return Err(NormalizeError::EmptyNiche {
            niche: series.keyword.clone(),
            source_tag: SourceTag::Trends,
        });
    }

    let interest_mean = mean(&values);
    let interest_std = sample_std(&values);
    // Volatility is undefined for a flat-zero series; treat as maximally
    // inconsistent so the consistency score bottoms out rather than NaN-ing.
    let volatility = if interest_mean > 0.0 {
        interest_std / interest_mean
    } else {
        f64::INFINITY
    };

    Ok(TrendObservation {
        keyword: series.keyword.clone(),
        interest_mean,
        interest_std,
        interest_min: values.iter().cloned().fold(f64::INFINITY, f64::min),
        interest_max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        volatility,
        slope: linear_slope(&values),
    })
}

// ---------------------------------------------------------------------------
// Community posts → CommunityObservation
// ---------------------------------------------------------------------------

/// Phrases that mark a post as expressing demand for a product.
pub const OPPORTUNITY_KEYWORDS: &[&str] = &[
    "no encuentro",
    "donde comprar",
    "alguien sabe",
    "recomendaciones",
    "busco",
    "necesito",
    "ayuda",
    "dónde",
    "mejor",
    "barato",
    "vale la pena",
    "worth it",
    "looking for",
    "recommend",
    "help",
];

/// Whether a post's text contains any demand keyword.
pub fn is_opportunity(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Aggregate a niche's community posts: volume, demand signals, engagement.
pub fn observe_posts(
    niche: &str,
    posts: &[CommunityPost],
    keywords: &[&str],
) -> Result<CommunityObservation, NormalizeError> {
    if posts.is_empty() {
        return Err(NormalizeError::EmptyNiche {
            niche: niche.to_string(),
            source_tag: SourceTag::Community,
        });
    }

    let opportunity_posts = posts
        .iter()
        .filter(|p| is_opportunity(&p.full_text(), keywords))
        .count();
    let scores: Vec<f64> = posts.iter().map(|p| p.score as f64).collect();
    let comments: Vec<f64> = posts.iter().map(|p| p.num_comments as f64).collect();

    Ok(CommunityObservation {
        niche: niche.to_string(),
        post_count: posts.len(),
        opportunity_posts,
        mean_score: mean(&scores),
        mean_comments: mean(&comments),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Condition;
    use chrono::Utc;

    fn make_listing(id: &str, price: f64, sold: u32) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Listing {id}"),
            price,
            sold_quantity: sold,
            condition: Condition::Used,
            free_shipping: false,
            category_id: "MLM1234".to_string(),
            seller_id: "seller-1".to_string(),
            permalink: String::new(),
        }
    }

    fn make_post(id: &str, title: &str, comments: u32) -> CommunityPost {
        CommunityPost {
            id: id.to_string(),
            title: title.to_string(),
            body: String::new(),
            score: 10,
            num_comments: comments,
            created_at: Utc::now(),
            subreddit: "Flipping".to_string(),
            permalink: String::new(),
        }
    }

    #[test]
    fn test_observe_listings_basic() {
        let listings = vec![
            make_listing("a", 100.0, 5),
            make_listing("b", 200.0, 10),
            make_listing("c", 300.0, 0),
        ];
        let obs = observe_listings("teclado mecanico", &listings).unwrap();
        assert_eq!(obs.item_count, 3);
        assert!((obs.price_mean - 200.0).abs() < 1e-9);
        assert_eq!(obs.price_min, 100.0);
        assert_eq!(obs.price_max, 300.0);
        assert_eq!(obs.total_sold, 15);
        // Sample std of [100, 200, 300] is 100
        assert!((obs.price_std - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_observe_listings_discards_bad_prices() {
        let listings = vec![
            make_listing("a", 0.0, 5),
            make_listing("b", -50.0, 2),
            make_listing("c", 150.0, 1),
        ];
        let obs = observe_listings("ipod", &listings).unwrap();
        assert_eq!(obs.item_count, 1);
        assert_eq!(obs.total_sold, 1);
    }

    #[test]
    fn test_observe_listings_empty_is_flagged() {
        let err = observe_listings("nada", &[]).unwrap_err();
        assert!(matches!(err, NormalizeError::EmptyNiche { .. }));

        // All-unparseable also counts as empty
        let listings = vec![make_listing("a", 0.0, 5)];
        assert!(observe_listings("nada", &listings).is_err());
    }

    #[test]
    fn test_observe_trend_stats() {
        let series = TrendSeries {
            keyword: "game boy".to_string(),
            points: (0..5)
                .map(|i| crate::types::TrendPoint {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 11, 1 + i).unwrap(),
                    value: 10.0 * (i + 1) as f64,
                })
                .collect(),
        };
        let obs = observe_trend(&series).unwrap();
        assert!((obs.interest_mean - 30.0).abs() < 1e-9);
        // Strictly increasing series: slope = 10 per sample
        assert!((obs.slope - 10.0).abs() < 1e-9);
        assert!(obs.volatility > 0.0);
    }

    #[test]
    fn test_observe_trend_flat_zero_has_infinite_volatility() {
        let series = TrendSeries {
            keyword: "dead keyword".to_string(),
            points: vec![
                crate::types::TrendPoint {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
                    value: 0.0,
                },
                crate::types::TrendPoint {
                    date: chrono::NaiveDate::from_ymd_opt(2024, 11, 8).unwrap(),
                    value: 0.0,
                },
            ],
        };
        let obs = observe_trend(&series).unwrap();
        assert!(obs.volatility.is_infinite());
        assert_eq!(obs.slope, 0.0);
    }

    #[test]
    fn test_observe_posts_counts_opportunities() {
        let posts = vec![
            make_post("p1", "Where to buy a cheap game boy? Looking for deals", 12),
            make_post("p2", "My collection photo dump", 3),
            make_post("p3", "Donde comprar ipod classic en CDMX", 8),
        ];
        let obs = observe_posts("game boy", &posts, OPPORTUNITY_KEYWORDS).unwrap();
        assert_eq!(obs.post_count, 3);
        assert_eq!(obs.opportunity_posts, 2);
        assert!((obs.mean_comments - 23.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_observe_posts_empty_is_flagged() {
        assert!(observe_posts("nada", &[], OPPORTUNITY_KEYWORDS).is_err());
    }

    #[test]
    fn test_linear_slope_degenerate() {
        assert_eq!(linear_slope(&[]), 0.0);
        assert_eq!(linear_slope(&[5.0]), 0.0);
        assert_eq!(linear_slope(&[5.0, 5.0, 5.0]), 0.0);
    }
}
