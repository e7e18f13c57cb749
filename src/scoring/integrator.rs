//! Cross-source opportunity integration.
//!
//! Merges the marketplace, trends, and community score tables on a
//! normalized niche key, resolves missing sources to a neutral default,
//! and computes the weighted FINAL_SCORE plus a decision label per niche.
//!
//! Matching across sources is a best-effort fuzzy join: niche names come
//! from free-text search terms that differ slightly per source. False
//! merges and splits are possible and accepted; the similarity threshold
//! is a tunable parameter, not a hidden heuristic.

use anyhow::{bail, Result};
use tracing::{debug, info};

use super::community::CommunityScore;
use super::marketplace::MarketplaceScore;
use super::trends::TrendsScore;
use crate::types::{IntegratedScore, NicheLabel, SourceSignal};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Source weights for the FINAL_SCORE combination. Must sum to 1.
#[derive(Debug, Clone)]
pub struct IntegrationWeights {
    pub marketplace: f64,
    pub trends: f64,
    pub community: f64,
    pub adjustment: f64,
    /// Substituted for any Absent term.
    pub neutral: f64,
}

impl Default for IntegrationWeights {
    fn default() -> Self {
        Self {
            marketplace: 0.40,
            trends: 0.35,
            community: 0.15,
            adjustment: 0.10,
            neutral: 5.0,
        }
    }
}

/// How niche names are matched across sources.
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// Normalized keys must be identical.
    Exact,
    /// Exact first, then best fuzzy candidate at or above the threshold.
    ExactThenFuzzy { threshold: f64 },
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::ExactThenFuzzy { threshold: 0.45 }
    }
}

// ---------------------------------------------------------------------------
// Niche name matching
// ---------------------------------------------------------------------------

/// Normalizes and matches niche names across sources.
#[derive(Debug, Clone)]
pub struct NicheMatcher {
    noise_tokens: Vec<String>,
    strategy: MatchStrategy,
}

impl NicheMatcher {
    pub fn new(noise_tokens: Vec<String>, strategy: MatchStrategy) -> Self {
        Self {
            noise_tokens: noise_tokens.iter().map(|t| t.to_lowercase()).collect(),
            strategy,
        }
    }

    /// Lowercase, strip noise tokens, collapse whitespace.
    pub fn normalize_key(&self, name: &str) -> String {
        let mut key = name.to_lowercase();
        for token in &self.noise_tokens {
            key = key.replace(token.as_str(), "");
        }
        key.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Whether two already-normalized keys refer to the same niche.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match self.strategy {
            MatchStrategy::Exact => false,
            MatchStrategy::ExactThenFuzzy { threshold } => text_similarity(a, b) >= threshold,
        }
    }
}

/// Compute a normalised similarity score between two strings.
///
/// Uses a combination of:
/// 1. Word overlap (Jaccard index on tokens)
/// 2. Substring containment bonus
///
/// Returns 0.0 (no similarity) to 1.0 (identical after normalisation).
fn text_similarity(a: &str, b: &str) -> f64 {
    let norm = |s: &str| -> Vec<String> {
        s.split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2) // drop short words like "a", "in", "de"
            .map(|w| w.to_lowercase())
            .collect()
    };

    let words_a = norm(a);
    let words_b = norm(b);

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let set_a: std::collections::HashSet<&str> = words_a.iter().map(|s| s.as_str()).collect();
    let set_b: std::collections::HashSet<&str> = words_b.iter().map(|s| s.as_str()).collect();

    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;

    let jaccard = if union > 0.0 { intersection / union } else { 0.0 };

    // Containment bonus: short keys that sit fully inside longer ones
    let containment = if set_a.len() <= set_b.len() {
        intersection / set_a.len() as f64
    } else {
        intersection / set_b.len() as f64
    };

    (0.6 * jaccard + 0.4 * containment).min(1.0)
}

// ---------------------------------------------------------------------------
// Label thresholds
// ---------------------------------------------------------------------------

const QUICK_WIN_FINAL: f64 = 8.0;
const QUICK_WIN_TRENDS: f64 = 7.5;
const CASH_COW_FINAL: f64 = 7.0;
const CASH_COW_MARKETPLACE: f64 = 7.5;
const EMERGING_TRENDS: f64 = 8.0;
const EMERGING_MARKETPLACE: f64 = 6.0;
const BALANCED_FINAL: f64 = 6.0;

fn label_for(final_score: f64, marketplace: f64, trends: f64) -> NicheLabel {
    if final_score >= QUICK_WIN_FINAL && trends >= QUICK_WIN_TRENDS {
        NicheLabel::QuickWin
    } else if final_score >= CASH_COW_FINAL && marketplace >= CASH_COW_MARKETPLACE {
        NicheLabel::CashCow
    } else if trends >= EMERGING_TRENDS && marketplace < EMERGING_MARKETPLACE {
        NicheLabel::Emerging
    } else if final_score >= BALANCED_FINAL {
        NicheLabel::Balanced
    } else {
        NicheLabel::Avoid
    }
}

// ---------------------------------------------------------------------------
// Integrator
// ---------------------------------------------------------------------------

/// Merged-but-unscored working row.
struct MergedRow {
    display_name: String,
    key: String,
    marketplace: Option<MarketplaceScore>,
    trends: Option<TrendsScore>,
    community: Option<CommunityScore>,
}

pub struct Integrator {
    weights: IntegrationWeights,
    matcher: NicheMatcher,
}

impl Integrator {
    pub fn new(weights: IntegrationWeights, matcher: NicheMatcher) -> Self {
        Self { weights, matcher }
    }

    /// Merge the three per-source score tables into one ranked table.
    ///
    /// The result is sorted by FINAL_SCORE descending; the sort is stable,
    /// so ties keep their insertion order (marketplace rows first, then
    /// trends-only, then community-only). A niche missing from a source
    /// gets the neutral default for that term — it is never unrankable.
    ///
    /// Errors only when all three tables are empty: there is nothing to rank.
    pub fn integrate(
        &self,
        marketplace: &[MarketplaceScore],
        trends: &[TrendsScore],
        community: &[CommunityScore],
    ) -> Result<Vec<IntegratedScore>> {
        if marketplace.is_empty() && trends.is_empty() && community.is_empty() {
            bail!("no niches from any source — nothing to integrate");
        }

        let mut rows: Vec<MergedRow> = marketplace
            .iter()
            .map(|m| MergedRow {
                display_name: m.niche.clone(),
                key: self.matcher.normalize_key(&m.niche),
                marketplace: Some(m.clone()),
                trends: None,
                community: None,
            })
            .collect();

        for t in trends {
            let key = self.matcher.normalize_key(&t.keyword);
            match self.find_row(&rows, &key) {
                Some(idx) => {
                    debug!(keyword = %t.keyword, into = %rows[idx].display_name, "Trends keyword merged");
                    rows[idx].trends = Some(t.clone());
                }
                None => rows.push(MergedRow {
                    display_name: t.keyword.clone(),
                    key,
                    marketplace: None,
                    trends: Some(t.clone()),
                    community: None,
                }),
            }
        }

        for c in community {
            let key = self.matcher.normalize_key(&c.niche);
            match self.find_row(&rows, &key) {
                Some(idx) => {
                    debug!(niche = %c.niche, into = %rows[idx].display_name, "Community niche merged");
                    rows[idx].community = Some(c.clone());
                }
                None => rows.push(MergedRow {
                    display_name: c.niche.clone(),
                    key,
                    marketplace: None,
                    trends: None,
                    community: Some(c.clone()),
                }),
            }
        }

        let mut scored: Vec<IntegratedScore> = rows.iter().map(|r| self.score_row(r)).collect();

        // Stable sort: equal FINAL_SCOREs keep insertion order.
        scored.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            niches = scored.len(),
            merged_from = marketplace.len() + trends.len() + community.len(),
            "Integration complete"
        );

        Ok(scored)
    }

    /// First row whose key matches, exact before fuzzy.
    fn find_row(&self, rows: &[MergedRow], key: &str) -> Option<usize> {
        if let Some(idx) = rows.iter().position(|r| r.key == key) {
            return Some(idx);
        }
        rows.iter().position(|r| self.matcher.matches(&r.key, key))
    }

    fn score_row(&self, row: &MergedRow) -> IntegratedScore {
        let marketplace = row
            .marketplace
            .as_ref()
            .map(|m| SourceSignal::Present(m.total))
            .unwrap_or(SourceSignal::Absent);
        let trends = row
            .trends
            .as_ref()
            .map(|t| SourceSignal::Present(t.total))
            .unwrap_or(SourceSignal::Absent);
        let community = row
            .community
            .as_ref()
            .map(|c| SourceSignal::Present(c.total))
            .unwrap_or(SourceSignal::Absent);

        let representative_price = row.marketplace.as_ref().map(|m| m.price_mean);

        // The adjustment folds the trend direction and a cheap-logistics
        // price bonus around the neutral midpoint. Without trends data the
        // demand direction is unknown, so the whole term stays Absent.
        let adjustment = match row.trends.as_ref() {
            Some(t) => {
                let trend_bonus = (t.slope * 10.0).clamp(-1.0, 1.0);
                let price_bonus = match representative_price {
                    Some(p) if p < 1000.0 => 1.0,
                    Some(p) if p < 3000.0 => 0.5,
                    _ => 0.0,
                };
                SourceSignal::Present(self.weights.neutral + trend_bonus + price_bonus)
            }
            None => SourceSignal::Absent,
        };

        let n = self.weights.neutral;
        let m = marketplace.resolve(n);
        let t = trends.resolve(n);
        let c = community.resolve(n);
        let a = adjustment.resolve(n);

        let raw = m * self.weights.marketplace
            + t * self.weights.trends
            + c * self.weights.community
            + a * self.weights.adjustment;
        let final_score = (raw * 100.0).round() / 100.0;

        IntegratedScore {
            niche: row.display_name.clone(),
            marketplace,
            trends,
            community,
            adjustment,
            final_score,
            label: label_for(final_score, m, t),
            representative_price,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_meli(niche: &str, total: f64, price_mean: f64) -> MarketplaceScore {
        MarketplaceScore {
            niche: niche.to_string(),
            volume: total,
            competition: total,
            margin: total,
            logistics: total,
            seasonality: 5.0,
            total,
            price_mean,
            item_count: 30,
            total_sold: 500,
        }
    }

    fn make_trends(keyword: &str, total: f64, slope: f64) -> TrendsScore {
        TrendsScore {
            keyword: keyword.to_string(),
            volume: total,
            consistency: total,
            total,
            slope,
            interest_mean: 50.0,
        }
    }

    fn make_community(niche: &str, total: f64) -> CommunityScore {
        CommunityScore {
            niche: niche.to_string(),
            mentions: total,
            demand: total,
            engagement: total,
            total,
            post_count: 40,
            opportunity_posts: 20,
        }
    }

    fn default_integrator() -> Integrator {
        Integrator::new(
            IntegrationWeights::default(),
            NicheMatcher::new(
                vec!["hp 12c".to_string(), "advance".to_string()],
                MatchStrategy::default(),
            ),
        )
    }

    #[test]
    fn test_marketplace_only_niche_gets_neutral_elsewhere() {
        let integrator = default_integrator();
        let rows = integrator
            .integrate(&[make_meli("teclado mecanico", 8.0, 1500.0)], &[], &[])
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.trends, SourceSignal::Absent);
        assert_eq!(row.community, SourceSignal::Absent);
        assert_eq!(row.adjustment, SourceSignal::Absent);
        // 8.0×0.40 + 5.0×0.35 + 5.0×0.15 + 5.0×0.10 = 6.2
        assert!((row.final_score - 6.2).abs() < 1e-9);
    }

    #[test]
    fn test_sources_merge_on_fuzzy_key() {
        let integrator = default_integrator();
        let rows = integrator
            .integrate(
                &[make_meli("calculadora financiera HP 12C", 7.5, 850.0)],
                &[make_trends("calculadora financiera", 6.8, 0.05)],
                &[make_community("calculadora financiera", 6.0)],
            )
            .unwrap();

        assert_eq!(rows.len(), 1, "all three sources should merge into one row");
        let row = &rows[0];
        assert!(row.marketplace.is_present());
        assert!(row.trends.is_present());
        assert!(row.community.is_present());
    }

    #[test]
    fn test_unmatched_trends_keyword_becomes_own_row() {
        let integrator = default_integrator();
        let rows = integrator
            .integrate(
                &[make_meli("teclado mecanico", 8.0, 1500.0)],
                &[make_trends("chamarra carhartt", 7.0, 0.0)],
                &[],
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
        let carhartt = rows.iter().find(|r| r.niche == "chamarra carhartt").unwrap();
        assert_eq!(carhartt.marketplace, SourceSignal::Absent);
        assert!(carhartt.trends.is_present());
        assert!(carhartt.representative_price.is_none());
    }

    #[test]
    fn test_final_score_order_independent() {
        let integrator = default_integrator();
        let meli = vec![
            make_meli("teclado mecanico", 8.2, 1500.0),
            make_meli("game boy", 6.8, 1200.0),
        ];
        let trends = vec![
            make_trends("game boy", 7.2, -0.02),
            make_trends("teclado mecanico", 8.5, 0.15),
        ];
        let community = vec![make_community("teclado mecanico", 7.0)];

        let mut meli_rev = meli.clone();
        meli_rev.reverse();
        let mut trends_rev = trends.clone();
        trends_rev.reverse();

        let a = integrator.integrate(&meli, &trends, &community).unwrap();
        let b = integrator.integrate(&meli_rev, &trends_rev, &community).unwrap();

        for row in &a {
            let other = b.iter().find(|r| r.niche == row.niche).unwrap();
            assert_eq!(row.final_score, other.final_score);
            assert_eq!(row.label, other.label);
        }
    }

    #[test]
    fn test_adjustment_term() {
        let integrator = default_integrator();
        // Rising trend (slope 0.15 → bonus capped at 1) + cheap item (850 → bonus 1)
        let rows = integrator
            .integrate(
                &[make_meli("calculadora financiera", 7.0, 850.0)],
                &[make_trends("calculadora financiera", 7.0, 0.15)],
                &[],
            )
            .unwrap();
        assert_eq!(rows[0].adjustment, SourceSignal::Present(7.0));

        // Falling trend + expensive item: 5 − 1 + 0 = 4
        let rows = integrator
            .integrate(
                &[make_meli("consola retro", 7.0, 4000.0)],
                &[make_trends("consola retro", 7.0, -0.5)],
                &[],
            )
            .unwrap();
        assert_eq!(rows[0].adjustment, SourceSignal::Present(4.0));
    }

    #[test]
    fn test_labels() {
        // quick-win: final ≥ 8 and trends ≥ 7.5
        assert_eq!(label_for(8.3, 8.0, 8.0), NicheLabel::QuickWin);
        // cash-cow: final ≥ 7 and marketplace ≥ 7.5
        assert_eq!(label_for(7.2, 8.0, 6.0), NicheLabel::CashCow);
        // emerging: trends ≥ 8 but marketplace < 6
        assert_eq!(label_for(5.9, 4.0, 8.5), NicheLabel::Emerging);
        // balanced: final ≥ 6
        assert_eq!(label_for(6.5, 6.0, 6.0), NicheLabel::Balanced);
        assert_eq!(label_for(4.0, 4.0, 4.0), NicheLabel::Avoid);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let integrator = default_integrator();
        let rows = integrator
            .integrate(
                &[
                    make_meli("primero", 6.0, 500.0),
                    make_meli("segundo", 6.0, 500.0),
                    make_meli("mejor", 9.0, 500.0),
                ],
                &[],
                &[],
            )
            .unwrap();

        assert_eq!(rows[0].niche, "mejor");
        // Tied rows keep insertion order
        assert_eq!(rows[1].niche, "primero");
        assert_eq!(rows[2].niche, "segundo");
    }

    #[test]
    fn test_all_empty_is_hard_error() {
        let integrator = default_integrator();
        assert!(integrator.integrate(&[], &[], &[]).is_err());
    }

    #[test]
    fn test_exact_strategy_never_fuzzy_merges() {
        let integrator = Integrator::new(
            IntegrationWeights::default(),
            NicheMatcher::new(vec![], MatchStrategy::Exact),
        );
        let rows = integrator
            .integrate(
                &[make_meli("teclado mecanico gamer", 8.0, 1500.0)],
                &[make_trends("teclado mecanico", 7.0, 0.0)],
                &[],
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_text_similarity_bounds() {
        assert_eq!(text_similarity("", "teclado"), 0.0);
        assert!((text_similarity("teclado mecanico", "teclado mecanico") - 1.0).abs() < 1e-9);
        let sim = text_similarity("teclado mecanico gamer", "teclado mecanico");
        assert!(sim > 0.45 && sim < 1.0);
    }
}
