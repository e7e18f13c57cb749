//! Snapshot export and investment recommendation.
//!
//! Writes the ranked niche table and the profitability table as CSV
//! snapshots. Output files are stamped with the run id handed in by the
//! caller — downstream steps receive paths and values explicitly, nothing
//! ever loads "the most recent file matching a pattern".

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::simulate::profit::{FlipOutcome, ScenarioKind};
use crate::types::IntegratedScore;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// One row of the profitability table: a niche × scenario outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitabilityRow {
    pub niche: String,
    pub scenario: ScenarioKind,
    #[serde(flatten)]
    pub outcome: FlipOutcome,
}

/// Write the ranked niche table. Returns the written path.
pub fn export_scorecard(
    rows: &[IntegratedScore],
    out_dir: &Path,
    run_id: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;
    let path = out_dir.join(format!("scorecard_{run_id}.csv"));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    writer.write_record([
        "niche",
        "final_score",
        "marketplace_score",
        "trends_score",
        "community_score",
        "adjustment_score",
        "representative_price",
        "label",
    ])?;

    for row in rows {
        writer.write_record([
            row.niche.clone(),
            format!("{:.2}", row.final_score),
            row.marketplace.to_string(),
            row.trends.to_string(),
            row.community.to_string(),
            row.adjustment.to_string(),
            row.representative_price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_default(),
            row.label.to_string(),
        ])?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Scorecard exported");
    Ok(path)
}

/// Write the profitability table. Returns the written path.
pub fn export_profitability(
    rows: &[ProfitabilityRow],
    out_dir: &Path,
    run_id: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;
    let path = out_dir.join(format!("profitability_{run_id}.csv"));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    writer.write_record([
        "niche",
        "scenario",
        "buy_price",
        "sell_price",
        "commission",
        "processor_fee",
        "shipping",
        "packaging",
        "time_cost",
        "transport",
        "total_cost",
        "gross_profit",
        "net_profit",
        "roi_gross",
        "roi_net",
        "net_margin",
        "viable",
    ])?;

    for row in rows {
        let o = &row.outcome;
        writer.write_record([
            row.niche.clone(),
            row.scenario.to_string(),
            format!("{:.2}", o.buy_price),
            format!("{:.2}", o.sell_price),
            format!("{:.2}", o.commission),
            format!("{:.2}", o.processor_fee),
            format!("{:.2}", o.shipping),
            format!("{:.2}", o.packaging),
            format!("{:.2}", o.time_cost),
            format!("{:.2}", o.transport),
            format!("{:.2}", o.total_cost),
            format!("{:.2}", o.gross_profit),
            format!("{:.2}", o.net_profit),
            format!("{:.2}", o.roi_gross),
            format!("{:.2}", o.roi_net),
            format!("{:.2}", o.net_margin),
            o.viable.to_string(),
        ])?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Profitability table exported");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Investment recommendation
// ---------------------------------------------------------------------------

/// Starter batch size suggested per niche.
const SUGGESTED_UNITS: u32 = 5;

/// A recommended niche with its combined opportunity/profit score.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub niche: String,
    /// 0.4 × FINAL_SCORE + 0.3 × (roi/10) + 0.3 × (net profit, normalized to 10)
    pub combined_score: f64,
    pub net_profit_per_unit: f64,
    pub roi_net: f64,
    pub suggested_units: u32,
    pub suggested_investment: f64,
    pub expected_profit: f64,
}

/// Rank niches by market score and realistic-scenario economics combined.
///
/// `realistic` pairs each niche with its realistic-scenario outcome.
/// Niches that never made it through the simulator are skipped. Returns
/// the top three.
pub fn recommend(
    ranked: &[IntegratedScore],
    realistic: &[(String, FlipOutcome)],
) -> Vec<Recommendation> {
    let max_net = realistic
        .iter()
        .map(|(_, o)| o.net_profit.to_f64().unwrap_or(0.0))
        .fold(f64::NEG_INFINITY, f64::max);

    let mut recs: Vec<Recommendation> = ranked
        .iter()
        .filter_map(|row| {
            let (_, outcome) = realistic.iter().find(|(n, _)| *n == row.niche)?;
            let net = outcome.net_profit.to_f64().unwrap_or(0.0);
            let roi = outcome.roi_net.to_f64().unwrap_or(0.0);
            let buy = outcome.buy_price.to_f64().unwrap_or(0.0);

            let profit_term = if max_net > 0.0 { net / max_net * 10.0 } else { 0.0 };
            let combined_score = row.final_score * 0.4 + (roi / 10.0) * 0.3 + profit_term * 0.3;

            Some(Recommendation {
                niche: row.niche.clone(),
                combined_score,
                net_profit_per_unit: net,
                roi_net: roi,
                suggested_units: SUGGESTED_UNITS,
                suggested_investment: buy * SUGGESTED_UNITS as f64,
                expected_profit: net * SUGGESTED_UNITS as f64,
            })
        })
        .collect();

    recs.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    recs.truncate(3);
    recs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::profit::{CostStructure, FlipOptions, MarginSimulator};
    use crate::types::{NicheLabel, SourceSignal};

    fn temp_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("dataflip_test_{}", uuid::Uuid::new_v4()));
        p
    }

    fn make_row(niche: &str, final_score: f64) -> IntegratedScore {
        IntegratedScore {
            niche: niche.to_string(),
            marketplace: SourceSignal::Present(final_score),
            trends: SourceSignal::Absent,
            community: SourceSignal::Absent,
            adjustment: SourceSignal::Absent,
            final_score,
            label: NicheLabel::Balanced,
            representative_price: Some(1000.0),
        }
    }

    fn make_outcome(buy: f64, sell: f64) -> FlipOutcome {
        let sim = MarginSimulator::new(CostStructure::default());
        let opts = FlipOptions {
            include_time_cost: false,
            ..FlipOptions::default()
        };
        sim.simulate(
            Decimal::from_f64_retain(buy).unwrap_or_default(),
            Decimal::from_f64_retain(sell).unwrap_or_default(),
            &opts,
        )
        .unwrap()
    }

    #[test]
    fn test_export_scorecard_roundtrip() {
        let dir = temp_dir();
        let rows = vec![make_row("teclado mecanico", 8.2), make_row("ipod classic", 6.4)];
        let path = export_scorecard(&rows, &dir, "test-run").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("niche,final_score"));
        assert!(lines[1].contains("teclado mecanico"));
        assert!(lines[1].contains("8.20"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_profitability_roundtrip() {
        let dir = temp_dir();
        let rows = vec![ProfitabilityRow {
            niche: "teclado mecanico".to_string(),
            scenario: ScenarioKind::Realistic,
            outcome: make_outcome(600.0, 1000.0),
        }];
        let path = export_profitability(&rows, &dir, "test-run").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("realistic"));
        assert!(contents.contains("600.00"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_recommend_orders_by_combined_score() {
        let ranked = vec![make_row("meh", 5.0), make_row("winner", 8.0)];
        let realistic = vec![
            ("meh".to_string(), make_outcome(600.0, 800.0)),
            ("winner".to_string(), make_outcome(300.0, 1000.0)),
        ];
        let recs = recommend(&ranked, &realistic);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].niche, "winner");
        assert!(recs[0].combined_score > recs[1].combined_score);
        assert_eq!(recs[0].suggested_units, 5);
        assert!((recs[0].suggested_investment - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn test_recommend_skips_unsimulated_niches() {
        let ranked = vec![make_row("sin datos", 9.0), make_row("con datos", 6.0)];
        let realistic = vec![("con datos".to_string(), make_outcome(400.0, 900.0))];
        let recs = recommend(&ranked, &realistic);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].niche, "con datos");
    }

    #[test]
    fn test_recommend_truncates_to_three() {
        let ranked: Vec<IntegratedScore> =
            (0..5).map(|i| make_row(&format!("n{i}"), 7.0)).collect();
        let realistic: Vec<(String, FlipOutcome)> = (0..5)
            .map(|i| (format!("n{i}"), make_outcome(300.0, 1000.0)))
            .collect();
        assert_eq!(recommend(&ranked, &realistic).len(), 3);
    }
}
