//! DataFlip — second-hand resale niche analyzer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! fetches raw data from the enabled sources, then runs the scoring and
//! profitability pipeline and exports the run's snapshot tables.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{info, warn};

use dataflip::config::{self, AppConfig};
use dataflip::report::{self, ProfitabilityRow};
use dataflip::scoring::community::CommunityWeights;
use dataflip::scoring::integrator::{IntegrationWeights, MatchStrategy, NicheMatcher};
use dataflip::scoring::marketplace::MarketplaceWeights;
use dataflip::scoring::trends::TrendsWeights;
use dataflip::scoring::ScoringPipeline;
use dataflip::simulate::capacity::{build_schedule, CapacityConfig};
use dataflip::simulate::cashflow::{CashflowConfig, CashflowSimulator, ThroughputRates};
use dataflip::simulate::profit::{
    scenario_ladder, CostStructure, FlipOptions, FlipOutcome, MarginSimulator, ScenarioKind,
};
use dataflip::simulate::sensitivity::{break_even_units, sweep_buy_price, SweepConfig};
use dataflip::sources::mercado::MercadoClient;
use dataflip::sources::reddit::RedditClient;
use dataflip::sources::trends::TrendsClient;
use dataflip::sources::SourceHub;
use dataflip::types::IntegratedScore;

const BANNER: &str = r#"
  ____        _        _____ _ _
 |  _ \  __ _| |_ __ _|  ___| (_)_ __
 | | | |/ _` | __/ _` | |_  | | | '_ \
 | |_| | (_| | || (_| |  _| | | | |_) |
 |____/ \__,_|\__\__,_|_|   |_|_| .__/
                                |_|
  Niche discovery & resale profitability
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        niches = cfg.analysis.niches.len(),
        mercado = cfg.sources.mercado.enabled,
        trends = cfg.sources.trends.enabled,
        reddit = cfg.sources.reddit.enabled,
        "DataFlip starting up"
    );

    // -- Source clients ---------------------------------------------------

    let mercado = if cfg.sources.mercado.enabled {
        Some(MercadoClient::new(&cfg.sources.mercado)?)
    } else {
        None
    };
    let trends = if cfg.sources.trends.enabled {
        Some(TrendsClient::new(&cfg.sources.trends)?)
    } else {
        None
    };
    let reddit = if cfg.sources.reddit.enabled {
        Some(RedditClient::new(&cfg.sources.reddit)?)
    } else {
        None
    };

    let hub = SourceHub::new(mercado, trends, reddit);
    let data = hub.collect(&cfg.analysis.niches).await;
    info!(
        listing_batches = data.listings.len(),
        trend_series = data.series.len(),
        post_batches = data.posts.len(),
        "Source collection complete"
    );

    // -- Scoring -----------------------------------------------------------

    let matcher = NicheMatcher::new(
        cfg.analysis.noise_tokens.clone(),
        if cfg.analysis.match_threshold > 0.0 {
            MatchStrategy::ExactThenFuzzy {
                threshold: cfg.analysis.match_threshold,
            }
        } else {
            MatchStrategy::Exact
        },
    );

    let integration_weights = IntegrationWeights {
        marketplace: cfg.weights.marketplace,
        trends: cfg.weights.trends,
        community: cfg.weights.community,
        adjustment: cfg.weights.adjustment,
        neutral: cfg.analysis.neutral_score,
    };

    let pipeline = ScoringPipeline::new(
        MarketplaceWeights::default(),
        TrendsWeights::default(),
        CommunityWeights::default(),
        integration_weights,
        matcher,
        dataflip::scoring::normalize::OPPORTUNITY_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect(),
    );

    let ranked = pipeline
        .run(&data.listings, &data.series, &data.posts)
        .context("Scoring pipeline failed")?;

    info!(niches = ranked.len(), "Opportunity table ranked");
    for row in ranked.iter().take(10) {
        info!(row = %row, "Ranked niche");
    }

    // -- Profitability -----------------------------------------------------

    let costs = cost_structure_from(&cfg.costs);
    let simulator = MarginSimulator::new(costs);
    let options = FlipOptions::default();

    let mut profitability_rows: Vec<ProfitabilityRow> = Vec::new();
    let mut realistic: Vec<(String, FlipOutcome)> = Vec::new();

    for row in &ranked {
        let Some(price) = row.representative_price else {
            warn!(niche = %row.niche, "No representative price, skipping simulation");
            continue;
        };
        let market_price = dec(price);

        for scenario in scenario_ladder(market_price) {
            match simulator.simulate(scenario.buy_price, scenario.sell_price, &options) {
                Ok(outcome) => {
                    if scenario.kind == ScenarioKind::Realistic {
                        realistic.push((row.niche.clone(), outcome.clone()));
                    }
                    profitability_rows.push(ProfitabilityRow {
                        niche: row.niche.clone(),
                        scenario: scenario.kind,
                        outcome,
                    });
                }
                Err(e) => warn!(niche = %row.niche, scenario = %scenario.kind, error = %e, "Scenario skipped"),
            }
        }
    }

    // -- Sensitivity + break-even on the top-ranked niche -------------------

    if let Some(top) = ranked.first() {
        run_deep_dive(top, &simulator, &cfg, &realistic)?;
    }

    // -- Recommendations ---------------------------------------------------

    let recommendations = report::recommend(&ranked, &realistic);
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            rank = i + 1,
            niche = %rec.niche,
            combined = format!("{:.2}", rec.combined_score),
            unit_profit = format!("${:.2}", rec.net_profit_per_unit),
            roi = format!("{:.1}%", rec.roi_net),
            investment = format!("${:.2} ({} units)", rec.suggested_investment, rec.suggested_units),
            expected = format!("${:.2}", rec.expected_profit),
            "Recommended niche"
        );
    }

    // -- Export -------------------------------------------------------------

    if cfg.export.enabled {
        let run_id = uuid::Uuid::new_v4().to_string();
        let out_dir = Path::new(&cfg.export.out_dir);
        let scorecard_path = report::export_scorecard(&ranked, out_dir, &run_id)?;
        let profitability_path =
            report::export_profitability(&profitability_rows, out_dir, &run_id)?;
        info!(
            scorecard = %scorecard_path.display(),
            profitability = %profitability_path.display(),
            run_id = %run_id,
            "Snapshots written"
        );
    }

    info!("DataFlip run complete.");
    Ok(())
}

/// Sensitivity sweep, break-even, and the multi-week projection for the
/// winning niche.
fn run_deep_dive(
    top: &IntegratedScore,
    simulator: &MarginSimulator,
    cfg: &AppConfig,
    realistic: &[(String, FlipOutcome)],
) -> Result<()> {
    let Some(price) = top.representative_price else {
        warn!(niche = %top.niche, "Top niche has no price data, skipping deep dive");
        return Ok(());
    };

    info!(niche = %top.niche, price = format!("${price:.2}"), "Deep dive on top niche");

    // How much can we pay for one and still clear the ROI floor?
    let sweep = sweep_buy_price(
        simulator,
        dec(price),
        &FlipOptions::default(),
        SweepConfig::default(),
    )?;
    info!(niche = %top.niche, verdict = %sweep.verdict, "Purchase-price sensitivity");

    let Some((_, outcome)) = realistic.iter().find(|(n, _)| *n == top.niche) else {
        return Ok(());
    };

    // Units to recover the starting capital at realistic unit economics
    let target = dec(cfg.simulation.starting_capital);
    let breakeven = break_even_units(target, outcome.net_profit);
    info!(niche = %top.niche, target = %target, result = %breakeven, "Break-even");

    // Project the whole program: weekly capacity over the calendar,
    // three throughput scenarios, verdict against the savings goal.
    let capacity_cfg = CapacityConfig {
        weeks_normal: cfg.simulation.weeks_normal,
        weeks_exam: cfg.simulation.weeks_exam,
        weeks_vacation: cfg.simulation.weeks_vacation,
        weekly_hours_normal: cfg.simulation.weekly_hours_normal,
        weekly_hours_exam: cfg.simulation.weekly_hours_exam,
        weekly_hours_vacation: cfg.simulation.weekly_hours_vacation,
        hours_per_unit: cfg.simulation.hours_per_unit,
        efficiency: cfg.simulation.efficiency,
    };
    let schedule = build_schedule(&capacity_cfg);
    let periods: Vec<_> = schedule.iter().map(|p| p.kind).collect();
    info!(
        weeks = schedule.len(),
        total_hours = schedule.last().map(|p| p.cumulative_hours).unwrap_or(0.0),
        realistic_units = schedule.last().map(|p| p.cumulative_units).unwrap_or(0),
        "Capacity schedule built"
    );

    let cashflow = CashflowSimulator::new(CashflowConfig {
        sell_through_rate: cfg.simulation.sell_through_rate,
        ..CashflowConfig::default()
    });
    let rates = ThroughputRates {
        conservative: cfg.simulation.base_rate_conservative,
        realistic: cfg.simulation.base_rate_realistic,
        optimistic: cfg.simulation.base_rate_optimistic,
    };
    let ladder = cashflow.run_ladder(
        &periods,
        rates,
        outcome.buy_price,
        outcome.net_profit,
        dec(cfg.simulation.starting_capital),
        dec(cfg.simulation.profit_target),
    );

    for (kind, report) in &ladder {
        info!(
            scenario = %kind,
            base_rate = report.base_rate,
            units_sold = report.total_units_sold,
            profit = format!("${:.2}", report.cumulative_profit),
            capital = format!("${:.2}", report.final_capital),
            verdict = %report.verdict,
            "Cash-flow projection"
        );
    }

    Ok(())
}

fn cost_structure_from(costs: &config::CostsConfig) -> CostStructure {
    CostStructure {
        commission_standard: dec(costs.commission_standard),
        commission_technology: dec(costs.commission_technology),
        commission_collectibles: dec(costs.commission_collectibles),
        processor_rate: dec(costs.processor_rate),
        processor_tax_rate: dec(costs.processor_tax_rate),
        shipping: dec(costs.shipping),
        packaging: dec(costs.packaging),
        sourcing_hours: dec(costs.sourcing_hours),
        listing_hours: dec(costs.listing_hours),
        packing_hours: dec(costs.packing_hours),
        hourly_rate: dec(costs.hourly_rate),
        transport: dec(costs.transport),
        min_roi_pct: dec(costs.min_roi_pct),
    }
}

fn dec(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default()
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dataflip=info"));

    let json_logging = std::env::var("DATAFLIP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
