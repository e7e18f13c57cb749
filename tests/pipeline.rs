//! End-to-end pipeline test on deterministic fixture data.
//!
//! Drives raw records → normalization → scoring → integration →
//! profitability → sensitivity → cash-flow, all in-memory with no
//! network, the way the binary wires the same stages together.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use dataflip::report;
use dataflip::scoring::integrator::{MatchStrategy, NicheMatcher};
use dataflip::scoring::ScoringPipeline;
use dataflip::simulate::capacity::{build_schedule, CapacityConfig};
use dataflip::simulate::cashflow::{CashflowConfig, CashflowSimulator, ThroughputRates};
use dataflip::simulate::profit::{
    scenario_ladder, CostStructure, FlipOptions, MarginSimulator, ScenarioKind,
};
use dataflip::simulate::sensitivity::{break_even_units, sweep_buy_price, BreakEven, SweepConfig};
use dataflip::types::{CommunityPost, Condition, Listing, SourceSignal, TrendPoint, TrendSeries};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn listing(id: &str, price: f64, sold: u32) -> Listing {
    Listing {
        id: id.to_string(),
        title: format!("Listing {id}"),
        price,
        sold_quantity: sold,
        condition: Condition::Used,
        free_shipping: true,
        category_id: "MLM1712".to_string(),
        seller_id: "777".to_string(),
        permalink: String::new(),
    }
}

fn series(keyword: &str, values: &[f64]) -> TrendSeries {
    TrendSeries {
        keyword: keyword.to_string(),
        points: values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendPoint {
                date: NaiveDate::from_ymd_opt(2024, 11, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(7 * i as u64))
                    .unwrap(),
                value: *v,
            })
            .collect(),
    }
}

fn post(id: &str, title: &str, comments: u32) -> CommunityPost {
    CommunityPost {
        id: id.to_string(),
        title: title.to_string(),
        body: String::new(),
        score: 30,
        num_comments: comments,
        created_at: Utc.with_ymd_and_hms(2024, 11, 10, 12, 0, 0).unwrap(),
        subreddit: "Flipping".to_string(),
        permalink: String::new(),
    }
}

fn fixture_pipeline() -> ScoringPipeline {
    ScoringPipeline::with_defaults(NicheMatcher::new(
        vec!["hp 12c".to_string(), "mecanico".to_string()],
        MatchStrategy::ExactThenFuzzy { threshold: 0.45 },
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn full_pipeline_ranks_and_simulates() {
    let pipeline = fixture_pipeline();

    // Two niches with marketplace data; the keyboard niche is clearly better
    // (more sales, rising search interest, real community demand).
    let listings = vec![
        (
            "teclado mecanico".to_string(),
            vec![
                listing("k1", 1200.0, 300),
                listing("k2", 1800.0, 250),
                listing("k3", 1500.0, 180),
            ],
        ),
        (
            "ipod classic".to_string(),
            vec![listing("i1", 1800.0, 10), listing("i2", 2000.0, 5)],
        ),
    ];

    let trend_data = vec![
        series("teclado", &[55.0, 60.0, 64.0, 70.0, 75.0]),
        series("ipod classic", &[20.0, 18.0, 22.0, 19.0, 21.0]),
    ];

    let posts = vec![(
        "teclado mecanico".to_string(),
        vec![
            post("p1", "Looking for a good mechanical keyboard, recommend one?", 25),
            post("p2", "Donde comprar teclados baratos?", 14),
            post("p3", "Mi setup nuevo", 2),
        ],
    )];

    let ranked = pipeline.run(&listings, &trend_data, &posts).unwrap();

    // The fuzzy matcher folds "teclado" (trends) into "teclado mecanico"
    assert_eq!(ranked.len(), 2);
    let top = &ranked[0];
    assert_eq!(top.niche, "teclado mecanico");
    assert!(top.marketplace.is_present());
    assert!(top.trends.is_present());
    assert!(top.community.is_present());
    assert!(top.final_score > ranked[1].final_score);

    // ipod only has marketplace + trends; community resolves to neutral
    let ipod = &ranked[1];
    assert_eq!(ipod.community, SourceSignal::Absent);

    // Profitability over the winner's representative price
    let price = top.representative_price.expect("marketplace price present");
    let market_price = Decimal::from_f64_retain(price).unwrap();
    let simulator = MarginSimulator::new(CostStructure::default());
    let options = FlipOptions {
        include_time_cost: false,
        ..FlipOptions::default()
    };

    let outcomes: Vec<_> = scenario_ladder(market_price)
        .into_iter()
        .map(|s| {
            (
                s.kind,
                simulator.simulate(s.buy_price, s.sell_price, &options).unwrap(),
            )
        })
        .collect();
    assert_eq!(outcomes.len(), 3);

    // Optimistic beats realistic beats conservative, by construction
    let net = |kind: ScenarioKind| {
        outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, o)| o.net_profit)
            .unwrap()
    };
    assert!(net(ScenarioKind::Optimistic) > net(ScenarioKind::Realistic));
    assert!(net(ScenarioKind::Realistic) > net(ScenarioKind::Conservative));

    // Sensitivity: the sweep verdict is consistent with the per-point flags
    let sweep = sweep_buy_price(&simulator, market_price, &options, SweepConfig::default()).unwrap();
    match sweep.verdict {
        dataflip::simulate::sensitivity::SweepVerdict::MaxViable { buy_pct, .. } => {
            assert!(sweep.points.iter().all(|p| p.viable == (p.buy_pct <= buy_pct)));
        }
        dataflip::simulate::sensitivity::SweepVerdict::NoViablePrice => {
            assert!(sweep.points.iter().all(|p| !p.viable));
        }
    }

    // Cash-flow projection with the realistic outcome
    let realistic = net(ScenarioKind::Realistic);
    let buy = outcomes
        .iter()
        .find(|(k, _)| *k == ScenarioKind::Realistic)
        .map(|(_, o)| o.buy_price)
        .unwrap();

    let schedule = build_schedule(&CapacityConfig::default());
    let periods: Vec<_> = schedule.iter().map(|p| p.kind).collect();
    let cashflow = CashflowSimulator::new(CashflowConfig::default());
    let ladder = cashflow.run_ladder(
        &periods,
        ThroughputRates::default(),
        buy,
        realistic,
        dec!(5000),
        dec!(20000),
    );

    assert_eq!(ladder.len(), 3);
    for (_, report) in &ladder {
        assert_eq!(report.weeks.len(), schedule.len());
    }
    // Higher throughput never does worse
    assert!(ladder[2].1.cumulative_profit >= ladder[0].1.cumulative_profit);
}

#[test]
fn missing_source_uses_neutral_default_in_final_score() {
    let pipeline = fixture_pipeline();

    let listings = vec![(
        "chamarra carhartt".to_string(),
        vec![
            listing("c1", 700.0, 120),
            listing("c2", 1100.0, 90),
            listing("c3", 950.0, 60),
        ],
    )];

    let ranked = pipeline.run(&listings, &[], &[]).unwrap();
    assert_eq!(ranked.len(), 1);
    let row = &ranked[0];

    // Every non-marketplace term resolved to exactly 5.0
    let m = match row.marketplace {
        SourceSignal::Present(v) => v,
        SourceSignal::Absent => panic!("marketplace must be present"),
    };
    let expected = m * 0.40 + 5.0 * 0.35 + 5.0 * 0.15 + 5.0 * 0.10;
    let expected = (expected * 100.0).round() / 100.0;
    assert!((row.final_score - expected).abs() < 1e-9);
}

#[test]
fn break_even_matches_realistic_unit_economics() {
    let simulator = MarginSimulator::new(CostStructure::default());
    let options = FlipOptions {
        include_time_cost: false,
        ..FlipOptions::default()
    };

    // Realistic scenario on a $1000 item: buy 600, sell 1000
    let outcome = simulator.simulate(dec!(600), dec!(1000), &options).unwrap();
    assert!(outcome.net_profit < Decimal::ZERO);
    // Underwater unit economics have no finite break-even
    assert_eq!(
        break_even_units(dec!(5000), outcome.net_profit),
        BreakEven::NoFiniteBreakEven
    );

    // The optimistic scenario is profitable and yields a finite answer
    let outcome = simulator.simulate(dec!(450), dec!(1100), &options).unwrap();
    assert!(outcome.net_profit > Decimal::ZERO);
    match break_even_units(dec!(5000), outcome.net_profit) {
        BreakEven::Units(n) => {
            let n_dec = Decimal::from(n);
            assert!(n_dec * outcome.net_profit >= dec!(5000));
            assert!((n_dec - Decimal::ONE) * outcome.net_profit < dec!(5000));
        }
        BreakEven::NoFiniteBreakEven => panic!("profitable unit must break even"),
    }
}

#[test]
fn recommendation_prefers_profitable_high_scorers() {
    let pipeline = fixture_pipeline();

    let listings = vec![
        (
            "teclado mecanico".to_string(),
            vec![
                listing("k1", 1200.0, 300),
                listing("k2", 1800.0, 250),
                listing("k3", 1500.0, 180),
            ],
        ),
        (
            "ipod classic".to_string(),
            vec![listing("i1", 800.0, 10), listing("i2", 900.0, 5)],
        ),
    ];
    let ranked = pipeline.run(&listings, &[], &[]).unwrap();

    let simulator = MarginSimulator::new(CostStructure::default());
    let options = FlipOptions {
        include_time_cost: false,
        ..FlipOptions::default()
    };
    let realistic: Vec<_> = ranked
        .iter()
        .filter_map(|row| {
            let price = Decimal::from_f64_retain(row.representative_price?)?;
            let outcome = simulator
                .simulate(price * dec!(0.60), price, &options)
                .ok()?;
            Some((row.niche.clone(), outcome))
        })
        .collect();

    let recs = report::recommend(&ranked, &realistic);
    assert!(!recs.is_empty());
    assert_eq!(recs[0].niche, ranked[0].niche);
    assert!(recs[0].suggested_investment > 0.0);
}
