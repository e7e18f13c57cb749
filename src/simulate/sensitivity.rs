//! Purchase-price sensitivity sweep and break-even analysis.
//!
//! Answers two questions for a niche: "what is the most I can pay and
//! still hit the ROI floor?" and "how many units until a target amount
//! is recovered?". Both produce reportable verdicts — a sweep with no
//! viable point and a non-positive per-unit profit are expected outcomes
//! to display, not failures.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::profit::{FlipOptions, MarginSimulator, ProfitError};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Sweep range: buy price as a percentage of the fixed sell price.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub start_pct: u32,
    pub end_pct: u32,
    pub step_pct: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_pct: 30,
            end_pct: 80,
            step_pct: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// One sampled point of the sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub buy_pct: u32,
    pub buy_price: Decimal,
    pub net_profit: Decimal,
    pub roi_net: Decimal,
    pub viable: bool,
}

/// Result of scanning the purchase-price range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SweepVerdict {
    /// The highest percentage (and price) that stays viable.
    MaxViable { buy_pct: u32, buy_price: Decimal },
    /// Nothing in the range clears the ROI floor.
    NoViablePrice,
}

impl fmt::Display for SweepVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepVerdict::MaxViable { buy_pct, buy_price } => {
                write!(f, "max viable purchase: {buy_pct}% of sale price (${buy_price:.2})")
            }
            SweepVerdict::NoViablePrice => write!(f, "no viable purchase price in range"),
        }
    }
}

/// Full sweep output: every sampled point plus the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub sell_price: Decimal,
    pub points: Vec<SweepPoint>,
    pub verdict: SweepVerdict,
}

/// Sweep the purchase price over `config`'s range for a fixed sell price.
///
/// Viability flips from true to false exactly once when scanning in
/// increasing-price order (net profit falls linearly in the buy price),
/// so the last viable sample is the boundary.
pub fn sweep_buy_price(
    simulator: &MarginSimulator,
    sell_price: Decimal,
    options: &FlipOptions,
    config: SweepConfig,
) -> Result<SweepReport, ProfitError> {
    let mut points = Vec::new();
    let mut max_viable: Option<(u32, Decimal)> = None;

    let mut pct = config.start_pct;
    while pct <= config.end_pct {
        let buy_price = sell_price * Decimal::from(pct) / dec!(100);
        let outcome = simulator.simulate(buy_price, sell_price, options)?;

        if outcome.viable {
            max_viable = Some((pct, buy_price));
        }

        debug!(
            pct,
            net = %outcome.net_profit,
            roi = %outcome.roi_net,
            viable = outcome.viable,
            "Sweep point"
        );

        points.push(SweepPoint {
            buy_pct: pct,
            buy_price,
            net_profit: outcome.net_profit,
            roi_net: outcome.roi_net,
            viable: outcome.viable,
        });

        pct += config.step_pct;
    }

    let verdict = match max_viable {
        Some((buy_pct, buy_price)) => SweepVerdict::MaxViable { buy_pct, buy_price },
        None => SweepVerdict::NoViablePrice,
    };

    Ok(SweepReport {
        sell_price,
        points,
        verdict,
    })
}

// ---------------------------------------------------------------------------
// Break-even
// ---------------------------------------------------------------------------

/// Units required to recover a target amount, if a finite answer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakEven {
    Units(u64),
    /// Per-unit profit is zero or negative: no number of sales recovers
    /// the target.
    NoFiniteBreakEven,
}

impl fmt::Display for BreakEven {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakEven::Units(n) => write!(f, "{n} units to break even"),
            BreakEven::NoFiniteBreakEven => write!(f, "no finite break-even (unit profit ≤ 0)"),
        }
    }
}

/// Smallest unit count whose cumulative profit reaches `target`.
pub fn break_even_units(target: Decimal, profit_per_unit: Decimal) -> BreakEven {
    if profit_per_unit <= Decimal::ZERO {
        return BreakEven::NoFiniteBreakEven;
    }
    let units = (target / profit_per_unit).ceil();
    BreakEven::Units(units.to_u64().unwrap_or(u64::MAX))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
