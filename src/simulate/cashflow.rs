//! Multi-week inventory cash-flow simulation.
//!
//! Replays a weekly buy→sell cycle over the capacity schedule to project
//! cumulative profit against the savings goal. Each week the seller buys
//! as many units as capacity and capital allow, then sells a fixed
//! fraction of whatever is on the shelf. The simulation runs out the full
//! horizon; there is no early exit.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::capacity::PeriodKind;
use super::profit::ScenarioKind;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Business assumptions for the weekly cycle. The sell-through rate and
/// period multipliers are assumptions, not mechanism — they are inputs
/// here so tests and what-if runs can move them.
#[derive(Debug, Clone)]
pub struct CashflowConfig {
    /// Fraction of current inventory sold each week.
    pub sell_through_rate: f64,
    pub normal_multiplier: f64,
    pub exam_multiplier: f64,
    pub vacation_multiplier: f64,
}

impl Default for CashflowConfig {
    fn default() -> Self {
        Self {
            sell_through_rate: 0.70,
            normal_multiplier: 1.0,
            exam_multiplier: 0.3,
            vacation_multiplier: 1.5,
        }
    }
}

impl CashflowConfig {
    pub fn multiplier_for(&self, kind: PeriodKind) -> f64 {
        match kind {
            PeriodKind::Normal => self.normal_multiplier,
            PeriodKind::Exam => self.exam_multiplier,
            PeriodKind::Vacation => self.vacation_multiplier,
        }
    }
}

/// Weekly base throughput per named scenario; the transition rule is
/// identical across all three.
#[derive(Debug, Clone, Copy)]
pub struct ThroughputRates {
    pub conservative: u32,
    pub realistic: u32,
    pub optimistic: u32,
}

impl Default for ThroughputRates {
    fn default() -> Self {
        Self {
            conservative: 2,
            realistic: 3,
            optimistic: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// State after one simulated week.
#[derive(Debug, Clone, Serialize)]
pub struct WeekRecord {
    /// 1-based week number.
    pub week: usize,
    pub kind: PeriodKind,
    pub units_bought: u32,
    pub units_sold: u32,
    pub inventory: u32,
    pub capital: Decimal,
    pub cumulative_profit: Decimal,
    pub cumulative_units_sold: u32,
}

/// Whether the horizon's cumulative profit reached the goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GoalVerdict {
    GoalMet { surplus: Decimal },
    Deficit { amount: Decimal },
}

impl fmt::Display for GoalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalVerdict::GoalMet { surplus } => write!(f, "goal met (+${surplus:.2})"),
            GoalVerdict::Deficit { amount } => write!(f, "deficit of ${amount:.2}"),
        }
    }
}

/// Complete simulation output for one throughput scenario.
#[derive(Debug, Clone, Serialize)]
pub struct CashflowReport {
    pub base_rate: u32,
    pub weeks: Vec<WeekRecord>,
    pub final_capital: Decimal,
    pub cumulative_profit: Decimal,
    pub total_units_sold: u32,
    pub ending_inventory: u32,
    pub verdict: GoalVerdict,
}

pub struct CashflowSimulator {
    config: CashflowConfig,
}

impl CashflowSimulator {
    pub fn new(config: CashflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CashflowConfig {
        &self.config
    }

    /// Run the weekly state machine over `periods`.
    ///
    /// Transition per week:
    /// 1. capacity = floor(base_rate × period multiplier)
    /// 2. buy min(capacity, floor(capital / buy_price)) units
    /// 3. sell floor(inventory × sell_through_rate) units, recovering the
    ///    purchase cost plus the per-unit profit
    ///
    /// The horizon is simply `periods.len()` weeks.
    pub fn run(
        &self,
        periods: &[PeriodKind],
        base_rate: u32,
        buy_price: Decimal,
        profit_per_unit: Decimal,
        starting_capital: Decimal,
        profit_target: Decimal,
    ) -> CashflowReport {
        let mut capital = starting_capital;
        let mut inventory = 0u32;
        let mut cumulative_profit = Decimal::ZERO;
        let mut cumulative_units_sold = 0u32;
        let mut weeks = Vec::with_capacity(periods.len());

        for (i, kind) in periods.iter().enumerate() {
            let multiplier = self.config.multiplier_for(*kind);
            let capacity = (base_rate as f64 * multiplier).floor() as u32;

            // Units the remaining capital can pay for. A zero buy price
            // only leaves the capacity bound.
            let affordable = if buy_price > Decimal::ZERO {
                (capital / buy_price).floor().to_u32().unwrap_or(u32::MAX)
            } else {
                capacity
            };

            let units_bought = capacity.min(affordable);
            capital -= Decimal::from(units_bought) * buy_price;
            inventory += units_bought;

            let units_sold = (inventory as f64 * self.config.sell_through_rate).floor() as u32;
            capital += Decimal::from(units_sold) * (profit_per_unit + buy_price);
            inventory -= units_sold;
            cumulative_profit += Decimal::from(units_sold) * profit_per_unit;
            cumulative_units_sold += units_sold;

            debug!(
                week = i + 1,
                kind = %kind,
                bought = units_bought,
                sold = units_sold,
                inventory,
                capital = %capital,
                profit = %cumulative_profit,
                "Week simulated"
            );

            weeks.push(WeekRecord {
                week: i + 1,
                kind: *kind,
                units_bought,
                units_sold,
                inventory,
                capital,
                cumulative_profit,
                cumulative_units_sold,
            });
        }

        let verdict = if cumulative_profit >= profit_target {
            GoalVerdict::GoalMet {
                surplus: cumulative_profit - profit_target,
            }
        } else {
            GoalVerdict::Deficit {
                amount: profit_target - cumulative_profit,
            }
        };

        CashflowReport {
            base_rate,
            weeks,
            final_capital: capital,
            cumulative_profit,
            total_units_sold: cumulative_units_sold,
            ending_inventory: inventory,
            verdict,
        }
    }

    /// Run the three named throughput scenarios over the same schedule.
    pub fn run_ladder(
        &self,
        periods: &[PeriodKind],
        rates: ThroughputRates,
        buy_price: Decimal,
        profit_per_unit: Decimal,
        starting_capital: Decimal,
        profit_target: Decimal,
    ) -> Vec<(ScenarioKind, CashflowReport)> {
        [
            (ScenarioKind::Conservative, rates.conservative),
            (ScenarioKind::Realistic, rates.realistic),
            (ScenarioKind::Optimistic, rates.optimistic),
        ]
        .into_iter()
        .map(|(kind, rate)| {
            (
                kind,
                self.run(
                    periods,
                    rate,
                    buy_price,
                    profit_per_unit,
                    starting_capital,
                    profit_target,
                ),
            )
        })
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
