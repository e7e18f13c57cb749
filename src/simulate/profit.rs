//! Unit-economics simulation for a single buy/sell flip.
//!
//! Computes the full cost breakdown (platform commission, payment
//! processor fee plus tax, shipping, packaging, opportunity cost of
//! labor time, transport) and derives net profit, ROI, margin, and a
//! viability verdict. Pure and deterministic: identical inputs always
//! produce identical outputs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Commission tier. The platform charges less for some categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CategoryTier {
    Standard,
    Technology,
    Collectibles,
}

impl fmt::Display for CategoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryTier::Standard => write!(f, "standard"),
            CategoryTier::Technology => write!(f, "technology"),
            CategoryTier::Collectibles => write!(f, "collectibles"),
        }
    }
}

/// Cost structure for the marketplace and the seller's own operation.
/// Loaded once per run and referenced by every profitability computation.
#[derive(Debug, Clone)]
pub struct CostStructure {
    pub commission_standard: Decimal,
    pub commission_technology: Decimal,
    pub commission_collectibles: Decimal,
    /// Payment-processor rate on the sale price.
    pub processor_rate: Decimal,
    /// Tax charged on top of the processor fee.
    pub processor_tax_rate: Decimal,
    /// Shipping cost when the seller absorbs it.
    pub shipping: Decimal,
    pub packaging: Decimal,
    pub sourcing_hours: Decimal,
    pub listing_hours: Decimal,
    pub packing_hours: Decimal,
    /// Value of one hour of the seller's time.
    pub hourly_rate: Decimal,
    /// Transport to source the product.
    pub transport: Decimal,
    /// Minimum net ROI (percent) for a flip to count as viable.
    pub min_roi_pct: Decimal,
}

impl Default for CostStructure {
    fn default() -> Self {
        Self {
            commission_standard: dec!(0.16),
            commission_technology: dec!(0.13),
            commission_collectibles: dec!(0.15),
            processor_rate: dec!(0.0399),
            processor_tax_rate: dec!(0.16),
            shipping: dec!(100),
            packaging: dec!(25),
            sourcing_hours: dec!(2.5),
            listing_hours: dec!(1.0),
            packing_hours: dec!(0.5),
            hourly_rate: dec!(150),
            transport: dec!(80),
            min_roi_pct: dec!(30),
        }
    }
}

impl CostStructure {
    pub fn commission_for(&self, tier: CategoryTier) -> Decimal {
        match tier {
            CategoryTier::Standard => self.commission_standard,
            CategoryTier::Technology => self.commission_technology,
            CategoryTier::Collectibles => self.commission_collectibles,
        }
    }

    /// Hours to source, list, and pack one unit.
    pub fn task_hours(&self) -> Decimal {
        self.sourcing_hours + self.listing_hours + self.packing_hours
    }
}

/// Per-flip options.
#[derive(Debug, Clone, Copy)]
pub struct FlipOptions {
    /// Whether the seller's time is charged at the hourly rate.
    pub include_time_cost: bool,
    /// Whether the seller absorbs the shipping cost (free-shipping listing).
    pub seller_pays_shipping: bool,
    pub tier: CategoryTier,
}

impl Default for FlipOptions {
    fn default() -> Self {
        Self {
            include_time_cost: true,
            seller_pays_shipping: true,
            tier: CategoryTier::Standard,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ProfitError {
    /// Fatal to this scenario only, never to the batch.
    #[error("invalid prices: buy {buy}, sell {sell} (buy must be ≥ 0, sell > 0)")]
    InvalidPrice { buy: Decimal, sell: Decimal },
}

/// Full cost breakdown and outcome for one buy/sell scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlipOutcome {
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub commission: Decimal,
    pub processor_fee: Decimal,
    pub shipping: Decimal,
    pub packaging: Decimal,
    pub time_cost: Decimal,
    pub transport: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    /// Percent. Defined as 0 when buy_price is 0 (found-for-free edge case).
    pub roi_gross: Decimal,
    pub roi_net: Decimal,
    /// Net profit over sale price, percent.
    pub net_margin: Decimal,
    pub viable: bool,
}

pub struct MarginSimulator {
    costs: CostStructure,
}

impl MarginSimulator {
    pub fn new(costs: CostStructure) -> Self {
        Self { costs }
    }

    pub fn costs(&self) -> &CostStructure {
        &self.costs
    }

    /// Simulate one flip.
    ///
    /// A zero buy price is accepted (ROI is defined as 0 rather than
    /// dividing by zero); a negative buy or non-positive sell price is
    /// an `InvalidPrice` error.
    pub fn simulate(
        &self,
        buy_price: Decimal,
        sell_price: Decimal,
        options: &FlipOptions,
    ) -> Result<FlipOutcome, ProfitError> {
        if buy_price < Decimal::ZERO || sell_price <= Decimal::ZERO {
            return Err(ProfitError::InvalidPrice {
                buy: buy_price,
                sell: sell_price,
            });
        }

        let commission = sell_price * self.costs.commission_for(options.tier);

        let processor_base = sell_price * self.costs.processor_rate;
        let processor_fee = processor_base + processor_base * self.costs.processor_tax_rate;

        let shipping = if options.seller_pays_shipping {
            self.costs.shipping
        } else {
            Decimal::ZERO
        };
        let packaging = self.costs.packaging;

        let time_cost = if options.include_time_cost {
            self.costs.task_hours() * self.costs.hourly_rate
        } else {
            Decimal::ZERO
        };
        let transport = self.costs.transport;

        let total_cost =
            buy_price + commission + processor_fee + shipping + packaging + time_cost + transport;

        let gross_profit = sell_price - buy_price;
        let net_profit = sell_price - total_cost;

        let hundred = dec!(100);
        let (roi_gross, roi_net) = if buy_price > Decimal::ZERO {
            (
                gross_profit / buy_price * hundred,
                net_profit / buy_price * hundred,
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        let net_margin = net_profit / sell_price * hundred;

        let viable = net_profit > Decimal::ZERO && roi_net >= self.costs.min_roi_pct;

        Ok(FlipOutcome {
            buy_price,
            sell_price,
            commission,
            processor_fee,
            shipping,
            packaging,
            time_cost,
            transport,
            total_cost,
            gross_profit,
            net_profit,
            roi_gross,
            roi_net,
            net_margin,
            viable,
        })
    }
}

// ---------------------------------------------------------------------------
// Scenario ladder
// ---------------------------------------------------------------------------

/// Named buy/sell scenario derived from a representative market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioKind {
    /// Bought dear, sold under market.
    Conservative,
    /// Average sourcing, sold at market.
    Realistic,
    /// Bought cheap, sold at a premium.
    Optimistic,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::Conservative => write!(f, "conservative"),
            ScenarioKind::Realistic => write!(f, "realistic"),
            ScenarioKind::Optimistic => write!(f, "optimistic"),
        }
    }
}

/// One rung of the scenario ladder.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

/// The three standard scenarios around a representative market price:
/// conservative (buy 75%, sell 90%), realistic (60%, 100%), optimistic
/// (45%, 110%).
pub fn scenario_ladder(market_price: Decimal) -> Vec<Scenario> {
    vec![
        Scenario {
            kind: ScenarioKind::Conservative,
            buy_price: market_price * dec!(0.75),
            sell_price: market_price * dec!(0.90),
        },
        Scenario {
            kind: ScenarioKind::Realistic,
            buy_price: market_price * dec!(0.60),
            sell_price: market_price,
        },
        Scenario {
            kind: ScenarioKind::Optimistic,
            buy_price: market_price * dec!(0.45),
            sell_price: market_price * dec!(1.10),
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
