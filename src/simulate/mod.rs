//! Profitability and cash-flow simulation — unit economics, purchase-price
//! sensitivity, break-even, and the multi-week capacity projection.

pub mod capacity;
pub mod cashflow;
pub mod profit;
pub mod sensitivity;
