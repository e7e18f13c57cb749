//! Weekly operating-capacity schedule.
//!
//! Models how many units the seller can physically process each week,
//! given the hours the calendar leaves free (full weeks, exam weeks,
//! vacation weeks) and the per-unit handling time. A realism discount
//! knocks theoretical capacity down to what actually gets done.

use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Calendar segment with a distinct time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeriodKind {
    /// Regular semester week.
    Normal,
    /// Finals: the project pauses to protect grades.
    Exam,
    /// Vacation: the most productive stretch.
    Vacation,
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKind::Normal => write!(f, "normal"),
            PeriodKind::Exam => write!(f, "exam"),
            PeriodKind::Vacation => write!(f, "vacation"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapacityConfig {
    pub weeks_normal: usize,
    pub weeks_exam: usize,
    pub weeks_vacation: usize,
    pub weekly_hours_normal: f64,
    pub weekly_hours_exam: f64,
    pub weekly_hours_vacation: f64,
    /// Hours to source, list, manage, and ship one unit.
    pub hours_per_unit: f64,
    /// Fraction of theoretical capacity actually achieved.
    pub efficiency: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            weeks_normal: 4,
            weeks_exam: 2,
            weeks_vacation: 8,
            weekly_hours_normal: 15.0,
            weekly_hours_exam: 5.0,
            weekly_hours_vacation: 30.0,
            hours_per_unit: 4.5,
            efficiency: 0.70,
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// One simulated week of the schedule. Cumulative figures depend on all
/// earlier weeks.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityPeriod {
    /// 1-based week number.
    pub week: usize,
    pub kind: PeriodKind,
    pub available_hours: f64,
    /// floor(hours / hours_per_unit)
    pub unit_capacity: u32,
    /// Theoretical capacity after the efficiency discount.
    pub realistic_capacity: u32,
    pub cumulative_hours: f64,
    pub cumulative_units: u32,
}

/// Build the week-by-week schedule: normal weeks, then exams, then vacation.
pub fn build_schedule(config: &CapacityConfig) -> Vec<CapacityPeriod> {
    let segments = [
        (PeriodKind::Normal, config.weeks_normal, config.weekly_hours_normal),
        (PeriodKind::Exam, config.weeks_exam, config.weekly_hours_exam),
        (PeriodKind::Vacation, config.weeks_vacation, config.weekly_hours_vacation),
    ];

    let mut schedule = Vec::new();
    let mut cumulative_hours = 0.0;
    let mut cumulative_units = 0u32;

    for (kind, weeks, hours) in segments {
        for _ in 0..weeks {
            let unit_capacity = (hours / config.hours_per_unit).floor() as u32;
            let realistic_capacity = (unit_capacity as f64 * config.efficiency).floor() as u32;
            cumulative_hours += hours;
            cumulative_units += realistic_capacity;

            schedule.push(CapacityPeriod {
                week: schedule.len() + 1,
                kind,
                available_hours: hours,
                unit_capacity,
                realistic_capacity,
                cumulative_hours,
                cumulative_units,
            });
        }
    }

    schedule
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
