//! Strategy configuration: one threshold rule applied to one universe.

use chrono::{Days, Months, NaiveDate};
use std::fmt;
use std::sync::Arc;

use crate::domain::error::TraderError;
use crate::domain::universe::{Universe, UniverseRegistry};

/// Where a simulation starts, either fixed or relative to the as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPoint {
    Date(NaiveDate),
    YearsBack(u32),
    DaysBack(u64),
}

impl StartPoint {
    /// Resolve against the pinned as-of date. Out-of-range results clamp to `NaiveDate::MIN`.
    pub fn resolve(&self, as_of: NaiveDate) -> NaiveDate {
        match *self {
            StartPoint::Date(date) => date,
            StartPoint::YearsBack(years) => as_of
                .checked_sub_months(Months::new(years.saturating_mul(12)))
                .unwrap_or(NaiveDate::MIN),
            StartPoint::DaysBack(days) => as_of
                .checked_sub_days(Days::new(days))
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

impl fmt::Display for StartPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPoint::Date(date) => write!(f, "from {}", date.format("%Y-%m-%d")),
            StartPoint::YearsBack(years) => write!(f, "{years}y back"),
            StartPoint::DaysBack(days) => write!(f, "{days}d back"),
        }
    }
}

/// Immutable strategy definition, created once at startup.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub name: String,
    pub start: StartPoint,
    pub universe: Arc<Universe>,
    /// Fraction, e.g. 0.05 for 5%.
    pub threshold_pct: f64,
    /// Cash allocated per buy signal.
    pub increment: f64,
    pub start_cash: f64,
}

pub const DEFAULT_UNIVERSE: &str = "russell2000";

/// Built-in batch: five-year Russell 2000 runs with 20k starting cash.
pub fn default_strategies(
    registry: &UniverseRegistry,
) -> Result<Vec<StrategyConfig>, TraderError> {
    let universe = registry.get(DEFAULT_UNIVERSE)?;
    let presets = [
        ("5yr, russell2k, 4% thresh, 2.5k increment, 20k start", 0.04, 2500.0),
        ("5yr, russell2k, 5% thresh, 2k increment, 20k start", 0.05, 2000.0),
        ("5yr, russell2k, 5% thresh, 2.5k increment, 20k start", 0.05, 2500.0),
        ("5yr, russell2k, 5% thresh, 3k increment, 20k start", 0.05, 3000.0),
        ("5yr, russell2k, 6% thresh, 2.5k increment, 20k start", 0.06, 2500.0),
    ];

    Ok(presets
        .iter()
        .map(|&(name, threshold_pct, increment)| StrategyConfig {
            name: name.to_string(),
            start: StartPoint::YearsBack(5),
            universe: Arc::clone(&universe),
            threshold_pct,
            increment,
            start_cash: 20_000.0,
        })
        .collect())
}
