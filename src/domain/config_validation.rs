//! Configuration validation.
//!
//! Strategy sections are parsed and checked up front so a bad value fails
//! before any lookup is attempted.

use chrono::NaiveDate;
use std::fmt::Display;
use std::str::FromStr;

use crate::domain::error::TraderError;
use crate::domain::strategy::{default_strategies, StartPoint, StrategyConfig, DEFAULT_UNIVERSE};
use crate::domain::universe::UniverseRegistry;
use crate::ports::config_port::ConfigPort;

pub const STRATEGY_SECTION_PREFIX: &str = "strategy.";

/// Parse `[section] key` as `T`. Absent or blank values are `Ok(None)`.
pub fn parse_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TraderError>
where
    T: FromStr,
    T::Err: Display,
{
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TraderError::config_invalid(section, key, e)),
        _ => Ok(None),
    }
}

pub fn parse_or<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TraderError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_value(config, section, key)?.unwrap_or(default))
}

fn require<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<T, TraderError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(config, section, key)?.ok_or_else(|| TraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })
}

/// `[strategy.<id>]` section names in ascending id order.
pub fn strategy_sections(config: &dyn ConfigPort) -> Vec<String> {
    let mut sections: Vec<String> = config
        .sections()
        .into_iter()
        .filter(|s| s.starts_with(STRATEGY_SECTION_PREFIX))
        .collect();
    sections.sort();
    sections
}

/// Strategies declared in the config, or the built-in batch when there are none.
pub fn strategies_from_config(
    config: &dyn ConfigPort,
    registry: &UniverseRegistry,
) -> Result<Vec<StrategyConfig>, TraderError> {
    let sections = strategy_sections(config);
    if sections.is_empty() {
        return default_strategies(registry);
    }
    sections
        .iter()
        .map(|section| parse_strategy(config, section, registry))
        .collect()
}

fn parse_strategy(
    config: &dyn ConfigPort,
    section: &str,
    registry: &UniverseRegistry,
) -> Result<StrategyConfig, TraderError> {
    let id = &section[STRATEGY_SECTION_PREFIX.len()..];
    if id.trim().is_empty() {
        return Err(TraderError::ConfigInvalid {
            section: section.to_string(),
            key: "name".to_string(),
            reason: "strategy section needs an id, e.g. [strategy.a]".to_string(),
        });
    }

    let name = config
        .get_string(section, "name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| id.to_string());

    let universe_name =
        parse_or(config, section, "universe", DEFAULT_UNIVERSE.to_string())?;
    let universe = registry.get(&universe_name)?;

    let threshold_pct: f64 = require(config, section, "threshold_pct")?;
    if !(threshold_pct > 0.0 && threshold_pct < 1.0) {
        return Err(TraderError::config_invalid(
            section,
            "threshold_pct",
            "threshold_pct must be a fraction between 0 and 1",
        ));
    }

    let increment: f64 = require(config, section, "increment")?;
    validate_positive(section, "increment", increment)?;

    let start_cash: f64 = require(config, section, "start_cash")?;
    validate_positive(section, "start_cash", start_cash)?;

    Ok(StrategyConfig {
        name,
        start: parse_start_point(config, section)?,
        universe,
        threshold_pct,
        increment,
        start_cash,
    })
}

fn validate_positive(section: &str, key: &str, value: f64) -> Result<(), TraderError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TraderError::config_invalid(
            section,
            key,
            format!("{key} must be positive"),
        ))
    }
}

fn parse_start_point(config: &dyn ConfigPort, section: &str) -> Result<StartPoint, TraderError> {
    let date = match config.get_string(section, "start_date") {
        Some(s) if !s.trim().is_empty() => Some(
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                TraderError::config_invalid(
                    section,
                    "start_date",
                    "invalid start_date format, expected YYYY-MM-DD",
                )
            })?,
        ),
        _ => None,
    };
    let years: Option<u32> = parse_value(config, section, "lookback_years")?;
    let days: Option<u64> = parse_value(config, section, "lookback_days")?;

    match (date, years, days) {
        (Some(date), None, None) => Ok(StartPoint::Date(date)),
        (None, Some(0), None) | (None, None, Some(0)) => Err(TraderError::config_invalid(
            section,
            if years.is_some() { "lookback_years" } else { "lookback_days" },
            "lookback must be at least 1",
        )),
        (None, Some(years), None) => Ok(StartPoint::YearsBack(years)),
        (None, None, Some(days)) => Ok(StartPoint::DaysBack(days)),
        (None, None, None) => Err(TraderError::ConfigMissing {
            section: section.to_string(),
            key: "start_date".to_string(),
        }),
        _ => Err(TraderError::config_invalid(
            section,
            "start_date",
            "set only one of start_date, lookback_years, lookback_days",
        )),
    }
}
