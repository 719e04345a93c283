//! Day-by-day earnings-reaction simulation and mark-to-market valuation.
//!
//! For every calendar day in the window, each universe ticker that reported
//! earnings is priced for that day and the threshold rule is applied:
//! buy `increment` worth of whole shares on a drop of more than the
//! threshold, liquidate the position on a rise of more than the threshold.

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;

use crate::domain::earnings_lookup::EarningsLookup;
use crate::domain::error::TraderError;
use crate::domain::portfolio::{Portfolio, Trade};
use crate::domain::price_lookup::PriceLookup;
use crate::domain::quote::Quote;
use crate::domain::strategy::StrategyConfig;

/// Extra days searched for a close when the mark date itself has no bar.
pub const MARK_LOOKBACK_DAYS: u64 = 7;

/// Half-open date range `[start, end)`. `end` is the pinned as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SimulationWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        SimulationWindow { start, end }
    }

    pub fn for_strategy(strategy: &StrategyConfig, as_of: NaiveDate) -> Self {
        Self::new(strategy.start.resolve(as_of), as_of)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day < end)
    }

    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days().max(0) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Strict on both sides: a change exactly at the threshold holds.
pub fn classify(change: f64, threshold_pct: f64) -> Signal {
    if change < -threshold_pct {
        Signal::Buy
    } else if change > threshold_pct {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Apply the threshold rule for one reporting ticker on one day.
pub fn apply_signal(
    portfolio: &mut Portfolio,
    date: NaiveDate,
    ticker: &str,
    quote: Quote,
    threshold_pct: f64,
    increment: f64,
) -> Option<Trade> {
    match classify(quote.change, threshold_pct) {
        Signal::Buy => portfolio.buy(date, ticker, quote.close, increment),
        Signal::Sell => portfolio.sell_all(date, ticker, quote.close),
        Signal::Hold => None,
    }
}

/// What to do when a lookup fails after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log, record the skip and carry on with the next ticker or day.
    #[default]
    Skip,
    /// Fail the strategy.
    Abort,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(ErrorPolicy::Skip),
            "abort" => Ok(ErrorPolicy::Abort),
            other => Err(format!("unknown error policy '{other}' (expected skip or abort)")),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Skip => write!(f, "skip"),
            ErrorPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// A lookup the simulation stepped over. `ticker` is `None` when the whole
/// day's earnings lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLookup {
    pub date: NaiveDate,
    pub ticker: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub final_value: f64,
    pub portfolio: Portfolio,
    pub days_simulated: usize,
    pub skipped: Vec<SkippedLookup>,
}

pub struct Simulator<'a> {
    prices: &'a PriceLookup<'a>,
    earnings: &'a EarningsLookup<'a>,
    policy: ErrorPolicy,
}

impl<'a> Simulator<'a> {
    pub fn new(
        prices: &'a PriceLookup<'a>,
        earnings: &'a EarningsLookup<'a>,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            prices,
            earnings,
            policy,
        }
    }

    /// Walk `window` day by day from a fresh portfolio and value the result.
    pub fn simulate(
        &self,
        strategy: &StrategyConfig,
        window: SimulationWindow,
    ) -> Result<SimulationResult, TraderError> {
        info!(
            "{}: simulating {} days ({} to {}) over {} tickers",
            strategy.name,
            window.day_count(),
            window.start,
            window.end,
            strategy.universe.count()
        );

        let mut portfolio = Portfolio::new(strategy.start_cash);
        let mut skipped = Vec::new();
        let mut days_simulated = 0;

        for date in window.days() {
            self.step(&mut portfolio, strategy, date, &mut skipped)?;
            days_simulated += 1;
        }

        let final_value = self.calculate_total(&portfolio, window.end)?;

        Ok(SimulationResult {
            final_value,
            portfolio,
            days_simulated,
            skipped,
        })
    }

    /// One transition: every reporting ticker on `date` gets the threshold rule.
    pub fn step(
        &self,
        portfolio: &mut Portfolio,
        strategy: &StrategyConfig,
        date: NaiveDate,
        skipped: &mut Vec<SkippedLookup>,
    ) -> Result<(), TraderError> {
        let reporters = match self.earnings.reporters(date, &strategy.universe) {
            Ok(reporters) => reporters,
            Err(e) => return self.skip_or_abort(date, None, e, skipped),
        };

        for ticker in &reporters {
            let quote = match self.prices.quote_for_date(ticker, date) {
                Ok(Some(quote)) => quote,
                Ok(None) => {
                    debug!("{} {}: no price data, no signal", ticker, date);
                    continue;
                }
                Err(e) => {
                    self.skip_or_abort(date, Some(ticker), e, skipped)?;
                    continue;
                }
            };

            if let Some(trade) = apply_signal(
                portfolio,
                date,
                ticker,
                quote,
                strategy.threshold_pct,
                strategy.increment,
            ) {
                debug!(
                    "{} {:?} {} x {} @ {:.2} (change {:+.2}%), cash {:.2}",
                    date,
                    trade.side,
                    trade.shares,
                    ticker,
                    trade.price,
                    quote.change * 100.0,
                    portfolio.cash
                );
            }
        }

        Ok(())
    }

    /// Cash plus every open position at the close of the day before `as_of`.
    ///
    /// Pure read: the portfolio is not changed. If the mark day has no bar,
    /// up to [`MARK_LOOKBACK_DAYS`] earlier days are tried; a position with no
    /// price at all is valued at zero.
    pub fn calculate_total(
        &self,
        portfolio: &Portfolio,
        as_of: NaiveDate,
    ) -> Result<f64, TraderError> {
        let mut total = portfolio.cash;

        for (ticker, shares) in portfolio.open_positions() {
            match self.mark_price(ticker, as_of)? {
                Some(close) => total += shares as f64 * close,
                None => warn!(
                    "{}: no close within {} days before {}, valuing {} shares at 0",
                    ticker,
                    MARK_LOOKBACK_DAYS + 1,
                    as_of,
                    shares
                ),
            }
        }

        Ok(total)
    }

    fn mark_price(&self, ticker: &str, as_of: NaiveDate) -> Result<Option<f64>, TraderError> {
        for offset in 1..=MARK_LOOKBACK_DAYS + 1 {
            let Some(date) = as_of.checked_sub_days(Days::new(offset)) else {
                break;
            };
            if let Some(quote) = self.prices.quote_for_date(ticker, date)? {
                return Ok(Some(quote.close));
            }
        }
        Ok(None)
    }

    fn skip_or_abort(
        &self,
        date: NaiveDate,
        ticker: Option<&str>,
        err: TraderError,
        skipped: &mut Vec<SkippedLookup>,
    ) -> Result<(), TraderError> {
        match self.policy {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                match ticker {
                    Some(ticker) => warn!("skipping {} on {}: {}", ticker, date, err),
                    None => warn!("skipping {}: {}", date, err),
                }
                skipped.push(SkippedLookup {
                    date,
                    ticker: ticker.map(str::to_string),
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }
}
