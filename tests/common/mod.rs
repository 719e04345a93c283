#![allow(dead_code)]

use chrono::NaiveDate;
use earnings_trader::domain::earnings::ReleaseSession;
use earnings_trader::domain::error::TraderError;
use earnings_trader::domain::quote::DailyBar;
use earnings_trader::domain::strategy::{StartPoint, StrategyConfig};
use earnings_trader::domain::universe::Universe;
use earnings_trader::ports::earnings_port::EarningsProvider;
use earnings_trader::ports::price_port::PriceProvider;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn universe(name: &str, tickers: &[&str]) -> Arc<Universe> {
    Arc::new(Universe::new(
        name,
        tickers.iter().map(|t| t.to_string()).collect(),
    ))
}

pub fn strategy(
    tickers: &[&str],
    threshold_pct: f64,
    increment: f64,
    start_cash: f64,
) -> StrategyConfig {
    StrategyConfig {
        name: "test strategy".to_string(),
        start: StartPoint::Date(date(2024, 1, 1)),
        universe: universe("test", tickers),
        threshold_pct,
        increment,
        start_cash,
    }
}

/// Calendar markup as the earnings page renders one listed company.
pub fn calendar_page(tickers: &[&str]) -> String {
    tickers
        .iter()
        .map(|t| {
            format!(
                "<tr><td><a href=\"https://www.bloomberg.com/companies/security/{t}:US\">{t}</a></td></tr>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Price provider backed by a fixed bar table. Counts every call.
#[derive(Default)]
pub struct MockPriceProvider {
    bars: HashMap<String, Vec<DailyBar>>,
    failing: HashSet<(String, NaiveDate)>,
    pub calls: Cell<usize>,
    pub requests: RefCell<Vec<(String, NaiveDate)>>,
}

impl MockPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bar with `close` and the open that yields exactly `change` by the
    /// same-session formula.
    pub fn with_quote(mut self, ticker: &str, date: NaiveDate, close: f64, change: f64) -> Self {
        let open = close / (1.0 + change);
        self.bars
            .entry(ticker.to_string())
            .or_default()
            .push(DailyBar { date, open, close });
        self
    }

    pub fn with_bar(mut self, ticker: &str, date: NaiveDate, open: f64, close: f64) -> Self {
        self.bars
            .entry(ticker.to_string())
            .or_default()
            .push(DailyBar { date, open, close });
        self
    }

    pub fn failing_on(mut self, ticker: &str, date: NaiveDate) -> Self {
        self.failing.insert((ticker.to_string(), date));
        self
    }
}

impl PriceProvider for MockPriceProvider {
    fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TraderError> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push((ticker.to_string(), start));
        if self.failing.contains(&(ticker.to_string(), start)) {
            return Err(TraderError::upstream("quotes", "connection reset"));
        }
        Ok(self
            .bars
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date < end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Calendar markup with a timing label on every row.
pub fn labelled_page(rows: &[(&str, ReleaseSession)]) -> String {
    rows.iter()
        .map(|(t, session)| {
            format!(
                "<tr><td><a href=\"/companies/security/{t}:US\">{t}</a></td><td>{}</td></tr>",
                session.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Earnings calendar serving canned pages per (date, session). Counts every call.
#[derive(Default)]
pub struct MockCalendar {
    pages: HashMap<(NaiveDate, Option<ReleaseSession>), String>,
    labelled: HashMap<NaiveDate, String>,
    failing: HashSet<NaiveDate>,
    pub calls: Cell<usize>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reporters(mut self, date: NaiveDate, tickers: &[&str]) -> Self {
        self.pages.insert((date, None), calendar_page(tickers));
        self
    }

    pub fn with_session(
        mut self,
        date: NaiveDate,
        session: ReleaseSession,
        tickers: &[&str],
    ) -> Self {
        self.pages.insert((date, Some(session)), calendar_page(tickers));
        self
    }

    /// Labelled page served for `date` whatever session is requested.
    pub fn with_labelled_day(
        mut self,
        date: NaiveDate,
        rows: &[(&str, ReleaseSession)],
    ) -> Self {
        self.labelled.insert(date, labelled_page(rows));
        self
    }

    pub fn failing_on(mut self, date: NaiveDate) -> Self {
        self.failing.insert(date);
        self
    }
}

impl EarningsProvider for MockCalendar {
    fn calendar_page(
        &self,
        date: NaiveDate,
        session: Option<ReleaseSession>,
    ) -> Result<String, TraderError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.contains(&date) {
            return Err(TraderError::upstream("earnings", "HTTP 503 Service Unavailable"));
        }
        if let Some(page) = self.labelled.get(&date) {
            return Ok(page.clone());
        }
        Ok(self.pages.get(&(date, session)).cloned().unwrap_or_default())
    }
}
