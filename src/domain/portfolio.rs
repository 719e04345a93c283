//! Portfolio state: cash plus whole-share holdings per ticker.

use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub ticker: String,
    pub side: TradeSide,
    pub shares: u64,
    pub price: f64,
}

impl Trade {
    pub fn value(&self) -> f64 {
        self.shares as f64 * self.price
    }
}

/// Mutable simulation state, owned by a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    holdings: BTreeMap<String, u64>,
    trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            cash: initial_cash,
            initial_cash,
            holdings: BTreeMap::new(),
            trades: Vec::new(),
        }
    }

    pub fn holding(&self, ticker: &str) -> u64 {
        self.holdings.get(ticker).copied().unwrap_or(0)
    }

    /// Tickers with a positive share count, in ticker order.
    pub fn open_positions(&self) -> impl Iterator<Item = (&str, u64)> {
        self.holdings
            .iter()
            .filter(|(_, shares)| **shares > 0)
            .map(|(ticker, shares)| (ticker.as_str(), *shares))
    }

    pub fn position_count(&self) -> usize {
        self.open_positions().count()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Spend up to `increment` on whole shares of `ticker` at `price`.
    ///
    /// Only fires while `cash > increment`. Leftover dollars of the increment
    /// stay in cash. Returns `None` when nothing was bought.
    pub fn buy(
        &mut self,
        date: NaiveDate,
        ticker: &str,
        price: f64,
        increment: f64,
    ) -> Option<Trade> {
        if self.cash <= increment || price <= 0.0 {
            return None;
        }
        let shares = (increment / price).floor() as u64;
        if shares == 0 {
            return None;
        }

        self.cash -= shares as f64 * price;
        *self.holdings.entry(ticker.to_string()).or_insert(0) += shares;
        Some(self.record(date, ticker, TradeSide::Buy, shares, price))
    }

    /// Liquidate the whole `ticker` position at `price`. No-op without a position.
    pub fn sell_all(&mut self, date: NaiveDate, ticker: &str, price: f64) -> Option<Trade> {
        let shares = self.holding(ticker);
        if shares == 0 {
            return None;
        }

        self.cash += shares as f64 * price;
        self.holdings.insert(ticker.to_string(), 0);
        Some(self.record(date, ticker, TradeSide::Sell, shares, price))
    }

    fn record(
        &mut self,
        date: NaiveDate,
        ticker: &str,
        side: TradeSide,
        shares: u64,
        price: f64,
    ) -> Trade {
        let trade = Trade {
            date,
            ticker: ticker.to_string(),
            side,
            shares,
            price,
        };
        self.trades.push(trade.clone());
        trade
    }
}
