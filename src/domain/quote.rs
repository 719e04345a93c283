//! Daily price bars and the quote facts derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::record_cache::CacheKey;

/// One daily bar as returned by a price provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

/// Close price and same-session percent change for one ticker-day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub close: f64,
    pub change: f64,
}

/// (close - open) / open, or 0 when the open is zero.
pub fn percent_change(open: f64, close: f64) -> f64 {
    if open == 0.0 {
        return 0.0;
    }
    (close - open) / open
}

/// Cached quote fact. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub change: f64,
}

impl QuoteRecord {
    pub fn from_bar(ticker: &str, date: NaiveDate, bar: &DailyBar) -> Self {
        QuoteRecord {
            ticker: ticker.to_string(),
            date,
            close: bar.close,
            change: percent_change(bar.open, bar.close),
        }
    }

    pub fn quote(&self) -> Quote {
        Quote {
            close: self.close,
            change: self.change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    pub ticker: String,
    pub date: NaiveDate,
}

impl QuoteKey {
    pub fn new(ticker: &str, date: NaiveDate) -> Self {
        QuoteKey {
            ticker: ticker.to_uppercase(),
            date,
        }
    }
}

impl CacheKey for QuoteKey {
    fn cache_key(&self) -> String {
        format!("quotes/{}/{}", self.ticker, self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn percent_change_down_day() {
        assert_relative_eq!(percent_change(100.0, 90.0), -0.10);
    }

    #[test]
    fn percent_change_up_day() {
        assert_relative_eq!(percent_change(50.0, 54.0), 0.08, epsilon = 1e-12);
    }

    #[test]
    fn percent_change_zero_open() {
        assert_eq!(percent_change(0.0, 12.0), 0.0);
    }

    #[test]
    fn record_from_bar() {
        let bar = DailyBar {
            date: date(2024, 1, 2),
            open: 11.0,
            close: 9.9,
        };
        let record = QuoteRecord::from_bar("XYZ", date(2024, 1, 2), &bar);
        assert_eq!(record.ticker, "XYZ");
        assert_eq!(record.close, 9.9);
        assert_relative_eq!(record.change, -0.1, epsilon = 1e-12);
        assert_eq!(record.quote().close, 9.9);
    }

    #[test]
    fn zero_open_keeps_close_price() {
        let bar = DailyBar {
            date: date(2024, 1, 2),
            open: 0.0,
            close: 3.5,
        };
        let quote = QuoteRecord::from_bar("XYZ", date(2024, 1, 2), &bar).quote();
        assert_eq!(quote.close, 3.5);
        assert_eq!(quote.change, 0.0);
    }

    #[test]
    fn key_is_uppercased_and_dated() {
        let key = QuoteKey::new("abc", date(2023, 7, 4));
        assert_eq!(key.cache_key(), "quotes/ABC/2023-07-04");
    }
}
