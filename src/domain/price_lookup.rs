//! Cache-or-fetch resolution of (ticker, date) to a [`Quote`].

use chrono::{Days, NaiveDate};
use log::info;

use crate::domain::error::TraderError;
use crate::domain::quote::{Quote, QuoteKey, QuoteRecord};
use crate::domain::record_cache::RecordCache;
use crate::domain::retry::RetryPolicy;
use crate::ports::cache_port::CacheStore;
use crate::ports::price_port::PriceProvider;

pub struct PriceLookup<'a> {
    provider: &'a dyn PriceProvider,
    cache: RecordCache<'a, QuoteKey, QuoteRecord>,
    retry: RetryPolicy,
}

impl<'a> PriceLookup<'a> {
    pub fn new(
        provider: &'a dyn PriceProvider,
        store: &'a dyn CacheStore,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            cache: RecordCache::new(store),
            retry,
        }
    }

    /// Close and same-session change for `ticker` on `date`.
    ///
    /// `Ok(None)` means the provider has no bar for that day; callers must not
    /// read it as a flat day.
    pub fn quote_for_date(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<Quote>, TraderError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(TraderError::InvalidInput {
                reason: "ticker symbol must not be empty".into(),
            });
        }

        let key = QuoteKey::new(ticker, date);
        let record = self.cache.get_or_fetch(&key, || {
            let end = date.checked_add_days(Days::new(1)).ok_or_else(|| {
                TraderError::InvalidInput {
                    reason: format!("date {date} out of range"),
                }
            })?;
            info!("fetching quote {} {}", key.ticker, date);
            let bars = self.retry.run(&format!("quote {} {}", key.ticker, date), || {
                self.provider.daily_bars(&key.ticker, date, end)
            })?;
            Ok(bars
                .first()
                .map(|bar| QuoteRecord::from_bar(&key.ticker, date, bar)))
        })?;

        Ok(record.map(|r| r.quote()))
    }

    /// Whether a quote for (`ticker`, `date`) is already cached.
    pub fn is_cached(&self, ticker: &str, date: NaiveDate) -> Result<bool, TraderError> {
        self.cache.contains(&QuoteKey::new(ticker.trim(), date))
    }
}
