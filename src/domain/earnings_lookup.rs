//! Cache-or-fetch resolution of (date, universe) to the tickers reporting earnings.

use chrono::{Days, NaiveDate};
use log::info;

use crate::domain::earnings::{
    extract_releases, filter_to_universe, EarningsKey, EarningsRecord, ReleaseSession,
    ReportingWindow,
};
use crate::domain::error::TraderError;
use crate::domain::record_cache::RecordCache;
use crate::domain::retry::RetryPolicy;
use crate::domain::universe::Universe;
use crate::ports::cache_port::CacheStore;
use crate::ports::earnings_port::EarningsProvider;

pub struct EarningsLookup<'a> {
    provider: &'a dyn EarningsProvider,
    cache: RecordCache<'a, EarningsKey, EarningsRecord>,
    retry: RetryPolicy,
    window: ReportingWindow,
}

impl<'a> EarningsLookup<'a> {
    pub fn new(
        provider: &'a dyn EarningsProvider,
        store: &'a dyn CacheStore,
        retry: RetryPolicy,
        window: ReportingWindow,
    ) -> Self {
        Self {
            provider,
            cache: RecordCache::new(store),
            retry,
            window,
        }
    }

    pub fn window(&self) -> ReportingWindow {
        self.window
    }

    /// Tickers in `universe` whose earnings release is relevant to trading on `date`.
    pub fn reporters(
        &self,
        date: NaiveDate,
        universe: &Universe,
    ) -> Result<Vec<String>, TraderError> {
        let released = match self.window {
            ReportingWindow::CalendarDay => self.releases(date, None)?,
            ReportingWindow::TradingSession => {
                let previous = date.checked_sub_days(Days::new(1)).ok_or_else(|| {
                    TraderError::InvalidInput {
                        reason: format!("date {date} out of range"),
                    }
                })?;
                let mut released = self.releases(previous, Some(ReleaseSession::AfterClose))?;
                released.extend(self.releases(date, Some(ReleaseSession::BeforeOpen))?);
                released
            }
        };
        Ok(filter_to_universe(&released, universe))
    }

    fn releases(
        &self,
        date: NaiveDate,
        session: Option<ReleaseSession>,
    ) -> Result<Vec<String>, TraderError> {
        let key = EarningsKey { date, session };
        let record = self.cache.get_or_fetch(&key, || {
            let context = fetch_context(date, session);
            info!("did not find {}, fetching...", context);
            let page = self
                .retry
                .run(&context, || self.provider.calendar_page(date, session))?;
            Ok(Some(EarningsRecord {
                date,
                session,
                releases: extract_releases(&page),
            }))
        })?;
        Ok(record.map(|r| r.tickers_in(session)).unwrap_or_default())
    }
}

fn fetch_context(date: NaiveDate, session: Option<ReleaseSession>) -> String {
    match session {
        Some(session) => format!("earnings {date} {}", session.slug()),
        None => format!("earnings {date}"),
    }
}
