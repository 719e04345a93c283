//! Price provider port.

use crate::domain::error::TraderError;
use crate::domain::quote::DailyBar;
use chrono::NaiveDate;

pub trait PriceProvider {
    /// Daily bars for `ticker` with `start <= date < end`, ascending.
    ///
    /// An empty vector means the provider has no data for the window
    /// (non-trading day, unknown or delisted ticker).
    fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TraderError>;
}
