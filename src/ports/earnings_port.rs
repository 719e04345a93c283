//! Earnings calendar provider port.

use crate::domain::earnings::ReleaseSession;
use crate::domain::error::TraderError;
use chrono::NaiveDate;

pub trait EarningsProvider {
    /// Raw calendar content for `date`, optionally restricted to one release session.
    /// Ticker extraction happens in the domain.
    fn calendar_page(
        &self,
        date: NaiveDate,
        session: Option<ReleaseSession>,
    ) -> Result<String, TraderError>;
}
