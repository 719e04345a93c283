//! Earnings calendar page fetcher.

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::adapters::http::{build_blocking_client, read_body, transport_error};
use crate::domain::earnings::ReleaseSession;
use crate::domain::error::TraderError;
use crate::domain::settings::EarningsSettings;
use crate::ports::earnings_port::EarningsProvider;

const SERVICE: &str = "earnings";

pub struct CalendarAdapter {
    client: Client,
    base_url: String,
}

impl CalendarAdapter {
    pub fn new(settings: &EarningsSettings) -> Result<Self, TraderError> {
        Ok(Self {
            client: build_blocking_client(SERVICE, settings.timeout, &settings.user_agent)?,
            base_url: settings.base_url.clone(),
        })
    }
}

/// Query parameters for one calendar request.
pub fn calendar_query(
    date: NaiveDate,
    session: Option<ReleaseSession>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("locale", "en".to_string()),
        ("date", date.format("%Y-%m-%d").to_string()),
    ];
    if let Some(session) = session {
        query.push(("session", session.label().to_string()));
    }
    query
}

impl EarningsProvider for CalendarAdapter {
    fn calendar_page(
        &self,
        date: NaiveDate,
        session: Option<ReleaseSession>,
    ) -> Result<String, TraderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&calendar_query(date, session))
            .send()
            .map_err(|e| transport_error(SERVICE, e))?;
        read_body(SERVICE, response)
    }
}
