//! Earnings-release facts and extraction of reporting tickers from calendar pages.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::domain::record_cache::CacheKey;
use crate::domain::universe::Universe;

static SECURITY_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/companies/security/(\w{1,4}):US").expect("security link pattern is valid")
});

static SESSION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"After Market Close|Before Open").expect("session label pattern is valid")
});

/// When a company releases relative to the trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseSession {
    BeforeOpen,
    AfterClose,
}

impl ReleaseSession {
    /// Label used by the calendar provider for this session.
    pub fn label(&self) -> &'static str {
        match self {
            ReleaseSession::BeforeOpen => "Before Open",
            ReleaseSession::AfterClose => "After Market Close",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Before Open" => Some(ReleaseSession::BeforeOpen),
            "After Market Close" => Some(ReleaseSession::AfterClose),
            _ => None,
        }
    }

    /// Short form used in cache keys and log context.
    pub fn slug(&self) -> &'static str {
        match self {
            ReleaseSession::BeforeOpen => "bmo",
            ReleaseSession::AfterClose => "amc",
        }
    }
}

/// Which releases count as "reporting" for a trading date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportingWindow {
    /// Everything the calendar lists for the date itself.
    #[default]
    CalendarDay,
    /// After-close releases of the previous day plus before-open releases of the date.
    TradingSession,
}

impl FromStr for ReportingWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calendar-day" | "calendar_day" | "day" => Ok(ReportingWindow::CalendarDay),
            "trading-session" | "trading_session" | "session" => {
                Ok(ReportingWindow::TradingSession)
            }
            other => Err(format!(
                "unknown reporting window '{other}' (expected calendar-day or trading-session)"
            )),
        }
    }
}

impl fmt::Display for ReportingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportingWindow::CalendarDay => write!(f, "calendar-day"),
            ReportingWindow::TradingSession => write!(f, "trading-session"),
        }
    }
}

/// One company listed on a calendar page. `session` is `None` when the row
/// carries no timing label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub ticker: String,
    pub session: Option<ReleaseSession>,
}

impl Release {
    pub fn new(ticker: &str, session: Option<ReleaseSession>) -> Self {
        Release {
            ticker: ticker.to_string(),
            session,
        }
    }
}

/// Cached release list for one calendar query. Stores every release found on
/// the page, not just one universe's members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub date: NaiveDate,
    pub session: Option<ReleaseSession>,
    pub releases: Vec<Release>,
}

impl EarningsRecord {
    /// Tickers released in `session`. A labelled release from another session
    /// is dropped even if the provider served it; unlabelled rows are kept.
    pub fn tickers_in(&self, session: Option<ReleaseSession>) -> Vec<String> {
        self.releases
            .iter()
            .filter(|r| match (session, r.session) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .map(|r| r.ticker.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EarningsKey {
    pub date: NaiveDate,
    pub session: Option<ReleaseSession>,
}

impl CacheKey for EarningsKey {
    fn cache_key(&self) -> String {
        let day = self.date.format("%Y-%m-%d");
        match self.session {
            None => format!("earnings/{day}"),
            Some(session) => format!("earnings/{day}/{}", session.slug()),
        }
    }
}

/// Every company linked from a calendar page, first-seen order, no repeats.
///
/// A link's timing label is the first session label between it and the next
/// link. A repeated ticker only fills in a label its first row lacked.
pub fn extract_releases(page: &str) -> Vec<Release> {
    let links: Vec<_> = SECURITY_LINK.captures_iter(page).collect();
    let mut releases: Vec<Release> = Vec::new();

    for (i, caps) in links.iter().enumerate() {
        let (Some(whole), Some(ticker)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let row_end = links
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(page.len(), |m| m.start());
        let session = SESSION_LABEL
            .find(&page[whole.end()..row_end])
            .and_then(|m| ReleaseSession::from_label(m.as_str()));

        match releases.iter_mut().find(|r| r.ticker == ticker.as_str()) {
            Some(existing) => {
                if existing.session.is_none() {
                    existing.session = session;
                }
            }
            None => releases.push(Release::new(ticker.as_str(), session)),
        }
    }

    releases
}

/// Keep only tickers the universe contains, preserving release order.
pub fn filter_to_universe(tickers: &[String], universe: &Universe) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .filter(|ticker| universe.contains(ticker))
        .filter(|ticker| seen.insert(ticker.to_string()))
        .cloned()
        .collect()
}
