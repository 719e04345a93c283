//! Runtime settings resolved from the INI config, with defaults for every key.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::config_validation::{parse_or, parse_value};
use crate::domain::earnings::ReportingWindow;
use crate::domain::error::TraderError;
use crate::domain::retry::RetryPolicy;
use crate::domain::simulator::ErrorPolicy;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_QUOTES_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_EARNINGS_URL: &str =
    "https://www.bloomberg.com/markets/api/calendar/earnings/US";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/66.0.3359.181 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(CacheBackend::File),
            "sqlite" => Ok(CacheBackend::Sqlite),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(format!(
                "unknown cache backend '{other}' (expected file, sqlite or memory)"
            )),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::File => write!(f, "file"),
            CacheBackend::Sqlite => write!(f, "sqlite"),
            CacheBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteSource {
    #[default]
    Yahoo,
    Csv,
}

impl FromStr for QuoteSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(QuoteSource::Yahoo),
            "csv" => Ok(QuoteSource::Csv),
            other => Err(format!("unknown quote source '{other}' (expected yahoo or csv)")),
        }
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSource::Yahoo => write!(f, "yahoo"),
            QuoteSource::Csv => write!(f, "csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub dir: PathBuf,
    pub sqlite_path: PathBuf,
    pub pool_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSettings {
    pub source: QuoteSource,
    pub base_url: String,
    pub csv_dir: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarningsSettings {
    pub base_url: String,
    pub window: ReportingWindow,
    pub user_agent: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cache: CacheSettings,
    pub quotes: QuoteSettings,
    pub earnings: EarningsSettings,
    pub retry: RetryPolicy,
    pub on_error: ErrorPolicy,
    /// Universe name to source, sorted by name. A source ending in `.csv` is a
    /// file path, anything else an inline comma-separated ticker list.
    pub universes: Vec<(String, String)>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cache: CacheSettings {
                backend: CacheBackend::File,
                dir: PathBuf::from("cache"),
                sqlite_path: PathBuf::from("cache/trader.db"),
                pool_size: 4,
            },
            quotes: QuoteSettings {
                source: QuoteSource::Yahoo,
                base_url: DEFAULT_QUOTES_URL.to_string(),
                csv_dir: PathBuf::from("quotes"),
                timeout: Duration::from_secs(30),
            },
            earnings: EarningsSettings {
                base_url: DEFAULT_EARNINGS_URL.to_string(),
                window: ReportingWindow::CalendarDay,
                user_agent: DEFAULT_USER_AGENT.to_string(),
                timeout: Duration::from_secs(30),
            },
            retry: RetryPolicy::default(),
            on_error: ErrorPolicy::Skip,
            universes: vec![
                ("russell2000".to_string(), "data/russell2000.csv".to_string()),
                ("sp500".to_string(), "data/sp500.csv".to_string()),
            ],
        }
    }
}

impl Settings {
    /// Overlay the config on the defaults, validating every value that is set.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let defaults = Settings::default();

        let pool_size = parse_or(config, "cache", "pool_size", defaults.cache.pool_size)?;
        if pool_size == 0 {
            return Err(TraderError::config_invalid(
                "cache",
                "pool_size",
                "pool_size must be at least 1",
            ));
        }
        let cache = CacheSettings {
            backend: parse_or(config, "cache", "backend", defaults.cache.backend)?,
            dir: parse_or(config, "cache", "dir", defaults.cache.dir)?,
            sqlite_path: parse_or(config, "cache", "sqlite_path", defaults.cache.sqlite_path)?,
            pool_size,
        };

        let quotes = QuoteSettings {
            source: parse_or(config, "quotes", "source", defaults.quotes.source)?,
            base_url: parse_or(config, "quotes", "base_url", defaults.quotes.base_url)?,
            csv_dir: parse_or(config, "quotes", "csv_dir", defaults.quotes.csv_dir)?,
            timeout: parse_timeout(config, "quotes", defaults.quotes.timeout)?,
        };

        let earnings = EarningsSettings {
            base_url: parse_or(config, "earnings", "base_url", defaults.earnings.base_url)?,
            window: parse_or(config, "earnings", "window", defaults.earnings.window)?,
            user_agent: parse_or(config, "earnings", "user_agent", defaults.earnings.user_agent)?,
            timeout: parse_timeout(config, "earnings", defaults.earnings.timeout)?,
        };

        let retry = parse_retry(config, &defaults.retry)?;
        let on_error = parse_or(config, "simulation", "on_error", defaults.on_error)?;

        let mut universes = defaults.universes;
        for (name, source) in config.section_entries("universes") {
            let source = source.trim().to_string();
            if source.is_empty() {
                return Err(TraderError::config_invalid(
                    "universes",
                    &name,
                    "universe source must not be empty",
                ));
            }
            let name = name.to_lowercase();
            match universes.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = source,
                None => universes.push((name, source)),
            }
        }
        universes.sort();

        Ok(Settings {
            cache,
            quotes,
            earnings,
            retry,
            on_error,
            universes,
        })
    }
}

fn parse_timeout(
    config: &dyn ConfigPort,
    section: &str,
    default: Duration,
) -> Result<Duration, TraderError> {
    match parse_value::<u64>(config, section, "timeout_secs")? {
        None => Ok(default),
        Some(0) => Err(TraderError::config_invalid(
            section,
            "timeout_secs",
            "timeout_secs must be at least 1",
        )),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}

fn parse_retry(
    config: &dyn ConfigPort,
    defaults: &RetryPolicy,
) -> Result<RetryPolicy, TraderError> {
    let max_attempts = parse_or(config, "retry", "max_attempts", defaults.max_attempts)?;
    if max_attempts == 0 {
        return Err(TraderError::config_invalid(
            "retry",
            "max_attempts",
            "max_attempts must be at least 1",
        ));
    }
    let base_delay = parse_value::<u64>(config, "retry", "base_delay_ms")?
        .map(Duration::from_millis)
        .unwrap_or(defaults.base_delay);
    let max_delay = parse_value::<u64>(config, "retry", "max_delay_ms")?
        .map(Duration::from_millis)
        .unwrap_or(defaults.max_delay);
    if max_delay < base_delay {
        return Err(TraderError::config_invalid(
            "retry",
            "max_delay_ms",
            "max_delay_ms must not be below base_delay_ms",
        ));
    }

    Ok(RetryPolicy {
        max_attempts,
        base_delay,
        max_delay,
    })
}
