//! Yahoo Finance chart API price provider.

use chrono::{DateTime, NaiveDate, NaiveTime};
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::adapters::http::{build_blocking_client, read_body, transport_error};
use crate::domain::error::TraderError;
use crate::domain::quote::DailyBar;
use crate::domain::settings::{QuoteSettings, DEFAULT_USER_AGENT};
use crate::ports::price_port::PriceProvider;

const SERVICE: &str = "quotes";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooPriceAdapter {
    client: Client,
    base_url: String,
}

impl YahooPriceAdapter {
    pub fn new(settings: &QuoteSettings) -> Result<Self, TraderError> {
        Ok(Self {
            client: build_blocking_client(SERVICE, settings.timeout, DEFAULT_USER_AGENT)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PriceProvider for YahooPriceAdapter {
    fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TraderError> {
        let url = format!("{}/{}", self.base_url, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", unix_midnight(start).to_string()),
                ("period2", unix_midnight(end).to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .map_err(|e| transport_error(SERVICE, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("{} not found upstream, no bars", ticker);
            return Ok(Vec::new());
        }

        let body = read_body(SERVICE, response)?;
        parse_chart(&body, start, end)
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Bars in `[start, end)` from a chart response body. Entries with a null
/// open or close are dropped; a "Not Found" chart error means no bars.
pub fn parse_chart(
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyBar>, TraderError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| TraderError::payload(SERVICE, format!("invalid chart JSON: {e}")))?;

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Ok(Vec::new());
        }
        return Err(TraderError::payload(
            SERVICE,
            format!("{}: {}", err.code, err.description.unwrap_or_default()),
        ));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(series) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };
    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);

    let mut bars = Vec::new();
    for (i, ts) in result.timestamp.iter().enumerate() {
        let date = match DateTime::from_timestamp(ts + offset, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        if date < start || date >= end {
            continue;
        }
        let open = series.open.get(i).copied().flatten();
        let close = series.close.get(i).copied().flatten();
        if let (Some(open), Some(close)) = (open, close) {
            bars.push(DailyBar { date, open, close });
        }
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-03-04 and 2024-03-05, 14:30 UTC market open, New York offset.
    const TWO_DAYS: &str = r#"{"chart":{"result":[{
        "meta":{"symbol":"XYZ","gmtoffset":-18000},
        "timestamp":[1709562600,1709649000],
        "indicators":{"quote":[{"open":[20.0,18.0],"close":[18.0,null],"high":[21.0,19.0]}]}
    }],"error":null}}"#;

    #[test]
    fn parses_bars_in_window() {
        let bars = parse_chart(TWO_DAYS, date(2024, 3, 4), date(2024, 3, 5)).unwrap();
        assert_eq!(
            bars,
            vec![DailyBar {
                date: date(2024, 3, 4),
                open: 20.0,
                close: 18.0,
            }]
        );
    }

    #[test]
    fn null_close_is_dropped() {
        let bars = parse_chart(TWO_DAYS, date(2024, 3, 5), date(2024, 3, 6)).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn not_found_error_is_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse_chart(body, date(2024, 3, 4), date(2024, 3, 5)).unwrap().is_empty());
    }

    #[test]
    fn other_chart_errors_are_payload_errors() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let err = parse_chart(body, date(2024, 3, 4), date(2024, 3, 5)).unwrap_err();
        assert!(matches!(err, TraderError::UpstreamPayload { .. }));
    }

    #[test]
    fn malformed_json_is_payload_error() {
        let err = parse_chart("<html>", date(2024, 3, 4), date(2024, 3, 5)).unwrap_err();
        assert!(matches!(err, TraderError::UpstreamPayload { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn window_uses_utc_midnight() {
        assert_eq!(unix_midnight(date(2024, 3, 4)), 1_709_510_400);
    }
}
