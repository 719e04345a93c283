//! Offline price provider reading one `<TICKER>.csv` per symbol.
//!
//! Files use the `date,open,high,low,close,volume` layout; only date, open
//! and close are read.

use crate::domain::error::TraderError;
use crate::domain::quote::DailyBar;
use crate::ports::price_port::PriceProvider;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const SERVICE: &str = "quotes";

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, TraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| TraderError::payload(SERVICE, format!("missing {} column", name)))
}

fn price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, TraderError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| TraderError::payload(SERVICE, format!("invalid {} value: {}", name, e)))
}

impl PriceProvider for CsvPriceAdapter {
    fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, TraderError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| {
                let reason = format!("{}: CSV parse error: {}", path.display(), e);
                TraderError::payload(SERVICE, reason)
            })?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?, "%Y-%m-%d")
                .map_err(|e| {
                    TraderError::payload(SERVICE, format!("invalid date format: {}", e))
                })?;

            if date < start || date >= end {
                continue;
            }

            bars.push(DailyBar {
                date,
                open: price(&record, 1, "open")?,
                close: price(&record, 4, "close")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
