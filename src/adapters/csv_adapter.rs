//! CSV file data adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a header row naming
//! `date`, `close` and optionally `open`, `high`, `low` (other columns are
//! ignored). Blank or unparsable prices are forward-filled from the previous
//! row; a close with nothing to fill from stays NaN.

use crate::domain::error::MacdtraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, MacdtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| MacdtraderError::Data {
                reason: format!("missing {name} column"),
            })
        };

        Ok(Columns {
            date: required("date")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close: required("close")?,
        })
    }
}

fn parse_price(record: &csv::StringRecord, column: Option<usize>) -> Option<f64> {
    record
        .get(column?)
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Previous row's values, used to fill gaps.
#[derive(Default)]
struct FillState {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, MacdtraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| MacdtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns = Columns::from_headers(rdr.headers()?)?;

        let mut rows: Vec<(NaiveDate, csv::StringRecord)> = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let date_str = record.get(columns.date).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                MacdtraderError::Data {
                    reason: format!("invalid date {:?} in {}: {}", date_str, path.display(), e),
                }
            })?;
            rows.push((date, record));
        }
        rows.sort_by_key(|(date, _)| *date);

        if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(MacdtraderError::Data {
                reason: format!("duplicate date {} in {}", w[0].0, path.display()),
            });
        }

        // Fill across the whole file so the first bar in range can inherit
        // from a row just before it.
        let mut fill = FillState::default();
        let mut bars = Vec::new();
        for (date, record) in &rows {
            fill.open = parse_price(record, columns.open).or(fill.open);
            fill.high = parse_price(record, columns.high).or(fill.high);
            fill.low = parse_price(record, columns.low).or(fill.low);
            fill.close = parse_price(record, Some(columns.close)).or(fill.close);

            if *date < start_date || *date > end_date {
                continue;
            }

            bars.push(PriceBar {
                date: *date,
                open: fill.open,
                high: fill.high,
                low: fill.low,
                close: fill.close.unwrap_or(f64::NAN),
            });
        }

        debug!(ticker, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, MacdtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MacdtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
