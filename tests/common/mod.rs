#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use macdtrader::domain::error::MacdtraderError;
pub use macdtrader::domain::ohlcv::PriceBar;
use macdtrader::domain::signal::{SignalEvent, SignalKind};
use macdtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, MacdtraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(MacdtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, MacdtraderError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Day `i` counted from 2024-01-01.
pub fn day(i: usize) -> NaiveDate {
    date("2024-01-01") + Duration::days(i as i64)
}

pub fn make_bar(d: &str, close: f64) -> PriceBar {
    PriceBar::from_close(date(d), close)
}

/// Consecutive daily bars starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(day(i), c))
        .collect()
}

/// A slow sine wave around 100; long enough for MACD to warm up and cross
/// several times.
pub fn wave_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 100.0 + 10.0 * (i as f64 / 8.0).sin() + i as f64 * 0.05)
        .collect()
}

pub fn event(index: usize, kind: SignalKind) -> SignalEvent {
    SignalEvent {
        date: day(index),
        index,
        kind,
    }
}
