//! Daily price bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of market data. `close` is always present but may be
/// non-finite when the source had a gap that could not be filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

impl PriceBar {
    /// A bar with only a close price.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        PriceBar {
            date,
            open: None,
            high: None,
            low: None,
            close,
        }
    }

    /// The close, if it is a usable number.
    pub fn close_price(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }
}

/// Checks that bar dates are strictly increasing.
pub fn ensure_increasing(bars: &[PriceBar]) -> Result<(), (NaiveDate, NaiveDate)> {
    match bars.windows(2).find(|w| w[1].date <= w[0].date) {
        Some(w) => Err((w[0].date, w[1].date)),
        None => Ok(()),
    }
}
