//! Oscillator inputs for the signal detector.
//!
//! - `OscillatorPoint`: momentum and signal values for one bar
//! - `ema`: recursive exponential moving average over optional inputs
//! - `macd`: MACD line and signal line from closing prices

pub mod ema;
pub mod macd;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Momentum and signal values for one bar. Both are `None` during the
/// warm-up window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorPoint {
    pub date: NaiveDate,
    pub momentum: Option<f64>,
    pub signal: Option<f64>,
}

impl OscillatorPoint {
    pub fn new(date: NaiveDate, momentum: Option<f64>, signal: Option<f64>) -> Self {
        OscillatorPoint {
            date,
            momentum,
            signal,
        }
    }

    /// A point with no defined values.
    pub fn undefined(date: NaiveDate) -> Self {
        Self::new(date, None, None)
    }

    /// Both values, if both are defined numbers.
    pub fn values(&self) -> Option<(f64, f64)> {
        match (self.momentum, self.signal) {
            (Some(m), Some(s)) if m.is_finite() && s.is_finite() => Some((m, s)),
            _ => None,
        }
    }
}
