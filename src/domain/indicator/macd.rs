//! MACD (Moving Average Convergence Divergence) oscillator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is defined from bar slow - 1, the signal line from
//! bar slow - 1 + signal - 1.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::indicator::OscillatorPoint;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::ohlcv::PriceBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    /// Index of the first bar with both values defined, assuming no gaps.
    pub fn warmup(&self) -> usize {
        self.fast.max(self.slow).saturating_sub(1) + self.signal.saturating_sub(1)
    }
}

impl fmt::Display for MacdParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MACD({},{},{})", self.fast, self.slow, self.signal)
    }
}

pub fn calculate_macd(bars: &[PriceBar], params: MacdParams) -> Vec<OscillatorPoint> {
    let closes: Vec<Option<f64>> = bars.iter().map(PriceBar::close_price).collect();

    let ema_fast = calculate_ema(&closes, params.fast);
    let ema_slow = calculate_ema(&closes, params.slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| Some((*fast)? - (*slow)?))
        .collect();

    let signal = calculate_ema(&line, params.signal);

    bars.iter()
        .zip(line.iter().zip(&signal))
        .map(|(bar, (m, s))| OscillatorPoint::new(bar.date, *m, *s))
        .collect()
}
