//! Single-position account state and its per-step transition.
//!
//! Flat --Buy--> Long buys `floor(cash / close)` whole shares with all
//! available cash; Long --Sell--> Flat sells every share. Every other
//! (state, signal) pair leaves the account unchanged. Residual cash left by
//! the whole-share truncation stays idle.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::error::MacdtraderError;
use super::ohlcv::PriceBar;
use super::portfolio::LedgerEntry;
use super::position::{Position, Trade};
use super::signal::SignalKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimState {
    pub position: Position,
    pub shares_held: u64,
    pub cash: f64,
}

/// The state after a step and the ledger row it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: SimState,
    pub entry: LedgerEntry,
    /// A trade was due but the close was missing.
    pub skipped: bool,
}

/// The trade a signal asks for, given the current position.
pub fn action(position: Position, signal: Option<SignalKind>) -> Trade {
    match (position, signal) {
        (Position::Flat, Some(SignalKind::Buy)) => Trade::Enter,
        (Position::Long, Some(SignalKind::Sell)) => Trade::Exit,
        _ => Trade::None,
    }
}

fn require_positive_price(price: f64, date: NaiveDate) -> Result<f64, MacdtraderError> {
    if price > 0.0 {
        Ok(price)
    } else {
        Err(MacdtraderError::Arithmetic {
            date,
            reason: format!("cannot trade at close price {price}"),
        })
    }
}

/// Whole shares affordable with `cash` at `price`, never more than the cash
/// covers.
pub fn affordable_shares(cash: f64, price: f64) -> u64 {
    let mut shares = (cash / price).floor() as u64;
    if shares > 0 && shares as f64 * price > cash {
        shares -= 1;
    }
    shares
}

impl SimState {
    pub fn new(initial_capital: f64) -> Self {
        SimState {
            position: Position::Flat,
            shares_held: 0,
            cash: initial_capital,
        }
    }

    /// cash + shares * close. Without shares the close is irrelevant; with
    /// shares and no usable close there is no value.
    pub fn mark_to_market(&self, close: Option<f64>) -> Option<f64> {
        if self.shares_held == 0 {
            Some(self.cash)
        } else {
            close.map(|price| self.cash + self.shares_held as f64 * price)
        }
    }

    /// The seed row for the first bar.
    pub fn seed_entry(&self, bar: &PriceBar) -> LedgerEntry {
        LedgerEntry {
            date: bar.date,
            close: bar.close_price(),
            position: self.position,
            trade: Trade::None,
            shares_held: self.shares_held,
            cash: self.cash,
            equity: self.mark_to_market(bar.close_price()),
        }
    }

    pub fn enter_long(&self, price: f64, date: NaiveDate) -> Result<SimState, MacdtraderError> {
        let price = require_positive_price(price, date)?;
        let shares = affordable_shares(self.cash, price);
        let cash = self.cash - shares as f64 * price;
        debug!(%date, shares, price, cash, "enter long");

        Ok(SimState {
            position: Position::Long,
            shares_held: shares,
            cash,
        })
    }

    pub fn exit_long(&self, price: f64, date: NaiveDate) -> Result<SimState, MacdtraderError> {
        let price = require_positive_price(price, date)?;
        let cash = self.cash + self.shares_held as f64 * price;
        debug!(%date, shares = self.shares_held, price, cash, "exit long");

        Ok(SimState {
            position: Position::Flat,
            shares_held: 0,
            cash,
        })
    }

    /// Apply one bar and its (optional) signal.
    pub fn step(
        &self,
        bar: &PriceBar,
        signal: Option<SignalKind>,
    ) -> Result<StepOutcome, MacdtraderError> {
        let close = bar.close_price();

        let (state, trade, skipped) = match (action(self.position, signal), close) {
            (Trade::None, _) => (*self, Trade::None, false),
            (trade, None) => {
                warn!(date = %bar.date, ?trade, "close price missing, trade skipped");
                (*self, Trade::None, true)
            }
            (Trade::Enter, Some(price)) => (self.enter_long(price, bar.date)?, Trade::Enter, false),
            (Trade::Exit, Some(price)) => (self.exit_long(price, bar.date)?, Trade::Exit, false),
        };

        let entry = LedgerEntry {
            date: bar.date,
            close,
            position: state.position,
            trade,
            shares_held: state.shares_held,
            cash: state.cash,
            equity: state.mark_to_market(close),
        };

        Ok(StepOutcome {
            state,
            entry,
            skipped,
        })
    }
}
