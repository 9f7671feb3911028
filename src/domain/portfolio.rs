//! Per-step account ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::{ClosedTrade, Position, Trade};

/// One simulated step of the account.
///
/// `equity` is `cash + shares_held * close`. It is `None` only when shares
/// are held and the step's close is missing; it is never computed from an
/// earlier close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub position: Position,
    pub trade: Trade,
    pub shares_held: u64,
    pub cash: f64,
    pub equity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub initial_capital: f64,
    pub entries: Vec<LedgerEntry>,
    /// Dates where a Buy or Sell would have traded but the close was missing.
    pub skipped_signals: Vec<NaiveDate>,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Ledger {
            initial_capital,
            entries: Vec::new(),
            skipped_signals: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn record_skipped(&mut self, date: NaiveDate) {
        self.skipped_signals.push(date);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    /// Equity of the last step that could be priced.
    pub fn final_equity(&self) -> Option<f64> {
        self.entries.iter().rev().find_map(|e| e.equity)
    }

    pub fn is_holding(&self) -> bool {
        self.last().is_some_and(|e| e.position.is_long())
    }

    /// Priced steps only.
    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.equity.map(|equity| EquityPoint {
                    date: e.date,
                    equity,
                })
            })
            .collect()
    }

    /// Pairs every Enter with the Exit that follows it. An open position at
    /// the end produces no trade.
    pub fn closed_trades(&self) -> Vec<ClosedTrade> {
        let mut trades = Vec::new();
        let mut open: Option<(NaiveDate, f64, u64)> = None;

        for entry in &self.entries {
            match (entry.trade, entry.close) {
                (Trade::Enter, Some(price)) => {
                    open = Some((entry.date, price, entry.shares_held));
                }
                (Trade::Exit, Some(price)) => {
                    if let Some((entry_date, entry_price, shares)) = open.take() {
                        trades.push(ClosedTrade::new(
                            shares,
                            entry_date,
                            entry_price,
                            entry.date,
                            price,
                        ));
                    }
                }
                _ => {}
            }
        }

        trades
    }
}
