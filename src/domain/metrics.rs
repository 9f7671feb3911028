//! Performance summary of a simulation run against buy-and-hold.

use serde::Serialize;

use super::ohlcv::PriceBar;
use super::portfolio::{EquityPoint, Ledger};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_equity: f64,
    /// (final_equity - initial_capital) / initial_capital * 100
    pub strategy_return_pct: f64,
    /// (close[last] - close[first]) / close[first] * 100, when both closes
    /// are usable and the first is non-zero.
    pub buy_and_hold_return_pct: Option<f64>,
    pub round_trips: usize,
    pub trades_won: usize,
    pub win_rate: f64,
    /// Mean calendar days from entry to exit over closed trades.
    pub avg_holding_days: f64,
    pub max_drawdown: f64,
    pub holding: bool,
    pub skipped_signals: usize,
}

impl Summary {
    pub fn compute(ledger: &Ledger, bars: &[PriceBar]) -> Self {
        let initial_capital = ledger.initial_capital;
        let final_equity = ledger.final_equity().unwrap_or(initial_capital);

        let strategy_return_pct = (final_equity - initial_capital) / initial_capital * 100.0;

        let trades = ledger.closed_trades();
        let trades_won = trades.iter().filter(|t| t.is_win()).count();
        let (win_rate, avg_holding_days) = if trades.is_empty() {
            (0.0, 0.0)
        } else {
            let n = trades.len() as f64;
            let days: i64 = trades.iter().map(|t| t.holding_days()).sum();
            (trades_won as f64 / n, days as f64 / n)
        };

        Summary {
            initial_capital,
            final_equity,
            strategy_return_pct,
            buy_and_hold_return_pct: buy_and_hold_return_pct(bars),
            round_trips: trades.len(),
            trades_won,
            win_rate,
            avg_holding_days,
            max_drawdown: compute_drawdown(&ledger.equity_curve()),
            holding: ledger.is_holding(),
            skipped_signals: ledger.skipped_signals.len(),
        }
    }
}

pub fn buy_and_hold_return_pct(bars: &[PriceBar]) -> Option<f64> {
    let first = bars.first()?.close_price()?;
    let last = bars.last()?.close_price()?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Largest peak-to-trough decline, as a fraction of the peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
