//! Portfolio simulation over one price series.
//!
//! BacktestConfig defines the parameters of a run; `simulate` replays a
//! signal stream against the bars as a fold over [`SimState`] transitions.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use super::error::MacdtraderError;
use super::execution::SimState;
use super::indicator::macd::MacdParams;
use super::ohlcv::{PriceBar, ensure_increasing};
use super::portfolio::Ledger;
use super::signal::{SignalEvent, SignalKind};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub macd: MacdParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    pub ledger: Ledger,
    pub status: RunStatus,
}

impl SimulationRun {
    /// Turns a no-data run into an error, for callers that need bars.
    pub fn require_data(self) -> Result<Self, MacdtraderError> {
        match self.status {
            RunStatus::NoData => Err(MacdtraderError::invalid_input("price series is empty")),
            RunStatus::Completed => Ok(self),
        }
    }
}

/// A simulation that stopped early. `ledger` holds every step before the
/// failing one.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Halted {
    #[source]
    pub error: MacdtraderError,
    pub ledger: Ledger,
}

fn validate_capital(initial_capital: f64) -> Result<(), MacdtraderError> {
    if initial_capital.is_finite() && initial_capital > 0.0 {
        Ok(())
    } else {
        Err(MacdtraderError::invalid_input(format!(
            "initial capital must be positive, got {initial_capital}"
        )))
    }
}

/// Index the events by date, rejecting dates that are not bars and dates
/// with more than one event.
fn index_events(
    bars: &[PriceBar],
    events: &[SignalEvent],
) -> Result<HashMap<NaiveDate, SignalKind>, MacdtraderError> {
    let bar_dates: HashSet<NaiveDate> = bars.iter().map(|bar| bar.date).collect();

    let mut by_date = HashMap::with_capacity(events.len());
    for event in events {
        if !bar_dates.contains(&event.date) {
            return Err(MacdtraderError::invalid_input(format!(
                "signal on {} has no matching price bar",
                event.date
            )));
        }
        if let Some(existing) = by_date.insert(event.date, event.kind) {
            return Err(MacdtraderError::invalid_input(format!(
                "conflicting signals on {}: {:?} and {:?}",
                event.date, existing, event.kind
            )));
        }
    }
    Ok(by_date)
}

fn validate(
    bars: &[PriceBar],
    events: &[SignalEvent],
    initial_capital: f64,
) -> Result<HashMap<NaiveDate, SignalKind>, MacdtraderError> {
    validate_capital(initial_capital)?;
    ensure_increasing(bars).map_err(|(prev, next)| {
        MacdtraderError::invalid_input(format!(
            "bar dates must be strictly increasing: {next} follows {prev}"
        ))
    })?;
    index_events(bars, events)
}

/// Replay `events` against `bars` as a single-position long/cash account.
///
/// Bar 0 is the seed row (flat, all cash); an event on it is ignored. An
/// empty bar series is not an error: it yields an empty ledger with
/// [`RunStatus::NoData`].
pub fn simulate(
    bars: &[PriceBar],
    events: &[SignalEvent],
    initial_capital: f64,
) -> Result<SimulationRun, Halted> {
    let signals = validate(bars, events, initial_capital).map_err(|error| Halted {
        error,
        ledger: Ledger::new(initial_capital),
    })?;

    let Some((first, rest)) = bars.split_first() else {
        return Ok(SimulationRun {
            ledger: Ledger::new(initial_capital),
            status: RunStatus::NoData,
        });
    };

    let seed = SimState::new(initial_capital);
    let mut ledger = Ledger::new(initial_capital);
    ledger.push(seed.seed_entry(first));

    let (_, ledger) = rest
        .iter()
        .try_fold((seed, ledger), |(state, mut ledger), bar| {
            match state.step(bar, signals.get(&bar.date).copied()) {
                Ok(outcome) => {
                    if outcome.skipped {
                        ledger.record_skipped(bar.date);
                    }
                    ledger.push(outcome.entry);
                    Ok((outcome.state, ledger))
                }
                Err(error) => Err(Halted { error, ledger }),
            }
        })?;

    Ok(SimulationRun {
        ledger,
        status: RunStatus::Completed,
    })
}
