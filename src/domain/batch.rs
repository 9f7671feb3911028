//! Per-ticker pipeline and parallel batch runner.
//!
//! fetch bars → MACD → crossover detection → simulation → summary. Tickers
//! share nothing, so a batch runs them on the rayon pool and a failure in one
//! never stops the others.

use rayon::prelude::*;
use tracing::{info, warn};

use super::backtest::{BacktestConfig, RunStatus, simulate};
use super::error::MacdtraderError;
use super::indicator::OscillatorPoint;
use super::indicator::macd::calculate_macd;
use super::metrics::Summary;
use super::ohlcv::PriceBar;
use super::portfolio::Ledger;
use super::signal::{SignalEvent, detect};
use crate::ports::data_port::DataPort;

/// Everything produced for one ticker.
#[derive(Debug, Clone)]
pub struct TickerReport {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    pub oscillator: Vec<OscillatorPoint>,
    pub events: Vec<SignalEvent>,
    pub ledger: Ledger,
    pub status: RunStatus,
    /// `None` for a no-data run.
    pub summary: Option<Summary>,
}

fn check_alignment(bars: &[PriceBar], oscillator: &[OscillatorPoint]) -> Result<(), MacdtraderError> {
    if bars.len() != oscillator.len() {
        return Err(MacdtraderError::invalid_input(format!(
            "{} price bars but {} oscillator points",
            bars.len(),
            oscillator.len()
        )));
    }
    if let Some((bar, point)) = bars.iter().zip(oscillator).find(|(b, p)| b.date != p.date) {
        return Err(MacdtraderError::invalid_input(format!(
            "oscillator point {} is not aligned with price bar {}",
            point.date, bar.date
        )));
    }
    Ok(())
}

/// A per-ticker error plus the steps simulated before a halt, if the
/// simulation got that far.
type Failure = (MacdtraderError, Option<Ledger>);

/// Detect, simulate and summarize one ticker from already materialized
/// series.
pub fn analyze(
    ticker: &str,
    bars: Vec<PriceBar>,
    oscillator: Vec<OscillatorPoint>,
    initial_capital: f64,
) -> Result<TickerReport, MacdtraderError> {
    analyze_keeping_ledger(ticker, bars, oscillator, initial_capital).map_err(|(e, _)| e)
}

fn analyze_keeping_ledger(
    ticker: &str,
    bars: Vec<PriceBar>,
    oscillator: Vec<OscillatorPoint>,
    initial_capital: f64,
) -> Result<TickerReport, Failure> {
    check_alignment(&bars, &oscillator).map_err(|e| (e.for_ticker(ticker), None))?;

    let events: Vec<SignalEvent> = detect(&oscillator).collect();

    let run = simulate(&bars, &events, initial_capital).map_err(|halted| {
        warn!(
            ticker,
            completed_steps = halted.ledger.len(),
            "simulation halted: {}",
            halted.error
        );
        (halted.error.for_ticker(ticker), Some(halted.ledger))
    })?;

    let summary = match run.status {
        RunStatus::Completed => Some(Summary::compute(&run.ledger, &bars)),
        RunStatus::NoData => {
            info!(ticker, "no data");
            None
        }
    };

    if let Some(s) = &summary {
        info!(
            ticker,
            bars = bars.len(),
            signals = events.len(),
            round_trips = s.round_trips,
            final_equity = s.final_equity,
            "simulation complete"
        );
    }

    Ok(TickerReport {
        ticker: ticker.to_string(),
        bars,
        oscillator,
        events,
        ledger: run.ledger,
        status: run.status,
        summary,
    })
}

pub fn run_ticker(
    data_port: &(dyn DataPort + Sync),
    ticker: &str,
    config: &BacktestConfig,
) -> Result<TickerReport, MacdtraderError> {
    run_ticker_keeping_ledger(data_port, ticker, config).map_err(|(e, _)| e)
}

fn run_ticker_keeping_ledger(
    data_port: &(dyn DataPort + Sync),
    ticker: &str,
    config: &BacktestConfig,
) -> Result<TickerReport, Failure> {
    let bars = data_port
        .fetch_bars(ticker, config.start_date, config.end_date)
        .map_err(|e| (e.for_ticker(ticker), None))?;
    let oscillator = calculate_macd(&bars, config.macd);
    analyze_keeping_ledger(ticker, bars, oscillator, config.initial_capital)
}

#[derive(Debug)]
pub struct TickerOutcome {
    pub ticker: String,
    pub result: Result<TickerReport, MacdtraderError>,
    /// Ledger up to the failing step when a simulation halted.
    pub partial_ledger: Option<Ledger>,
}

/// Outcomes in the order the tickers were given.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<TickerOutcome>,
}

impl BatchResult {
    pub fn reports(&self) -> impl Iterator<Item = &TickerReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &MacdtraderError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.ticker.as_str(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

pub fn run_batch(
    data_port: &(dyn DataPort + Sync),
    tickers: &[String],
    config: &BacktestConfig,
) -> BatchResult {
    let outcomes = tickers
        .par_iter()
        .map(|ticker| match run_ticker_keeping_ledger(data_port, ticker, config) {
            Ok(report) => TickerOutcome {
                ticker: ticker.clone(),
                result: Ok(report),
                partial_ledger: None,
            },
            Err((e, partial_ledger)) => {
                warn!(%ticker, "skipping ticker: {e}");
                TickerOutcome {
                    ticker: ticker.clone(),
                    result: Err(e),
                    partial_ledger,
                }
            }
        })
        .collect();

    BatchResult { outcomes }
}
