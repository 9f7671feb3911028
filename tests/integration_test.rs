//! Integration tests for the detection and simulation pipeline.
//!
//! Tests cover:
//! - Worked ledger scenarios (no crossovers, entry, round trip, zero close, empty input)
//! - Full per-ticker pipeline with a mock data port
//! - Batch runs where some tickers fail or have no data
//! - CSV files on disk through to written reports

mod common;

use approx::assert_relative_eq;
use common::*;
use macdtrader::adapters::csv_adapter::CsvAdapter;
use macdtrader::adapters::csv_ledger_report::CsvLedgerReport;
use macdtrader::adapters::json_chart_report::JsonChartReport;
use macdtrader::domain::backtest::{BacktestConfig, RunStatus, simulate};
use macdtrader::domain::batch::{analyze, run_batch, run_ticker};
use macdtrader::domain::error::MacdtraderError;
use macdtrader::domain::indicator::OscillatorPoint;
use macdtrader::domain::indicator::macd::{MacdParams, calculate_macd};
use macdtrader::domain::position::{Position, Trade};
use macdtrader::domain::signal::{SignalKind, detect};
use macdtrader::ports::report_port::ReportPort;

fn config(capital: f64) -> BacktestConfig {
    BacktestConfig {
        start_date: date("2024-01-01"),
        end_date: date("2025-12-31"),
        initial_capital: capital,
        macd: MacdParams::default(),
    }
}

mod ledger_scenarios {
    use super::*;

    #[test]
    fn no_crossovers_stays_flat() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 12.5]);
        let oscillator: Vec<OscillatorPoint> = bars
            .iter()
            .map(|b| OscillatorPoint::new(b.date, Some(1.0), Some(0.5)))
            .collect();

        let report = analyze("FLAT", bars, oscillator, 100.0).unwrap();

        assert!(report.events.is_empty());
        for entry in &report.ledger.entries {
            assert_eq!(entry.position, Position::Flat);
            assert_eq!(entry.shares_held, 0);
            assert_relative_eq!(entry.equity.unwrap(), 100.0);
        }
    }

    #[test]
    fn buy_buys_whole_shares() {
        let bars = bars_from_closes(&[10.0, 10.0, 12.0, 12.0]);
        let run = simulate(&bars, &[event(2, SignalKind::Buy)], 100.0).unwrap();
        let entries = &run.ledger.entries;

        assert_eq!(entries[2].trade, Trade::Enter);
        assert_eq!(entries[2].shares_held, 8);
        assert_relative_eq!(entries[2].cash, 4.0);
        assert_relative_eq!(entries[2].equity.unwrap(), 100.0);
        assert_eq!(entries[3].position, Position::Long);
        assert_relative_eq!(entries[3].equity.unwrap(), 100.0);
    }

    #[test]
    fn buy_then_sell_realizes_the_move() {
        let bars = bars_from_closes(&[10.0, 10.0, 12.0, 15.0]);
        let events = [event(2, SignalKind::Buy), event(3, SignalKind::Sell)];
        let run = simulate(&bars, &events, 100.0).unwrap();
        let last = run.ledger.last().unwrap();

        assert_eq!(last.trade, Trade::Exit);
        assert_eq!(last.position, Position::Flat);
        assert_eq!(last.shares_held, 0);
        assert_relative_eq!(last.cash, 124.0);
        assert_relative_eq!(last.equity.unwrap(), 124.0);

        let trades = run.ledger.closed_trades();
        assert_eq!(trades.len(), 1);
        assert_relative_eq!(trades[0].pnl, 24.0);
    }

    #[test]
    fn buy_at_zero_close_halts_with_partial_ledger() {
        let bars = bars_from_closes(&[10.0, 11.0, 0.0, 12.0]);
        let halted = simulate(&bars, &[event(2, SignalKind::Buy)], 100.0).unwrap_err();

        assert!(
            matches!(halted.error, MacdtraderError::Arithmetic { date, .. } if date == day(2))
        );
        assert_eq!(halted.ledger.len(), 2);
        assert_eq!(halted.ledger.last().unwrap().date, day(1));
    }

    #[test]
    fn empty_input_is_no_data() {
        let run = simulate(&[], &[], 100.0).unwrap();
        assert_eq!(run.status, RunStatus::NoData);
        assert!(run.ledger.is_empty());
        assert!(run.require_data().is_err());
    }
}

mod full_pipeline {
    use super::*;

    #[test]
    fn run_ticker_with_mock_data_port() {
        let bars = bars_from_closes(&wave_closes(200));
        let port = MockDataPort::new().with_bars("WAVE", bars.clone());

        let report = run_ticker(&port, "WAVE", &config(10_000.0)).unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.bars.len(), 200);
        assert_eq!(report.oscillator.len(), 200);
        assert_eq!(report.ledger.len(), 200);
        assert!(!report.events.is_empty());

        // No event can fire before both lines exist.
        let warmup = MacdParams::default().warmup();
        assert!(report.events.iter().all(|e| e.index > warmup));

        let trades: Vec<Trade> = report
            .ledger
            .entries
            .iter()
            .map(|e| e.trade)
            .filter(|t| *t != Trade::None)
            .collect();
        assert!(!trades.is_empty());
        for (i, trade) in trades.iter().enumerate() {
            let expected = if i % 2 == 0 { Trade::Enter } else { Trade::Exit };
            assert_eq!(*trade, expected);
        }

        let summary = report.summary.unwrap();
        assert_eq!(summary.holding, report.ledger.is_holding());
        assert!(summary.buy_and_hold_return_pct.is_some());
    }

    #[test]
    fn pipeline_is_deterministic() {
        let bars = bars_from_closes(&wave_closes(150));
        let port = MockDataPort::new().with_bars("WAVE", bars);

        let first = run_ticker(&port, "WAVE", &config(5_000.0)).unwrap();
        let second = run_ticker(&port, "WAVE", &config(5_000.0)).unwrap();

        assert_eq!(first.events, second.events);
        assert_eq!(first.ledger, second.ledger);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn detection_matches_macd_of_the_bars() {
        let bars = bars_from_closes(&wave_closes(120));
        let oscillator = calculate_macd(&bars, MacdParams::default());
        let events: Vec<_> = detect(&oscillator).collect();

        let port = MockDataPort::new().with_bars("WAVE", bars);
        let report = run_ticker(&port, "WAVE", &config(1_000.0)).unwrap();
        assert_eq!(report.events, events);
    }

    #[test]
    fn date_range_limits_bars() {
        let bars = bars_from_closes(&wave_closes(60));
        let port = MockDataPort::new().with_bars("WAVE", bars);
        let mut cfg = config(1_000.0);
        cfg.start_date = day(10);
        cfg.end_date = day(19);

        let report = run_ticker(&port, "WAVE", &cfg).unwrap();
        assert_eq!(report.ledger.len(), 10);
        assert_eq!(report.ledger.entries[0].date, day(10));
    }
}

mod batch {
    use super::*;

    #[test]
    fn failing_ticker_does_not_stop_others() {
        let port = MockDataPort::new()
            .with_bars("AAA", bars_from_closes(&wave_closes(100)))
            .with_error("BAD", "file not found")
            .with_bars("CCC", bars_from_closes(&wave_closes(80)));
        let tickers: Vec<String> = ["AAA", "BAD", "CCC"].iter().map(|s| s.to_string()).collect();

        let batch = run_batch(&port, &tickers, &config(10_000.0));

        let order: Vec<&str> = batch.outcomes.iter().map(|o| o.ticker.as_str()).collect();
        assert_eq!(order, vec!["AAA", "BAD", "CCC"]);
        assert_eq!(batch.reports().count(), 2);
        assert_eq!(batch.failure_count(), 1);

        let (ticker, err) = batch.failures().next().unwrap();
        assert_eq!(ticker, "BAD");
        assert!(matches!(err.root(), MacdtraderError::Data { .. }));
        assert!(err.to_string().starts_with("BAD: "));
    }

    /// Flat at 100, then a steady climb from bar 40 (a Buy), then a crash to
    /// zero at bar 60 that crosses back down while long.
    fn climb_then_crash() -> Vec<f64> {
        (0..=60)
            .map(|i| match i {
                0..=39 => 100.0,
                60 => 0.0,
                _ => 100.0 + (i - 39) as f64,
            })
            .collect()
    }

    #[test]
    fn zero_close_fails_only_that_ticker() {
        let port = MockDataPort::new()
            .with_bars("ZERO", bars_from_closes(&climb_then_crash()))
            .with_bars("GOOD", bars_from_closes(&wave_closes(200)));
        let tickers = vec!["ZERO".to_string(), "GOOD".to_string()];

        let batch = run_batch(&port, &tickers, &config(10_000.0));

        assert_eq!(batch.failure_count(), 1);
        let (ticker, err) = batch.failures().next().unwrap();
        assert_eq!(ticker, "ZERO");
        assert!(
            matches!(err.root(), MacdtraderError::Arithmetic { date, .. } if *date == day(60))
        );
        assert_eq!(batch.reports().next().unwrap().ticker, "GOOD");

        let partial = batch.outcomes[0].partial_ledger.as_ref().unwrap();
        assert_eq!(partial.len(), 60);
        assert_eq!(partial.last().unwrap().date, day(59));
        assert!(partial.is_holding());
        assert!(batch.outcomes[1].partial_ledger.is_none());
    }

    #[test]
    fn data_errors_carry_no_partial_ledger() {
        let port = MockDataPort::new().with_error("BAD", "file not found");
        let batch = run_batch(&port, &["BAD".to_string()], &config(10_000.0));
        assert_eq!(batch.failure_count(), 1);
        assert!(batch.outcomes[0].partial_ledger.is_none());
    }

    #[test]
    fn climb_enters_on_first_defined_cross() {
        let mut closes = climb_then_crash();
        closes.pop();
        let port = MockDataPort::new().with_bars("UP", bars_from_closes(&closes));

        let report = run_ticker(&port, "UP", &config(10_000.0)).unwrap();

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].index, 40);
        assert_eq!(report.events[0].kind, SignalKind::Buy);
        let entry = &report.ledger.entries[40];
        assert_eq!(entry.trade, Trade::Enter);
        assert_eq!(entry.shares_held, 99);
        assert!(report.ledger.is_holding());
    }

    #[test]
    fn missing_data_is_a_no_data_report() {
        let port = MockDataPort::new().with_bars("AAA", bars_from_closes(&wave_closes(50)));
        let tickers = vec!["AAA".to_string(), "NONE".to_string()];

        let batch = run_batch(&port, &tickers, &config(10_000.0));

        assert_eq!(batch.failure_count(), 0);
        let none = batch.reports().find(|r| r.ticker == "NONE").unwrap();
        assert_eq!(none.status, RunStatus::NoData);
        assert!(none.summary.is_none());
    }
}

mod csv_end_to_end {
    use super::*;
    use std::fmt::Write as _;
    use std::fs;
    use tempfile::TempDir;

    fn write_ticker(dir: &std::path::Path, ticker: &str, closes: &[f64]) {
        let mut content = String::from("date,open,high,low,close,volume\n");
        for (i, close) in closes.iter().enumerate() {
            writeln!(
                content,
                "{},{:.4},{:.4},{:.4},{:.4},1000",
                day(i),
                close,
                close + 1.0,
                close - 1.0,
                close
            )
            .unwrap();
        }
        fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
    }

    #[test]
    fn csv_files_to_ledger_reports() {
        let data = TempDir::new().unwrap();
        write_ticker(data.path(), "AAA", &wave_closes(120));
        write_ticker(data.path(), "BBB", &wave_closes(90));

        let port = CsvAdapter::new(data.path().to_path_buf());
        let tickers = vec!["AAA".to_string(), "BBB".to_string(), "MISSING".to_string()];
        let batch = run_batch(&port, &tickers, &config(10_000.0));
        assert_eq!(batch.failure_count(), 1);

        let reports: Vec<_> = batch.reports().cloned().collect();
        let out = TempDir::new().unwrap();
        let paths = CsvLedgerReport.write_all(&reports, out.path()).unwrap();
        assert_eq!(paths.len(), 2);

        let content = fs::read_to_string(out.path().join("AAA.csv")).unwrap();
        assert_eq!(content.lines().count(), 121);

        let json_paths = JsonChartReport.write_all(&reports, out.path()).unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_paths[1]).unwrap()).unwrap();
        assert_eq!(payload["dates"].as_array().unwrap().len(), 90);
        assert!(payload["macd"][0].is_null());
    }
}
