//! Chart-ready JSON payload per ticker.
//!
//! Series are index-aligned with `dates`; undefined values are `null`.
//! `buy_signals` and `sell_signals` list the dates of each crossover.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::domain::batch::TickerReport;
use crate::domain::error::MacdtraderError;
use crate::domain::signal::SignalKind;
use crate::ports::report_port::ReportPort;

pub struct JsonChartReport;

#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub dates: Vec<String>,
    pub close: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub buy_signals: Vec<String>,
    pub sell_signals: Vec<String>,
    pub portfolio: Vec<Option<f64>>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl ChartPayload {
    pub fn from_report(report: &TickerReport) -> Self {
        let signal_dates = |kind: SignalKind| {
            report
                .events
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.date.format("%Y-%m-%d").to_string())
                .collect()
        };

        ChartPayload {
            dates: report
                .bars
                .iter()
                .map(|b| b.date.format("%Y-%m-%d").to_string())
                .collect(),
            close: report.bars.iter().map(|b| b.close_price()).collect(),
            macd: report.oscillator.iter().map(|p| finite(p.momentum)).collect(),
            signal: report.oscillator.iter().map(|p| finite(p.signal)).collect(),
            buy_signals: signal_dates(SignalKind::Buy),
            sell_signals: signal_dates(SignalKind::Sell),
            portfolio: report
                .ledger
                .entries
                .iter()
                .map(|e| finite(e.equity))
                .collect(),
        }
    }
}

impl ReportPort for JsonChartReport {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, report: &TickerReport, output_path: &Path) -> Result<(), MacdtraderError> {
        let writer = BufWriter::new(File::create(output_path)?);
        serde_json::to_writer_pretty(writer, &ChartPayload::from_report(report))?;
        Ok(())
    }
}
