//! Per-ticker ledger export as CSV.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::batch::TickerReport;
use crate::domain::error::MacdtraderError;
use crate::ports::report_port::ReportPort;

/// One row per ledger entry, with the oscillator values for that date.
/// Undefined values are written as empty fields.
pub struct CsvLedgerReport;

#[derive(Debug, Serialize)]
struct LedgerRow {
    date: String,
    close: Option<f64>,
    macd: Option<f64>,
    signal: Option<f64>,
    position: String,
    trade: String,
    shares: u64,
    cash: f64,
    equity: Option<f64>,
}

fn rows(report: &TickerReport) -> impl Iterator<Item = LedgerRow> + '_ {
    report.ledger.entries.iter().enumerate().map(|(i, entry)| {
        let point = report.oscillator.get(i).filter(|p| p.date == entry.date);
        LedgerRow {
            date: entry.date.format("%Y-%m-%d").to_string(),
            close: entry.close,
            macd: point.and_then(|p| p.momentum),
            signal: point.and_then(|p| p.signal),
            position: entry.position.to_string(),
            trade: entry.trade.to_string(),
            shares: entry.shares_held,
            cash: entry.cash,
            equity: entry.equity,
        }
    })
}

impl ReportPort for CsvLedgerReport {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, report: &TickerReport, output_path: &Path) -> Result<(), MacdtraderError> {
        let file = File::create(output_path)?;
        let mut wtr = csv::Writer::from_writer(file);
        if report.ledger.is_empty() {
            wtr.write_record([
                "date", "close", "macd", "signal", "position", "trade", "shares", "cash", "equity",
            ])?;
        }
        for row in rows(report) {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
