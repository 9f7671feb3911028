//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_report::CsvLedgerReport;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_chart_report::JsonChartReport;
use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL, RunStatus};
use crate::domain::batch::{BatchResult, TickerReport, run_batch};
use crate::domain::config_validation::{
    FlagOverrides, parse_date, validate_backtest_config, validate_with_overrides,
};
use crate::domain::error::MacdtraderError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW, MacdParams};
use crate::domain::metrics::Summary;
use crate::domain::universe::parse_tickers;
use crate::logging::setup_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_CSV_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "macdtrader", about = "MACD crossover backtester")]
pub struct Cli {
    /// Log level filter, used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    fn port(self) -> Box<dyn ReportPort> {
        match self {
            ReportFormat::Csv => Box::new(CsvLedgerReport),
            ReportFormat::Json => Box::new(JsonChartReport),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over one or more tickers
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers, overriding [backtest] tickers
        #[arg(long)]
        tickers: Option<String>,
        /// Starting cash, overriding [backtest] initial_capital
        #[arg(long)]
        capital: Option<f64>,
        /// Directory for per-ticker reports, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in the data directory
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    setup_logging(&cli.log_level);

    match cli.command {
        Command::Backtest {
            config,
            tickers,
            capital,
            output,
            format,
        } => run_backtest(&config, tickers.as_deref(), capital, output, format),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { config } => run_list_tickers(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(
    config_path: &PathBuf,
    tickers_override: Option<&str>,
    capital_override: Option<f64>,
    output_override: Option<PathBuf>,
    format_override: Option<ReportFormat>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let overrides = FlagOverrides {
        capital: capital_override.is_some(),
        tickers: tickers_override.is_some(),
        format: format_override.is_some(),
    };
    let prepared = validate_with_overrides(&adapter, overrides)
        .and_then(|()| build_backtest_config(&adapter))
        .and_then(|config| apply_capital_override(config, capital_override))
        .and_then(|config| {
            let tickers = resolve_tickers(tickers_override, &adapter)?;
            let format = resolve_format(format_override, &adapter)?;
            Ok((config, tickers, format))
        });
    let (bt_config, tickers, format) = match prepared {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvAdapter::new(csv_dir(&adapter));
    let output_dir = output_override.or_else(|| {
        adapter
            .get_string("report", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    });

    eprintln!(
        "Running {} on {} tickers, {} to {}",
        bt_config.macd,
        tickers.len(),
        bt_config.start_date,
        bt_config.end_date,
    );

    run_backtest_pipeline(&data_port, &bt_config, &tickers, output_dir, format)
}

pub fn run_backtest_pipeline(
    data_port: &(dyn DataPort + Sync),
    bt_config: &BacktestConfig,
    tickers: &[String],
    output_dir: Option<PathBuf>,
    format: ReportFormat,
) -> ExitCode {
    let batch = run_batch(data_port, tickers, bt_config);

    for outcome in &batch.outcomes {
        match &outcome.result {
            Ok(report) => println!("{}", format_report(report)),
            Err(e) => {
                eprintln!("warning: skipping {} ({})", outcome.ticker, e);
                if let Some(last) = outcome.partial_ledger.as_ref().and_then(|l| l.last()) {
                    eprintln!("  simulated through {} before halting", last.date);
                }
            }
        }
    }

    let failed = batch.failure_count();
    if failed > 0 {
        eprintln!("{failed} of {} tickers failed", batch.outcomes.len());
    }

    let reports: Vec<TickerReport> = batch.reports().cloned().collect();
    if reports.is_empty() {
        return batch_failure_code(&batch);
    }

    if let Some(dir) = output_dir {
        match format.port().write_all(&reports, &dir) {
            Ok(paths) => {
                for path in paths {
                    eprintln!("Report written to: {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("error: failed to write reports: {e}");
                return (&e).into();
            }
        }
    }

    ExitCode::SUCCESS
}

fn batch_failure_code(batch: &BatchResult) -> ExitCode {
    match batch.failures().next() {
        Some((_, err)) => {
            eprintln!("error: no ticker completed");
            err.into()
        }
        None => {
            eprintln!("error: no tickers to backtest");
            ExitCode::from(2)
        }
    }
}

pub fn format_report(report: &TickerReport) -> String {
    match (&report.status, &report.summary) {
        (RunStatus::Completed, Some(summary)) => format_summary(&report.ticker, summary),
        _ => format!(
            "=== {} ===\nNo data available for {}. Skipping analysis.\n",
            report.ticker, report.ticker
        ),
    }
}

/// Console block for one ticker.
pub fn format_summary(ticker: &str, summary: &Summary) -> String {
    let buy_and_hold = summary
        .buy_and_hold_return_pct
        .map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}%"));
    let position = if summary.holding {
        "Holding"
    } else {
        "Not Holding"
    };

    let mut out = format!("=== {ticker} ===\n");
    out.push_str(&format!(
        "Initial Investment:    ${:.2}\n",
        summary.initial_capital
    ));
    out.push_str(&format!(
        "Final Portfolio:       ${:.2}\n",
        summary.final_equity
    ));
    out.push_str(&format!(
        "Strategy Total Return: {:.2}%\n",
        summary.strategy_return_pct
    ));
    out.push_str(&format!("Buy and Hold Return:   {buy_and_hold}\n"));
    out.push_str(&format!(
        "Round Trips:           {} ({:.1}% won)\n",
        summary.round_trips,
        summary.win_rate * 100.0
    ));
    if summary.round_trips > 0 {
        out.push_str(&format!(
            "Avg Holding Period:    {:.1} days\n",
            summary.avg_holding_days
        ));
    }
    out.push_str(&format!(
        "Max Drawdown:          -{:.1}%\n",
        summary.max_drawdown * 100.0
    ));
    if summary.skipped_signals > 0 {
        out.push_str(&format!(
            "Skipped Signals:       {}\n",
            summary.skipped_signals
        ));
    }
    out.push_str(&format!("Current Position:      {position}\n"));
    out
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, MacdtraderError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        macd: MacdParams {
            fast: macd_param(adapter, "fast", DEFAULT_FAST)?,
            slow: macd_param(adapter, "slow", DEFAULT_SLOW)?,
            signal: macd_param(adapter, "signal", DEFAULT_SIGNAL)?,
        },
    })
}

fn macd_param(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MacdtraderError> {
    let value = adapter.get_int("macd", key, default as i64);
    usize::try_from(value).map_err(|_| MacdtraderError::ConfigInvalid {
        section: "macd".into(),
        key: key.into(),
        reason: format!("{key} must be a positive integer"),
    })
}

fn apply_capital_override(
    mut config: BacktestConfig,
    capital: Option<f64>,
) -> Result<BacktestConfig, MacdtraderError> {
    if let Some(capital) = capital {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(MacdtraderError::invalid_input(format!(
                "--capital must be a positive number, got {capital}"
            )));
        }
        config.initial_capital = capital;
    }
    Ok(config)
}

/// `--tickers` wins over `[backtest] tickers`.
pub fn resolve_tickers(
    tickers_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, MacdtraderError> {
    if let Some(list) = tickers_override {
        return Ok(parse_tickers(list)?);
    }

    match config.get_string("backtest", "tickers") {
        Some(list) if !list.trim().is_empty() => Ok(parse_tickers(&list)?),
        _ => Err(MacdtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "tickers".into(),
        }),
    }
}

pub fn resolve_format(
    format_override: Option<ReportFormat>,
    config: &dyn ConfigPort,
) -> Result<ReportFormat, MacdtraderError> {
    if let Some(format) = format_override {
        return Ok(format);
    }
    match config.get_string("report", "format") {
        None => Ok(ReportFormat::Csv),
        Some(raw) => ReportFormat::from_str(raw.trim(), true).map_err(|_| {
            MacdtraderError::ConfigInvalid {
                section: "report".into(),
                key: "format".into(),
                reason: format!("unknown report format {raw:?}, expected csv or json"),
            }
        }),
    }
}

fn csv_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("data", "csv_dir")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_DIR))
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = validate_backtest_config(&adapter)
        .and_then(|()| build_backtest_config(&adapter))
        .and_then(|config| Ok((config, resolve_tickers(None, &adapter)?)));
    let (bt_config, tickers) = match checked {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nBacktest:");
    eprintln!("  period:   {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  capital:  {:.2}", bt_config.initial_capital);
    eprintln!("  tickers:  {}", tickers.join(", "));
    eprintln!("  signal:   {}", bt_config.macd);
    eprintln!("  data dir: {}", csv_dir(&adapter).display());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_tickers(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_port = CsvAdapter::new(csv_dir(&adapter));
    match data_port.list_tickers() {
        Ok(tickers) => {
            if tickers.is_empty() {
                eprintln!("No tickers found in {}", csv_dir(&adapter).display());
            }
            for ticker in tickers {
                println!("{ticker}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
