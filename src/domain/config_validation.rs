//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::MacdtraderError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Keys supplied by a command-line flag. Their config values are not
/// checked; the flag value is validated where it is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub capital: bool,
    pub tickers: bool,
    pub format: bool,
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MacdtraderError> {
    validate_with_overrides(config, FlagOverrides::default())
}

pub fn validate_with_overrides(
    config: &dyn ConfigPort,
    overrides: FlagOverrides,
) -> Result<(), MacdtraderError> {
    if !overrides.capital {
        validate_initial_capital(config)?;
    }
    validate_dates(config)?;
    if !overrides.tickers {
        validate_tickers(config)?;
    }
    validate_macd(config)?;
    if !overrides.format {
        validate_report(config)?;
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), MacdtraderError> {
    if config.get_string("backtest", "initial_capital").is_none() {
        return Ok(());
    }
    let value = config.get_double("backtest", "initial_capital", f64::NAN);
    if !value.is_finite() || value <= 0.0 {
        return Err(MacdtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be a positive number".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MacdtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(MacdtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MacdtraderError> {
    match value {
        None => Err(MacdtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            MacdtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), MacdtraderError> {
    match config.get_string("backtest", "tickers") {
        Some(s) if !s.trim().is_empty() => {
            parse_tickers(&s).map_err(|e| MacdtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "tickers".to_string(),
                reason: e.to_string(),
            })?;
            Ok(())
        }
        _ => Err(MacdtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "tickers".to_string(),
        }),
    }
}

fn macd_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MacdtraderError> {
    let value = config.get_int("macd", key, default as i64);
    let raw_is_int = config
        .get_string("macd", key)
        .is_none_or(|raw| raw.trim().parse::<i64>().is_ok());
    if !raw_is_int || value < 1 {
        return Err(MacdtraderError::ConfigInvalid {
            section: "macd".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a positive integer"),
        });
    }
    Ok(value as usize)
}

fn validate_macd(config: &dyn ConfigPort) -> Result<(), MacdtraderError> {
    let fast = macd_period(config, "fast", DEFAULT_FAST)?;
    let slow = macd_period(config, "slow", DEFAULT_SLOW)?;
    macd_period(config, "signal", DEFAULT_SIGNAL)?;

    if fast >= slow {
        return Err(MacdtraderError::ConfigInvalid {
            section: "macd".to_string(),
            key: "fast".to_string(),
            reason: "fast period must be shorter than slow period".to_string(),
        });
    }
    Ok(())
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), MacdtraderError> {
    match config.get_string("report", "format").as_deref().map(str::trim) {
        None | Some("csv") | Some("json") => Ok(()),
        Some(other) => Err(MacdtraderError::ConfigInvalid {
            section: "report".to_string(),
            key: "format".to_string(),
            reason: format!("unknown report format {other:?}, expected csv or json"),
        }),
    }
}
