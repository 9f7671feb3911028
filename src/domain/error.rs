//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for macdtrader.
#[derive(Debug, thiserror::Error)]
pub enum MacdtraderError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("arithmetic error on {date}: {reason}")]
    Arithmetic { date: NaiveDate, reason: String },

    #[error("{ticker}: {source}")]
    Ticker {
        ticker: String,
        #[source]
        source: Box<MacdtraderError>,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid ticker list: {reason}")]
    TickerList { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MacdtraderError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        MacdtraderError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Attach the ticker a failure belongs to.
    pub fn for_ticker(self, ticker: &str) -> Self {
        match self {
            already @ MacdtraderError::Ticker { .. } => already,
            other => MacdtraderError::Ticker {
                ticker: ticker.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The error with any ticker wrapper removed.
    pub fn root(&self) -> &MacdtraderError {
        match self {
            MacdtraderError::Ticker { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<&MacdtraderError> for std::process::ExitCode {
    fn from(err: &MacdtraderError) -> Self {
        let code: u8 = match err.root() {
            MacdtraderError::Io(_) => 1,
            MacdtraderError::ConfigParse { .. }
            | MacdtraderError::ConfigMissing { .. }
            | MacdtraderError::ConfigInvalid { .. }
            | MacdtraderError::TickerList { .. } => 2,
            MacdtraderError::Data { .. } | MacdtraderError::Csv(_) => 3,
            MacdtraderError::InvalidInput { .. } => 4,
            MacdtraderError::Arithmetic { .. } => 5,
            MacdtraderError::Json(_) => 1,
            MacdtraderError::Ticker { .. } => 1,
        };
        std::process::ExitCode::from(code)
    }
}
