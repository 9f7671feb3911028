//! Ticker universe parsing.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

impl From<UniverseError> for crate::domain::error::MacdtraderError {
    fn from(err: UniverseError) -> Self {
        crate::domain::error::MacdtraderError::TickerList {
            reason: err.to_string(),
        }
    }
}

/// Comma-separated tickers, trimmed and upper-cased.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes() {
        assert_eq!(
            parse_tickers("aapl, GOOGL ,msft").unwrap(),
            vec!["AAPL", "GOOGL", "MSFT"]
        );
    }

    #[test]
    fn single_ticker() {
        assert_eq!(parse_tickers("spy").unwrap(), vec!["SPY"]);
    }

    #[test]
    fn rejects_empty_token() {
        assert_eq!(parse_tickers("AAPL,,MSFT"), Err(UniverseError::EmptyToken));
        assert_eq!(parse_tickers(""), Err(UniverseError::EmptyToken));
        assert_eq!(parse_tickers("AAPL,"), Err(UniverseError::EmptyToken));
    }

    #[test]
    fn rejects_case_insensitive_duplicates() {
        assert_eq!(
            parse_tickers("AAPL,aapl"),
            Err(UniverseError::DuplicateTicker("AAPL".into()))
        );
    }
}
