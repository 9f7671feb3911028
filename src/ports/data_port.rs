//! Market data access port.

use crate::domain::error::MacdtraderError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

/// Source of daily bars. Implementations return bars with strictly
/// increasing dates and gaps forward-filled; an empty vector means "no data"
/// and is not an error.
pub trait DataPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, MacdtraderError>;

    fn list_tickers(&self) -> Result<Vec<String>, MacdtraderError>;
}
