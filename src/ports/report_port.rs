//! Report generation port trait.

use std::path::Path;

use crate::domain::batch::TickerReport;
use crate::domain::error::MacdtraderError;

/// Port for writing per-ticker backtest reports.
pub trait ReportPort {
    /// File extension of the files this port writes, without the dot.
    fn extension(&self) -> &'static str;

    fn write(&self, report: &TickerReport, output_path: &Path) -> Result<(), MacdtraderError>;

    /// Default implementation: one file per ticker, `<dir>/<TICKER>.<ext>`.
    fn write_all(
        &self,
        reports: &[TickerReport],
        output_dir: &Path,
    ) -> Result<Vec<std::path::PathBuf>, MacdtraderError> {
        std::fs::create_dir_all(output_dir)?;
        reports
            .iter()
            .map(|report| {
                let path = output_dir.join(format!("{}.{}", report.ticker, self.extension()));
                self.write(report, &path).map(|()| path)
            })
            .collect()
    }
}
