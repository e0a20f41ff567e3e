//! Reporting: terminal summaries and the text report file.

pub mod format;

use std::path::Path;

use tracing::info;

use crate::error::AppError;

pub use format::*;

/// Write the text report to `path`.
pub fn write_text_report(path: &Path, report: &AnalysisReport<'_>) -> Result<(), AppError> {
    std::fs::write(path, format_text_report(report))
        .map_err(|e| AppError::io(format!("Failed to write report '{}': {e}", path.display())))?;
    info!("Report saved to {}", path.display());
    Ok(())
}
