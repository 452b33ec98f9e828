//! Export selection reports to JSON.

use std::fs::File;
use std::path::Path;

use crate::error::AppError;
use crate::report::SelectionReport;

pub fn write_report_json(path: &Path, report: &SelectionReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}
