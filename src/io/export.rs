//! Export processed plates to CSV.
//!
//! The output replays every input column and appends the derived columns, so
//! it can be reopened in a spreadsheet next to the raw plate. Undefined
//! concentrations are written as an empty field.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::domain::{
    COL_AVERAGE_OD, COL_CONCENTRATION, COL_CORRECTED_OD, ConcentrationRow, CorrectedRow,
};
use crate::error::AppError;

/// Write averaged + blank-corrected rows (no concentration column).
pub fn write_processed_csv(path: &Path, headers: &[String], rows: &[CorrectedRow]) -> Result<(), AppError> {
    let records = rows.iter().map(|r| derived_fields(r, None));
    write_csv(path, headers, &[COL_AVERAGE_OD, COL_CORRECTED_OD], records)
}

/// Write rows with their derived concentration.
pub fn write_results_csv(path: &Path, headers: &[String], rows: &[ConcentrationRow]) -> Result<(), AppError> {
    let records = rows
        .iter()
        .map(|r| derived_fields(&r.row, Some(r.concentration.value())));
    write_csv(
        path,
        headers,
        &[COL_AVERAGE_OD, COL_CORRECTED_OD, COL_CONCENTRATION],
        records,
    )
}

fn derived_fields(row: &CorrectedRow, concentration: Option<Option<f64>>) -> Vec<String> {
    let mut fields = row.measurement.fields.clone();
    fields.push(fmt_float(row.average_od));
    fields.push(fmt_float(row.corrected_od));
    if let Some(value) = concentration {
        fields.push(value.map(fmt_float).unwrap_or_default());
    }
    fields
}

fn write_csv(
    path: &Path,
    headers: &[String],
    derived: &[&str],
    records: impl Iterator<Item = Vec<String>>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create result CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let header_row = headers.iter().map(String::as_str).chain(derived.iter().copied());
    writer
        .write_record(header_row)
        .map_err(|e| AppError::io(format!("Failed to write result CSV header: {e}")))?;

    let mut n = 0usize;
    for record in records {
        writer
            .write_record(&record)
            .map_err(|e| AppError::io(format!("Failed to write result CSV row: {e}")))?;
        n += 1;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush result CSV '{}': {e}", path.display())))?;

    info!("Results saved to {} ({n} rows)", path.display());
    Ok(())
}

/// Shortest round-trip representation, always with a decimal point (`0.0`, `99.0`).
fn fmt_float(v: f64) -> String {
    format!("{v:?}")
}
