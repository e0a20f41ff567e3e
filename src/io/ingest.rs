//! CSV ingest for sample and standard-curve plates.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Fail fast**: an unparsable OD or concentration aborts the load with the
//!   file, line and column in the message
//! - **Passthrough**: every other column is kept verbatim for the export
//! - **Separation of concerns**: no averaging or fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::domain::{
    COL_AVERAGE_OD, COL_CONCENTRATION, COL_CORRECTED_OD, COL_OD1, COL_OD2, COL_SAMPLE, Measurement,
    PlateTable,
};
use crate::error::{AppError, EXIT_EMPTY};

/// Label columns accepted for the standards file, in order of preference.
const STANDARD_LABEL_COLUMNS: [&str; 3] = [COL_SAMPLE, "Standard", "Label"];

/// Which plate a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateKind {
    /// Sample plate for `process`.
    Samples,
    /// Sample plate for `analyze`, which writes its own concentration column.
    AnalysisSamples,
    Standards,
}

impl PlateKind {
    fn display_name(self) -> &'static str {
        match self {
            PlateKind::Samples | PlateKind::AnalysisSamples => "ELISA data",
            PlateKind::Standards => "standard data",
        }
    }

    /// Input columns that the pipeline recomputes and therefore drops.
    fn derived_columns(self) -> &'static [&'static str] {
        match self {
            PlateKind::AnalysisSamples => &[COL_AVERAGE_OD, COL_CORRECTED_OD, COL_CONCENTRATION],
            PlateKind::Samples | PlateKind::Standards => &[COL_AVERAGE_OD, COL_CORRECTED_OD],
        }
    }
}

/// Load the sample plate (`Sample`, `OD1`, `OD2`).
pub fn load_samples(path: &Path) -> Result<PlateTable, AppError> {
    load_plate(path, PlateKind::Samples)
}

/// Load the sample plate for a full analysis; any input concentration column is dropped.
pub fn load_analysis_samples(path: &Path) -> Result<PlateTable, AppError> {
    load_plate(path, PlateKind::AnalysisSamples)
}

/// Load the standard-curve plate (`OD1`, `OD2`, `Concentration (ng/ml)` and a label column).
pub fn load_standards(path: &Path) -> Result<PlateTable, AppError> {
    load_plate(path, PlateKind::Standards)
}

pub fn load_plate(path: &Path, kind: PlateKind) -> Result<PlateTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map, kind)
        .map_err(|msg| AppError::io(format!("{}: {msg}", path.display())))?;

    let passthrough: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !kind.derived_columns().contains(&name.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based line numbers, header on line 1.
        let line = idx + 2;
        let record = result.map_err(|e| {
            AppError::io(format!("Failed to parse '{}' at line {line}: {e}", path.display()))
        })?;

        let row = parse_row(&record, &columns, &passthrough, rows.len())
            .map_err(|msg| AppError::io(format!("{} line {line}: {msg}", path.display())))?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AppError::new(
            EXIT_EMPTY,
            format!("No data rows in '{}'.", path.display()),
        ));
    }

    let headers: Vec<String> = passthrough.iter().map(|&i| headers[i].clone()).collect();
    info!(
        "Loaded {} from {}: {} rows, columns: {}",
        kind.display_name(),
        path.display(),
        rows.len(),
        headers.join(", ")
    );

    Ok(PlateTable {
        source: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Column indices needed to build a `Measurement`.
#[derive(Debug, Clone, Copy)]
struct Columns {
    label: Option<usize>,
    od1: usize,
    od2: usize,
    concentration: Option<usize>,
}

fn build_header_map(headers: &[String]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(name.clone()).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn resolve_columns(header_map: &HashMap<String, usize>, kind: PlateKind) -> Result<Columns, String> {
    let required = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| format!("Missing required column: `{name}`"))
    };

    let od1 = required(COL_OD1)?;
    let od2 = required(COL_OD2)?;

    match kind {
        PlateKind::Samples | PlateKind::AnalysisSamples => Ok(Columns {
            label: Some(required(COL_SAMPLE)?),
            od1,
            od2,
            concentration: None,
        }),
        PlateKind::Standards => Ok(Columns {
            label: STANDARD_LABEL_COLUMNS
                .iter()
                .find_map(|name| header_map.get(*name).copied()),
            od1,
            od2,
            concentration: Some(required(COL_CONCENTRATION)?),
        }),
    }
}

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    passthrough: &[usize],
    position: usize,
) -> Result<Measurement, String> {
    let label = match columns.label {
        Some(idx) => record.get(idx).unwrap_or("").to_string(),
        None => format!("Std{}", position + 1),
    };

    let od1 = parse_f64(record, columns.od1, COL_OD1)?;
    let od2 = parse_f64(record, columns.od2, COL_OD2)?;
    let concentration = columns
        .concentration
        .map(|idx| parse_f64(record, idx, COL_CONCENTRATION))
        .transpose()?;

    let fields = passthrough
        .iter()
        .map(|&i| record.get(i).unwrap_or("").to_string())
        .collect();

    Ok(Measurement {
        label,
        od1,
        od2,
        concentration,
        fields,
    })
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing value for `{name}`"))?;
    raw.parse::<f64>()
        .map_err(|_| format!("Invalid numeric value for `{name}`: '{raw}'"))
}
