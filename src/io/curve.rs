//! Write standard-curve JSON files.
//!
//! Curve JSON is the portable representation of a calibration:
//! - the four fitted parameters and fit quality
//! - the blank OD the standards were corrected with
//! - a precomputed log-spaced grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::domain::{CurveFile, CurveGrid, FitResult, StandardPoint};
use crate::error::AppError;
use crate::models::sample_curve_log;

/// Grid size of the exported curve.
pub const CURVE_GRID_POINTS: usize = 101;

/// Build the curve file for a fit over the given standards.
pub fn build_curve_file(fit: &FitResult, standards: &[StandardPoint], blank_od: f64) -> CurveFile {
    let x_min = standards.iter().map(|p| p.concentration).fold(f64::INFINITY, f64::min);
    let x_max = standards.iter().map(|p| p.concentration).fold(f64::NEG_INFINITY, f64::max);
    let (concentration, od) = sample_curve_log(&fit.params, x_min, x_max, CURVE_GRID_POINTS)
        .into_iter()
        .unzip();

    CurveFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated_at: Utc::now(),
        blank_od,
        params: fit.params,
        fit_quality: fit.quality.clone(),
        grid: CurveGrid { concentration, od },
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::io(format!("Failed to write curve JSON '{}': {e}", path.display())))?;

    info!("Curve saved to {}", path.display());
    Ok(())
}
