//! Shared processing pipeline used by both commands.
//!
//! Each run is an explicit chain of immutable stages:
//!
//! load -> average -> blank-correct -> fit (standards) -> invert (samples)
//!
//! Everything is computed before any artifact is written, so a failing input
//! or fit leaves the output directory untouched.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::assay::{ImpreciseReplicate, average_replicates, correct_blank, find_imprecise_replicates, subtract_blank_value};
use crate::domain::{
    AnalysisConfig, BlankCorrected, BlankStatus, ConcentrationRow, FitResult, OutputPaths, PlateTable,
    ProcessConfig, StandardPoint,
};
use crate::error::AppError;
use crate::fit::{fit_four_pl, standard_points};
use crate::invert::calculate_concentrations;
use crate::io::{build_curve_file, load_analysis_samples, load_samples, load_standards, write_curve_json, write_processed_csv, write_results_csv};
use crate::plot::{AnalysisChart, write_analysis_svg};
use crate::report::{AnalysisReport, write_text_report};

/// Outputs of `elisa process`.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub samples: PlateTable,
    pub corrected: BlankCorrected,
}

/// Outputs of `elisa analyze`.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub samples: PlateTable,
    pub blank: BlankStatus,
    /// Blank-corrected standards as fitted.
    pub points: Vec<StandardPoint>,
    pub fit: FitResult,
    pub results: Vec<ConcentrationRow>,
    pub imprecise: Vec<ImpreciseReplicate>,
}

/// Average and blank-correct the sample plate.
pub fn run_process(config: &ProcessConfig) -> Result<ProcessOutput, AppError> {
    let samples = load_samples(&config.samples_path)?;
    let averaged = average_replicates(&samples.rows);
    let corrected = correct_blank(&averaged, &config.blank_name);
    Ok(ProcessOutput { samples, corrected })
}

/// Run the full analysis without writing anything.
///
/// The standards are corrected with the blank measured on the sample plate.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutput, AppError> {
    let samples = load_analysis_samples(&config.samples_path)?;
    let standards = load_standards(&config.standards_path)?;

    let averaged = average_replicates(&samples.rows);
    let imprecise = find_imprecise_replicates(&averaged);
    let corrected = correct_blank(&averaged, &config.blank_name);

    let standard_rows = subtract_blank_value(&average_replicates(&standards.rows), corrected.blank.blank_od());
    let points = standard_points(&standard_rows);

    let fit = fit_four_pl(&points, &config.solver)?;
    let results = calculate_concentrations(&corrected.rows, &fit.params);

    let defined = results.iter().filter(|r| !r.row.is_blank && r.concentration.is_defined()).count();
    let samples_total = results.iter().filter(|r| !r.row.is_blank).count();
    info!("Concentrations computed for {defined}/{samples_total} samples");

    Ok(AnalysisOutput {
        samples,
        blank: corrected.blank,
        points,
        fit,
        results,
        imprecise,
    })
}

/// Write `elisa_result.csv` for a processed plate.
pub fn write_process_outputs(outputs: &OutputPaths, run: &ProcessOutput) -> Result<(), AppError> {
    ensure_parent_dir(&outputs.result_csv)?;
    write_processed_csv(&outputs.result_csv, &run.samples.headers, &run.corrected.rows)
}

/// Write the result CSV, text report, figure and (optionally) curve JSON.
pub fn write_analysis_outputs(
    config: &AnalysisConfig,
    run: &AnalysisOutput,
    generated_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let outputs = &config.outputs;
    ensure_parent_dir(&outputs.result_csv)?;

    write_results_csv(&outputs.result_csv, &run.samples.headers, &run.results)?;

    let chart = AnalysisChart::new(&run.points, &run.fit.params, &run.results);
    write_analysis_svg(&outputs.plot, &chart)?;

    let report = AnalysisReport {
        generated_at,
        blank: run.blank,
        fit: &run.fit,
        rows: &run.results,
        imprecise: &run.imprecise,
    };
    write_text_report(&outputs.report, &report)?;

    if let Some(path) = &config.export_curve {
        let curve = build_curve_file(&run.fit, &run.points, run.blank.blank_od());
        write_curve_json(path, &curve)?;
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| AppError::io(format!("Failed to create output directory '{}': {e}", dir.display()))),
        _ => Ok(()),
    }
}
