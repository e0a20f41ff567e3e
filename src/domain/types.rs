//! Shared domain types.
//!
//! Each pipeline stage produces a new value from the previous one:
//!
//! `Measurement` → `AveragedRow` → `CorrectedRow` → `ConcentrationRow`
//!
//! with `CurveParams` passed explicitly into the inversion stage.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::math::LmOptions;

/// Default label of the background control well.
pub const DEFAULT_BLANK_NAME: &str = "BLANK";

/// Column names of the input/output tables.
pub const COL_SAMPLE: &str = "Sample";
pub const COL_OD1: &str = "OD1";
pub const COL_OD2: &str = "OD2";
pub const COL_CONCENTRATION: &str = "Concentration (ng/ml)";
pub const COL_AVERAGE_OD: &str = "AverageOD";
pub const COL_CORRECTED_OD: &str = "CorrectedOD";

/// One plate row as read from a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub label: String,
    pub od1: f64,
    pub od2: f64,
    /// Known reference concentration (ng/ml); only set for standards.
    pub concentration: Option<f64>,
    /// Original CSV fields, aligned with `PlateTable::headers`.
    pub fields: Vec<String>,
}

impl Measurement {
    pub fn new(label: impl Into<String>, od1: f64, od2: f64) -> Self {
        Self {
            label: label.into(),
            od1,
            od2,
            concentration: None,
            fields: Vec::new(),
        }
    }

    pub fn with_concentration(mut self, concentration: f64) -> Self {
        self.concentration = Some(concentration);
        self
    }

    /// Case-insensitive label match against the blank identifier.
    pub fn is_blank(&self, blank_name: &str) -> bool {
        self.label.to_uppercase() == blank_name.to_uppercase()
    }
}

/// A parsed input file: passthrough headers plus typed rows.
#[derive(Debug, Clone)]
pub struct PlateTable {
    pub source: PathBuf,
    /// Input headers in file order, excluding derived columns we recompute.
    pub headers: Vec<String>,
    pub rows: Vec<Measurement>,
}

/// A row annotated with the mean of its duplicate readings.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedRow {
    pub measurement: Measurement,
    pub average_od: f64,
}

impl AveragedRow {
    /// Coefficient of variation of the duplicates, in percent.
    ///
    /// Uses the population standard deviation of the two replicates. `NaN`
    /// when the average is zero.
    pub fn replicate_cv_percent(&self) -> f64 {
        let m = &self.measurement;
        let std = (m.od1 - m.od2).abs() / 2.0;
        if self.average_od == 0.0 {
            return f64::NAN;
        }
        (std / self.average_od).abs() * 100.0
    }
}

/// A row after background subtraction.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedRow {
    pub measurement: Measurement,
    pub average_od: f64,
    pub corrected_od: f64,
    pub is_blank: bool,
}

/// Outcome of the blank search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlankStatus {
    /// `row` is the first matching row; `matches` counts all matching rows.
    Found { row: usize, value: f64, matches: usize },
    /// No row matched; no correction was applied.
    Missing,
}

impl BlankStatus {
    /// Blank OD used for the subtraction (0 when missing).
    pub fn blank_od(&self) -> f64 {
        match self {
            BlankStatus::Found { value, .. } => *value,
            BlankStatus::Missing => 0.0,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, BlankStatus::Missing)
    }
}

/// Corrected rows plus the blank that was applied.
#[derive(Debug, Clone)]
pub struct BlankCorrected {
    pub rows: Vec<CorrectedRow>,
    pub blank: BlankStatus,
}

/// Fitted 4PL parameters.
///
/// `f(x) = d + (a - d) / (1 + (x / c)^b)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Response at zero concentration (lower asymptote for increasing curves).
    pub a: f64,
    /// Hill slope.
    pub b: f64,
    /// Inflection concentration (EC50).
    pub c: f64,
    /// Response at infinite concentration.
    pub d: f64,
}

impl CurveParams {
    pub const LEN: usize = 4;

    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn from_slice(p: &[f64]) -> Option<Self> {
        match p {
            [a, b, c, d] => Some(Self::new(*a, *b, *c, *d)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    /// Coefficient of determination; `NaN` when the observations have no variance.
    ///
    /// JSON has no NaN, so it is written as `null` and read back as `NaN`.
    #[serde(deserialize_with = "f64_or_nan")]
    pub r_squared: f64,
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    pub evaluations: usize,
    pub iterations: usize,
}

fn f64_or_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// A fitted standard curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub params: CurveParams,
    pub quality: FitQuality,
}

/// A standard-curve observation used for fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardPoint {
    pub concentration: f64,
    pub od: f64,
}

/// Concentration derived by inverting the standard curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Concentration {
    Value(f64),
    /// Corrected OD at or above the upper asymptote `D`.
    Saturated,
    /// Corrected OD at or below the lower asymptote `A`.
    BelowDetection,
    /// The inverse formula produced a non-finite value.
    NumericError,
}

impl Concentration {
    pub fn value(&self) -> Option<f64> {
        match self {
            Concentration::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value().is_some()
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Concentration::Value(_) => "ok",
            Concentration::Saturated => "saturated",
            Concentration::BelowDetection => "below detection",
            Concentration::NumericError => "numeric error",
        }
    }
}

/// A sample row with its derived concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationRow {
    pub row: CorrectedRow,
    pub concentration: Concentration,
}

/// Output file locations shared by both commands.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub result_csv: PathBuf,
    pub report: PathBuf,
    pub plot: PathBuf,
}

impl OutputPaths {
    pub const RESULT_CSV: &'static str = "elisa_result.csv";
    pub const REPORT: &'static str = "elisa_report.txt";
    pub const PLOT: &'static str = "elisa_analysis.svg";

    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self {
            result_csv: dir.join(Self::RESULT_CSV),
            report: dir.join(Self::REPORT),
            plot: dir.join(Self::PLOT),
        }
    }
}

/// Configuration of the basic `process` run (average + blank correction).
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub samples_path: PathBuf,
    pub blank_name: String,
    pub outputs: OutputPaths,
}

/// Configuration of a full `analyze` run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub samples_path: PathBuf,
    pub standards_path: PathBuf,
    pub blank_name: String,
    pub outputs: OutputPaths,
    pub export_curve: Option<PathBuf>,
    pub solver: LmOptions,
    /// Print the ASCII standard-curve preview.
    pub preview: bool,
    pub preview_width: usize,
    pub preview_height: usize,
}

/// A saved standard curve (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub blank_od: f64,
    pub params: CurveParams,
    pub fit_quality: FitQuality,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub concentration: Vec<f64>,
    pub od: Vec<f64>,
}
