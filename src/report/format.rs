//! Terminal and text-report formatting.
//!
//! Formatting lives in one place so the numerical code stays free of
//! presentation concerns and output changes stay localized.

use chrono::{DateTime, Utc};

use crate::assay::ImpreciseReplicate;
use crate::domain::{
    BlankStatus, COL_AVERAGE_OD, COL_CONCENTRATION, COL_CORRECTED_OD, ConcentrationRow, CorrectedRow,
    FitResult,
};

const SUMMARY_RULE_WIDTH: usize = 60;
const REPORT_RULE_WIDTH: usize = 70;

/// Everything the text report shows for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub blank: BlankStatus,
    pub fit: &'a FitResult,
    pub rows: &'a [ConcentrationRow],
    pub imprecise: &'a [ImpreciseReplicate],
}

/// Processed plate table (`process` command), bracketed by `=` rules.
pub fn format_processing_summary(headers: &[String], rows: &[CorrectedRow]) -> String {
    let mut columns: Vec<String> = headers.to_vec();
    columns.extend([COL_AVERAGE_OD.to_string(), COL_CORRECTED_OD.to_string()]);

    let cells = rows
        .iter()
        .map(|r| {
            let mut cells: Vec<String> = r.measurement.fields.iter().map(|f| fmt_cell(f)).collect();
            cells.push(format!("{:.4}", r.average_od));
            cells.push(format!("{:.4}", r.corrected_od));
            cells
        })
        .collect::<Vec<_>>();

    framed("ELISA DATA PROCESSING SUMMARY", &format_table(&columns, &cells))
}

/// Analyzed sample table (`analyze` command) including concentrations.
pub fn format_results_summary(headers: &[String], rows: &[ConcentrationRow]) -> String {
    let mut columns: Vec<String> = headers.to_vec();
    columns.extend([
        COL_AVERAGE_OD.to_string(),
        COL_CORRECTED_OD.to_string(),
        COL_CONCENTRATION.to_string(),
    ]);

    let cells = rows
        .iter()
        .map(|r| {
            let mut cells: Vec<String> = r.row.measurement.fields.iter().map(|f| fmt_cell(f)).collect();
            cells.push(format!("{:.4}", r.row.average_od));
            cells.push(format!("{:.4}", r.row.corrected_od));
            cells.push(match r.concentration.value() {
                Some(v) => format!("{v:.4}"),
                None => "NaN".to_string(),
            });
            cells
        })
        .collect::<Vec<_>>();

    framed("ELISA ANALYSIS SUMMARY", &format_table(&columns, &cells))
}

/// Fit diagnostics printed after the standard curve is fitted.
pub fn format_fit_summary(fit: &FitResult) -> String {
    let p = &fit.params;
    let q = &fit.quality;
    let mut out = String::new();
    out.push_str("Standard curve (4PL):\n");
    out.push_str(&format!(
        "  A={:.4} B={:.4} C={:.4} D={:.4}\n",
        p.a, p.b, p.c, p.d
    ));
    out.push_str(&format!(
        "  R²={} SSE={:.6} RMSE={:.6} n={} evals={}\n",
        fmt_r_squared(q.r_squared),
        q.sse,
        q.rmse,
        q.n,
        q.evaluations
    ));
    out
}

/// The `elisa_report.txt` contents.
pub fn format_text_report(report: &AnalysisReport<'_>) -> String {
    let rule = "=".repeat(REPORT_RULE_WIDTH);
    let p = &report.fit.params;
    let mut out = String::new();

    out.push_str(&rule);
    out.push('\n');
    out.push_str("ELISA ANALYSIS REPORT\n");
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "Generated: {}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str(&format!("Blank OD: {:.4}", report.blank.blank_od()));
    if report.blank.is_missing() {
        out.push_str(" (no blank found; OD not corrected)");
    }
    out.push_str("\n\n");

    out.push_str("Standard Curve Parameters (4PL Model):\n");
    out.push_str(&format!("  A (min asymptote): {:.4}\n", p.a));
    out.push_str(&format!("  B (Hill slope): {:.4}\n", p.b));
    out.push_str(&format!("  C (EC50): {:.4}\n", p.c));
    out.push_str(&format!("  D (max asymptote): {:.4}\n", p.d));
    out.push_str(&format!(
        "  R²: {}\n\n",
        fmt_r_squared(report.fit.quality.r_squared)
    ));

    out.push_str("Sample Results:\n");
    out.push_str(&"-".repeat(REPORT_RULE_WIDTH));
    out.push('\n');
    for r in report.rows.iter().filter(|r| !r.row.is_blank) {
        out.push_str(&format!(
            "{}: OD = {:.4}, ",
            r.row.measurement.label, r.row.corrected_od
        ));
        match r.concentration.value() {
            Some(v) => out.push_str(&format!("Conc = {v:.2} ng/ml\n")),
            None => out.push_str("Conc = Out of range\n"),
        }
    }

    if !report.imprecise.is_empty() {
        out.push_str("\nReplicate precision (CV > 15%):\n");
        for flag in report.imprecise {
            out.push_str(&format!("  {}: CV = {:.1}%\n", flag.label, flag.cv_percent));
        }
    }

    out.push_str(&rule);
    out.push('\n');
    out
}

fn fmt_r_squared(r2: f64) -> String {
    if r2.is_finite() {
        format!("{r2:.6}")
    } else {
        "n/a".to_string()
    }
}

/// Numeric passthrough fields are shown with 4 decimals; text stays verbatim.
fn fmt_cell(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(v) => format!("{v:.4}"),
        Err(_) => raw.to_string(),
    }
}

fn framed(title: &str, body: &str) -> String {
    let rule = "=".repeat(SUMMARY_RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}\n{body}{rule}\n")
}

/// Right-aligned columns, one space between them.
fn format_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{line}\n")
    };

    let mut out = render(columns);
    for row in rows {
        out.push_str(&render(row));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Concentration, CurveParams, FitQuality, Measurement};
    use chrono::TimeZone;

    fn corrected(label: &str, od1: f64, od2: f64, blank_od: f64, is_blank: bool) -> CorrectedRow {
        let mut m = Measurement::new(label, od1, od2);
        m.fields = vec![label.to_string(), od1.to_string(), od2.to_string()];
        let avg = (od1 + od2) / 2.0;
        CorrectedRow {
            measurement: m,
            average_od: avg,
            corrected_od: if is_blank { 0.0 } else { avg - blank_od },
            is_blank,
        }
    }

    fn headers() -> Vec<String> {
        vec!["Sample".into(), "OD1".into(), "OD2".into()]
    }

    fn fit() -> FitResult {
        FitResult {
            params: CurveParams::new(0.05, 1.3, 40.0, 2.8),
            quality: FitQuality {
                r_squared: 0.9987,
                sse: 0.001,
                rmse: 0.01,
                n: 8,
                evaluations: 23,
                iterations: 11,
            },
        }
    }

    #[test]
    fn processing_summary_uses_four_decimals() {
        let rows = vec![
            corrected("Sample1", 0.443, 0.488, 0.1225, false),
            corrected("BLANK", 0.11, 0.135, 0.1225, true),
        ];
        let txt = format_processing_summary(&headers(), &rows);
        let lines: Vec<&str> = txt.lines().collect();

        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "ELISA DATA PROCESSING SUMMARY");
        assert_eq!(lines[3], " Sample    OD1    OD2 AverageOD CorrectedOD");
        assert_eq!(lines[4], "Sample1 0.4430 0.4880    0.4655      0.3430");
        assert_eq!(lines[5], "  BLANK 0.1100 0.1350    0.1225      0.0000");
        assert_eq!(lines[6], "=".repeat(60));
    }

    #[test]
    fn text_report_lists_samples_without_blank() {
        let rows = vec![
            ConcentrationRow {
                row: corrected("Sample1", 0.443, 0.488, 0.1225, false),
                concentration: Concentration::Value(12.3456),
            },
            ConcentrationRow {
                row: corrected("BLANK", 0.11, 0.135, 0.1225, true),
                concentration: Concentration::Value(0.0),
            },
            ConcentrationRow {
                row: corrected("Sample2", 3.0, 3.1, 0.1225, false),
                concentration: Concentration::Saturated,
            },
        ];
        let fit = fit();
        let report = AnalysisReport {
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            blank: BlankStatus::Found {
                row: 1,
                value: 0.1225,
                matches: 1,
            },
            fit: &fit,
            rows: &rows,
            imprecise: &[],
        };

        let txt = format_text_report(&report);
        assert!(txt.contains("Generated: 2025-03-01 09:30:00 UTC\n"));
        assert!(txt.contains("Blank OD: 0.1225\n"));
        assert!(txt.contains("  A (min asymptote): 0.0500\n"));
        assert!(txt.contains("  C (EC50): 40.0000\n"));
        assert!(txt.contains("  R²: 0.998700\n"));
        assert!(txt.contains("Sample1: OD = 0.3430, Conc = 12.35 ng/ml\n"));
        assert!(txt.contains("Sample2: OD = 2.9275, Conc = Out of range\n"));
        assert!(!txt.contains("BLANK:"));
        assert!(!txt.contains("Replicate precision"));
    }

    #[test]
    fn text_report_flags_missing_blank_and_imprecise_rows() {
        let rows = vec![ConcentrationRow {
            row: corrected("S1", 0.2, 0.6, 0.0, false),
            concentration: Concentration::BelowDetection,
        }];
        let imprecise = vec![ImpreciseReplicate {
            row: 0,
            label: "S1".to_string(),
            cv_percent: 50.0,
        }];
        let mut fit = fit();
        fit.quality.r_squared = f64::NAN;
        let report = AnalysisReport {
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            blank: BlankStatus::Missing,
            fit: &fit,
            rows: &rows,
            imprecise: &imprecise,
        };

        let txt = format_text_report(&report);
        assert!(txt.contains("Blank OD: 0.0000 (no blank found; OD not corrected)\n"));
        assert!(txt.contains("  R²: n/a\n"));
        assert!(txt.contains("S1: OD = 0.4000, Conc = Out of range\n"));
        assert!(txt.contains("Replicate precision (CV > 15%):\n  S1: CV = 50.0%\n"));
    }

    #[test]
    fn fit_summary_shows_params() {
        let txt = format_fit_summary(&fit());
        assert!(txt.contains("A=0.0500 B=1.3000 C=40.0000 D=2.8000"));
        assert!(txt.contains("n=8 evals=23"));
    }
}
