//! Background (blank well) correction.

use tracing::{info, warn};

use crate::domain::{AveragedRow, BlankCorrected, BlankStatus, CorrectedRow};

/// Locate the blank row and subtract its average OD from every row.
///
/// - The first row whose label matches `blank_name` (case-insensitive)
///   supplies the blank value.
/// - Every matching row gets a corrected OD of exactly `0.0`.
/// - Without a match, corrected OD equals average OD and the outcome is
///   `BlankStatus::Missing`.
///
/// Negative corrected values are kept as-is.
pub fn correct_blank(rows: &[AveragedRow], blank_name: &str) -> BlankCorrected {
    let is_blank: Vec<bool> = rows
        .iter()
        .map(|r| r.measurement.is_blank(blank_name))
        .collect();

    let Some(first) = is_blank.iter().position(|&b| b) else {
        warn!(
            blank = blank_name,
            "no blank sample found; corrected OD set equal to average OD"
        );
        return BlankCorrected {
            rows: subtract_blank_value(rows, 0.0),
            blank: BlankStatus::Missing,
        };
    };

    let matches = is_blank.iter().filter(|&&b| b).count();
    if matches > 1 {
        warn!(
            blank = blank_name,
            matches,
            row = first + 1,
            "multiple blank rows; using the first one for the blank value"
        );
    }

    let value = rows[first].average_od;
    info!(blank_od = %format!("{value:.4}"), "blank average OD");

    let corrected = rows
        .iter()
        .zip(&is_blank)
        .map(|(r, &blank)| CorrectedRow {
            measurement: r.measurement.clone(),
            average_od: r.average_od,
            corrected_od: if blank { 0.0 } else { r.average_od - value },
            is_blank: blank,
        })
        .collect();

    BlankCorrected {
        rows: corrected,
        blank: BlankStatus::Found {
            row: first,
            value,
            matches,
        },
    }
}

/// Subtract a known blank OD from every row (no row is treated as the blank).
///
/// Used for the standard-curve plate, which is corrected with the blank
/// measured on the sample plate.
pub fn subtract_blank_value(rows: &[AveragedRow], blank_od: f64) -> Vec<CorrectedRow> {
    rows.iter()
        .map(|r| CorrectedRow {
            measurement: r.measurement.clone(),
            average_od: r.average_od,
            corrected_od: r.average_od - blank_od,
            is_blank: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assay::average_replicates;
    use crate::domain::{DEFAULT_BLANK_NAME, Measurement};

    fn corrected(rows: &[Measurement]) -> BlankCorrected {
        correct_blank(&average_replicates(rows), DEFAULT_BLANK_NAME)
    }

    fn values(out: &BlankCorrected) -> Vec<f64> {
        out.rows.iter().map(|r| r.corrected_od).collect()
    }

    #[test]
    fn corrected_od_with_blank() {
        let out = corrected(&[
            Measurement::new("Sample1", 0.5, 0.5),
            Measurement::new("BLANK", 0.1, 0.1),
        ]);
        let v = values(&out);
        assert!((v[0] - 0.4).abs() < 1e-12);
        assert_eq!(v[1], 0.0);
        assert_eq!(
            out.blank,
            BlankStatus::Found {
                row: 1,
                value: 0.1,
                matches: 1
            }
        );
    }

    #[test]
    fn blank_match_is_case_insensitive() {
        let out = corrected(&[
            Measurement::new("Sample1", 0.6, 0.6),
            Measurement::new("blank", 0.2, 0.2),
        ]);
        assert!((values(&out)[0] - 0.4).abs() < 1e-10);
        assert!(out.rows[1].is_blank);
    }

    #[test]
    fn custom_blank_name() {
        let rows = average_replicates(&[
            Measurement::new("S1", 0.6, 0.6),
            Measurement::new("Background", 0.2, 0.2),
        ]);
        let out = correct_blank(&rows, "BACKGROUND");
        assert!((out.rows[0].corrected_od - 0.4).abs() < 1e-10);
        assert_eq!(out.rows[1].corrected_od, 0.0);
    }

    #[test]
    fn no_blank_leaves_average() {
        let out = corrected(&[
            Measurement::new("Sample1", 0.5, 0.5),
            Measurement::new("Sample2", 0.6, 0.6),
        ]);
        assert_eq!(values(&out), vec![0.5, 0.6]);
        assert!(out.blank.is_missing());
        assert_eq!(out.blank.blank_od(), 0.0);
        assert!(out.rows.iter().all(|r| !r.is_blank));
    }

    #[test]
    fn negative_corrected_od_is_not_clamped() {
        let out = corrected(&[
            Measurement::new("Sample1", 0.1, 0.1),
            Measurement::new("BLANK", 0.5, 0.5),
        ]);
        assert!((values(&out)[0] + 0.4).abs() < 1e-12);
    }

    #[test]
    fn blank_is_exactly_zero_despite_residue() {
        // 0.1 + 0.2 is not exactly 0.3 in binary; the blank must still be 0.0.
        let out = corrected(&[
            Measurement::new("BLANK", 0.1, 0.2),
            Measurement::new("S1", 0.3, 0.3),
        ]);
        assert_eq!(out.rows[0].corrected_od, 0.0);
    }

    #[test]
    fn first_blank_wins_and_all_blanks_are_zeroed() {
        let out = corrected(&[
            Measurement::new("BLANK", 0.1, 0.1),
            Measurement::new("S1", 0.9, 0.9),
            Measurement::new("Blank", 0.3, 0.3),
        ]);
        assert!((out.blank.blank_od() - 0.1).abs() < 1e-12);
        assert!((out.rows[1].corrected_od - 0.8).abs() < 1e-12);
        assert_eq!(out.rows[2].corrected_od, 0.0);
        assert!(matches!(out.blank, BlankStatus::Found { matches: 2, .. }));
    }

    #[test]
    fn typical_plate_scenario() {
        let out = corrected(&[
            Measurement::new("Sample1", 0.443, 0.488),
            Measurement::new("Sample2", 0.433, 0.43),
            Measurement::new("Sample3", 0.343, 0.351),
            Measurement::new("BLANK", 0.11, 0.135),
        ]);
        assert_eq!(out.rows.len(), 4);
        assert!((out.rows[0].average_od - 0.4655).abs() < 1e-10);
        assert!((out.rows[3].average_od - 0.1225).abs() < 1e-10);
        assert!((out.rows[0].corrected_od - 0.343).abs() < 1e-10);
        assert_eq!(out.rows[3].corrected_od, 0.0);
    }

    #[test]
    fn large_and_tiny_values() {
        let big = corrected(&[
            Measurement::new("Sample1", 100.0, 100.0),
            Measurement::new("BLANK", 1.0, 1.0),
        ]);
        assert_eq!(big.rows[0].corrected_od, 99.0);

        let tiny = corrected(&[
            Measurement::new("Sample1", 0.0001, 0.0001),
            Measurement::new("BLANK", 0.0, 0.0),
        ]);
        assert!((tiny.rows[0].corrected_od - 0.0001).abs() < 1e-10);
    }

    #[test]
    fn subtract_known_value_does_not_zero_rows() {
        let rows = average_replicates(&[
            Measurement::new("Std1", 0.3, 0.3).with_concentration(1.0),
            Measurement::new("BLANK", 0.1, 0.1).with_concentration(1.0),
        ]);
        let out = subtract_blank_value(&rows, 0.1);
        assert!((out[0].corrected_od - 0.2).abs() < 1e-12);
        assert!(out[1].corrected_od.abs() < 1e-12);
        assert!(out.iter().all(|r| !r.is_blank));
    }
}
