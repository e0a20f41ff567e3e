//! Small descriptive statistics used by the fitter and reports.

use std::cmp::Ordering;

/// Median of the finite values (mean of the two middle values for even counts).
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sum of squared differences between observed and predicted values.
pub fn sum_squared_residuals(observed: &[f64], predicted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(predicted)
        .map(|(o, p)| (o - p) * (o - p))
        .sum()
}

/// Coefficient of determination `1 − SS_res / SS_tot`.
///
/// `NaN` when the observations have zero variance (or are empty).
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let Some(mean) = mean(observed) else {
        return f64::NAN;
    };
    let ss_tot: f64 = observed.iter().map(|o| (o - mean) * (o - mean)).sum();
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    1.0 - sum_squared_residuals(observed, predicted) / ss_tot
}
