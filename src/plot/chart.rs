//! Two-panel analysis figure rendered with Plotters.
//!
//! - left: standards (scatter) and the fitted 4PL curve on a log concentration axis
//! - right: bar chart of sample concentrations (blanks and undefined values skipped)
//!
//! All series and bounds are computed before drawing, so `render_analysis_svg`
//! only talks to Plotters.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::domain::{ConcentrationRow, CurveParams, StandardPoint};
use crate::error::AppError;
use crate::models::sample_curve_log;

/// Points on the smooth fitted curve.
pub const CURVE_POINTS: usize = 100;

const FIGURE_SIZE: (u32, u32) = (1500, 600);

/// Render-ready series for the analysis figure.
#[derive(Debug, Clone)]
pub struct AnalysisChart {
    pub standards: Vec<(f64, f64)>,
    pub curve: Vec<(f64, f64)>,
    /// `(label, concentration)` bars in input order.
    pub bars: Vec<(String, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl AnalysisChart {
    /// Build the series from fitted standards and inverted sample rows.
    ///
    /// Standards with a non-positive concentration cannot sit on a log axis
    /// and are left out of the scatter.
    pub fn new(standards: &[StandardPoint], params: &CurveParams, rows: &[ConcentrationRow]) -> Self {
        let scatter: Vec<(f64, f64)> = standards
            .iter()
            .filter(|p| p.concentration > 0.0 && p.concentration.is_finite())
            .map(|p| (p.concentration, p.od))
            .collect();

        let x_min = scatter.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let x_max = scatter.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let x_bounds = if x_min.is_finite() && x_max > x_min {
            [x_min, x_max]
        } else if x_min.is_finite() {
            [x_min / 10.0, x_min * 10.0]
        } else {
            [1.0, 1000.0]
        };

        let curve = sample_curve_log(params, x_bounds[0], x_bounds[1], CURVE_POINTS);

        let ys = scatter.iter().chain(&curve).map(|p| p.1).filter(|y| y.is_finite());
        let (y_lo, y_hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
        let y_bounds = if y_lo.is_finite() && y_hi > y_lo {
            let pad = (y_hi - y_lo) * 0.05;
            [y_lo - pad, y_hi + pad]
        } else {
            [0.0, 1.0]
        };

        let bars = rows
            .iter()
            .filter(|r| !r.row.is_blank)
            .filter_map(|r| {
                r.concentration
                    .value()
                    .map(|v| (r.row.measurement.label.clone(), v))
            })
            .collect();

        Self {
            standards: scatter,
            curve,
            bars,
            x_bounds,
            y_bounds,
        }
    }
}

/// Render the figure to an SVG file.
pub fn write_analysis_svg(path: &Path, chart: &AnalysisChart) -> Result<(), AppError> {
    render_analysis_svg(path, chart)
        .map_err(|e| AppError::io(format!("Failed to write plot '{}': {e}", path.display())))?;
    info!("Plot saved to {}", path.display());
    Ok(())
}

fn render_analysis_svg(path: &Path, chart: &AnalysisChart) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    let (left, right) = (&panels[0], &panels[1]);

    let [x0, x1] = chart.x_bounds;
    let [y0, y1] = chart.y_bounds;

    let mut curve_chart = ChartBuilder::on(left)
        .caption("Standard Curve (4PL Fit)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((x0..x1).log_scale(), y0..y1)?;

    curve_chart
        .configure_mesh()
        .x_desc("Concentration (ng/ml)")
        .y_desc("Corrected OD")
        .draw()?;

    curve_chart
        .draw_series(LineSeries::new(chart.curve.iter().copied(), &RED))?
        .label("4PL fit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    curve_chart
        .draw_series(
            chart
                .standards
                .iter()
                .map(|&p| Circle::new(p, 4, BLUE.filled())),
        )?
        .label("Standards")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLUE.filled()));

    curve_chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    let c_max = chart.bars.iter().map(|b| b.1).fold(0.0f64, f64::max);
    let c_hi = if c_max > 0.0 { c_max * 1.1 } else { 1.0 };

    let mut bar_chart = ChartBuilder::on(right)
        .caption("Sample Concentrations", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..chart.bars.len().max(1)).into_segmented(), 0.0..c_hi)?;

    bar_chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(chart.bars.len().max(1))
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => chart.bars.get(*i).map(|b| b.0.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc("Sample")
        .y_desc("Concentration (ng/ml)")
        .draw()?;

    bar_chart.draw_series(chart.bars.iter().enumerate().map(|(i, (_, v))| {
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
            GREEN.mix(0.7).filled(),
        );
        bar.set_margin(0, 0, 5, 5);
        bar
    }))?;

    root.present()?;
    Ok(())
}
