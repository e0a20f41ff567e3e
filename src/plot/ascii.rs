//! ASCII preview of the standard curve for terminal output.
//!
//! Fixed-size character grid with a log10 concentration axis:
//! - standards: `o`
//! - fitted curve: `-` line
//!
//! Output is deterministic, which keeps golden tests simple.

use crate::domain::{CurveParams, StandardPoint};
use crate::models::sample_curve_log;

/// Render standards plus the fitted curve.
///
/// Standards with a non-positive concentration are skipped (no log position).
pub fn render_standard_curve(
    standards: &[StandardPoint],
    params: &CurveParams,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = standards
        .iter()
        .filter(|p| p.concentration > 0.0 && p.concentration.is_finite() && p.od.is_finite())
        .map(|p| (p.concentration.log10(), p.od))
        .collect();

    let Some((lx_min, lx_max)) = x_range(&points) else {
        return "Plot: not enough positive standard concentrations\n".to_string();
    };

    let curve: Vec<(f64, f64)> = sample_curve_log(params, 10f64.powf(lx_min), 10f64.powf(lx_max), width)
        .into_iter()
        .map(|(x, y)| (x.log10(), y))
        .filter(|(_, y)| y.is_finite())
        .collect();

    let (y_min, y_max) = y_range(&points, &curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    let mut prev = None;
    for &(lx, y) in &curve {
        let cell = (map_x(lx, lx_min, lx_max, width), map_y(y, y_min, y_max, height));
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, cell.0, cell.1, '-'),
            None => grid[cell.1][cell.0] = '-',
        }
        prev = Some(cell);
    }

    for &(lx, y) in &points {
        grid[map_y(y, y_min, y_max, height)][map_x(lx, lx_min, lx_max, width)] = 'o';
    }

    let mut out = format!(
        "Plot: conc=[{:.3}, {:.3}] ng/ml (log) | OD=[{y_min:.3}, {y_max:.3}]\n",
        10f64.powf(lx_min),
        10f64.powf(lx_max),
    );
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn x_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let lo = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    (lo.is_finite() && hi > lo).then_some((lo, hi))
}

fn y_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let (lo, hi) = points
        .iter()
        .chain(curve)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    (lo.is_finite() && hi > lo).then_some((lo, hi))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (largest OD).
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

/// Integer line drawing (Bresenham); never overwrites a non-blank cell.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);
    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
