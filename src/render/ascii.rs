//! Shaded ASCII heat map of a surface figure.
//!
//! This is intentionally "dumb" (fixed character ramp, nearest-sample lookup),
//! optimized for:
//! - a quick look at the surface without leaving the shell
//! - deterministic output (helpful for golden tests)
//!
//! The outer axis runs top (max) to bottom (min), the inner axis left to right,
//! and darker characters mean higher readings.

use crate::render::SurfaceFigure;

const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Render `figure` into a `width` x `height` character grid plus a header.
pub fn render_ascii_heatmap(figure: &SurfaceFigure, width: usize, height: usize) -> String {
    let heights = figure.heights();
    let rows = heights.len();
    let cols = heights.first().map(Vec::len).unwrap_or(0);

    let mut out = String::new();
    let [a1_lo, a1_hi] = figure.axis1.bounds();
    let [a2_lo, a2_hi] = figure.axis2.bounds();
    out.push_str(&format!(
        "Heat map: {} [{a1_lo:.2}, {a1_hi:.2}] (rows) x {} [{a2_lo:.2}, {a2_hi:.2}] (cols)\n",
        figure.axis1_label, figure.axis2_label
    ));
    if rows == 0 || cols == 0 {
        out.push_str("(empty)\n");
        return out;
    }

    let (lo, hi) = value_range(heights);
    out.push_str(&format!(
        "{}: '{}' = {lo:.2} .. '{}' = {hi:.2}\n",
        figure.output_label,
        RAMP[0],
        RAMP[RAMP.len() - 1]
    ));

    let width = width.clamp(1, cols.max(1) * 4);
    let height = height.clamp(1, rows.max(1));

    for y in 0..height {
        // Top line shows the last outer sample.
        let row = rows - 1 - sample_index(y, height, rows);
        let line: String = (0..width)
            .map(|x| shade(heights[row][sample_index(x, width, cols)], lo, hi))
            .collect();
        out.push('|');
        out.push_str(&line);
        out.push_str("|\n");
    }

    out
}

fn value_range(heights: &[Vec<f64>]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in heights.iter().flatten() {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo, hi)
}

/// Map output position `pos` in `0..n_out` to the nearest of `n_in` samples.
fn sample_index(pos: usize, n_out: usize, n_in: usize) -> usize {
    if n_out <= 1 || n_in <= 1 {
        return 0;
    }
    let u = pos as f64 / (n_out as f64 - 1.0);
    ((u * (n_in as f64 - 1.0)).round() as usize).min(n_in - 1)
}

fn shade(v: f64, lo: f64, hi: f64) -> char {
    if !(hi > lo) {
        return RAMP[RAMP.len() / 2];
    }
    let u = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    RAMP[(u * (RAMP.len() as f64 - 1.0)).round() as usize]
}
