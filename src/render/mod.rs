//! Response-surface rendering.
//!
//! `SurfaceRenderer` validates a sweep result against its axes and turns it
//! into a backend-independent `SurfaceFigure`. Figures are then drawn by:
//!
//! - the Plotters 3D surface (`surface`), into the TUI or an SVG file
//! - a shaded terminal heat map (`ascii`)

use thiserror::Error;

use crate::domain::{Axis, OUTPUT_LABEL, ResultMatrix};

pub mod ascii;
pub mod surface;

pub use ascii::render_ascii_heatmap;
pub use surface::{Theme, View, draw_surface, render_svg_string, write_svg};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(
        "result matrix is {actual_rows}x{actual_cols} but the axes describe {expected_rows}x{expected_cols}"
    )]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("plot backend error: {0}")]
    Backend(String),
}

/// A validated height field over the mesh spanned by two axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFigure {
    pub title: String,
    /// Outer sweep axis (matrix rows).
    pub axis1: Axis,
    /// Inner sweep axis (matrix columns).
    pub axis2: Axis,
    pub axis1_label: String,
    pub axis2_label: String,
    pub output_label: String,
    heights: Vec<Vec<f64>>,
}

/// One mesh cell: four `(axis2, height, axis1)` corners and their mean height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [(f64, f64, f64); 4],
    pub mean_height: f64,
}

impl SurfaceFigure {
    pub fn heights(&self) -> &[Vec<f64>] {
        &self.heights
    }

    /// `(min, max)` of the height field, widened when flat so it can span an axis.
    pub fn height_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &h in self.heights.iter().flatten() {
            lo = lo.min(h);
            hi = hi.max(h);
        }
        if !(lo.is_finite() && hi.is_finite()) {
            return (0.0, 1.0);
        }
        widen(lo, hi)
    }

    /// Mesh cells in row-major order. Empty when either axis has fewer than two samples.
    pub fn quads(&self) -> impl Iterator<Item = Quad> + '_ {
        let xs = self.axis2.values();
        let zs = self.axis1.values();
        let rows = zs.len().saturating_sub(1);
        let cols = xs.len().saturating_sub(1);
        (0..rows).flat_map(move |i| {
            (0..cols).map(move |j| {
                let h = &self.heights;
                let corners = [
                    (xs[j], h[i][j], zs[i]),
                    (xs[j + 1], h[i][j + 1], zs[i]),
                    (xs[j + 1], h[i + 1][j + 1], zs[i + 1]),
                    (xs[j], h[i + 1][j], zs[i + 1]),
                ];
                let mean_height = corners.iter().map(|c| c.1).sum::<f64>() / 4.0;
                Quad { corners, mean_height }
            })
        })
    }

    /// Every mesh vertex as `(axis2, height, axis1)`.
    pub fn vertices(&self) -> Vec<(f64, f64, f64)> {
        let xs = self.axis2.values();
        let zs = self.axis1.values();
        let mut out = Vec::with_capacity(xs.len() * zs.len());
        for (i, &z) in zs.iter().enumerate() {
            for (j, &x) in xs.iter().enumerate() {
                out.push((x, self.heights[i][j], z));
            }
        }
        out
    }
}

/// Builds `SurfaceFigure`s with fixed labelling.
#[derive(Debug, Clone)]
pub struct SurfaceRenderer {
    title: String,
    output_label: String,
}

impl Default for SurfaceRenderer {
    fn default() -> Self {
        Self {
            title: "Fan Speed Response Surface".to_string(),
            output_label: OUTPUT_LABEL.to_string(),
        }
    }
}

impl SurfaceRenderer {
    pub fn new(title: impl Into<String>, output_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            output_label: output_label.into(),
        }
    }

    /// Pair `matrix` with its axes. The shape must be exactly `(len(axis1), len(axis2))`.
    pub fn render(
        &self,
        axis1: &Axis,
        axis2: &Axis,
        matrix: &ResultMatrix,
    ) -> Result<SurfaceFigure, RenderError> {
        let (rows, cols) = matrix.shape();
        if rows != axis1.len() || cols != axis2.len() {
            return Err(RenderError::DimensionMismatch {
                expected_rows: axis1.len(),
                expected_cols: axis2.len(),
                actual_rows: rows,
                actual_cols: cols,
            });
        }

        let heights = (0..rows).map(|i| matrix.row(i)).collect();
        Ok(SurfaceFigure {
            title: self.title.clone(),
            axis1: axis1.clone(),
            axis2: axis2.clone(),
            axis1_label: axis1.kind().axis_label(),
            axis2_label: axis2.kind().axis_label(),
            output_label: self.output_label.clone(),
            heights,
        })
    }
}

/// Give a degenerate `[lo, hi]` range some extent.
pub(crate) fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        let pad = (lo.abs() * 0.05).max(1.0);
        (lo - pad, hi + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InputKind;

    fn axes() -> (Axis, Axis) {
        (
            Axis::new(InputKind::Temperature, vec![10.0, 20.0, 30.0]),
            Axis::new(InputKind::CoolerPower, vec![0.0, 100.0]),
        )
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let (a1, a2) = axes();
        let m = ResultMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let err = SurfaceRenderer::default().render(&a1, &a2, &m).unwrap_err();
        assert_eq!(
            err,
            RenderError::DimensionMismatch {
                expected_rows: 3,
                expected_cols: 2,
                actual_rows: 2,
                actual_cols: 2,
            }
        );
    }

    #[test]
    fn transposed_matrix_is_rejected() {
        let (a1, a2) = axes();
        let m = ResultMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert!(SurfaceRenderer::default().render(&a1, &a2, &m).is_err());
    }

    #[test]
    fn mesh_maps_heights_onto_axis_coordinates() {
        let (a1, a2) = axes();
        let m = ResultMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let fig = SurfaceRenderer::default().render(&a1, &a2, &m).unwrap();

        assert_eq!(fig.axis1_label, "Temperature (°C)");
        assert_eq!(fig.axis2_label, "Cooler Peltier (%)");
        assert_eq!(fig.output_label, "Fan Speed (%)");

        let quads: Vec<Quad> = fig.quads().collect();
        assert_eq!(quads.len(), 2);
        assert_eq!(
            quads[0].corners,
            [(0.0, 1.0, 10.0), (100.0, 2.0, 10.0), (100.0, 4.0, 20.0), (0.0, 3.0, 20.0)]
        );
        assert_eq!(quads[1].mean_height, 4.5);
        assert_eq!(fig.vertices().len(), 6);
        assert_eq!(fig.height_range(), (1.0, 6.0));
    }

    #[test]
    fn flat_surface_still_has_a_height_range() {
        let (a1, a2) = axes();
        let m = ResultMatrix::from_rows(&[vec![42.0; 2], vec![42.0; 2], vec![42.0; 2]]).unwrap();
        let fig = SurfaceRenderer::default().render(&a1, &a2, &m).unwrap();
        let (lo, hi) = fig.height_range();
        assert!(lo < 42.0 && hi > 42.0);
    }
}
