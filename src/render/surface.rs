//! Plotters 3D surface drawing.
//!
//! `draw_surface` is backend-agnostic: the TUI calls it through
//! `plotters-ratatui-backend`, and `write_svg` through the SVG backend.
//!
//! Plotters' 3D coordinate system is `(x, y, z)` with `y` vertical, so the
//! inner sweep axis runs along `x`, the outer axis along `z`, and the reading is
//! the height.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::render::{RenderError, SurfaceFigure, widen};

/// Camera for the 3D projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub yaw: f64,
    pub pitch: f64,
    pub scale: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            yaw: 0.7,
            pitch: 0.35,
            scale: 0.85,
        }
    }
}

impl View {
    pub fn rotated(self, d_yaw: f64, d_pitch: f64) -> Self {
        Self {
            yaw: (self.yaw + d_yaw) % std::f64::consts::TAU,
            pitch: (self.pitch + d_pitch).clamp(-1.5, 1.5),
            scale: self.scale,
        }
    }

    pub fn zoomed(self, factor: f64) -> Self {
        Self {
            scale: (self.scale * factor).clamp(0.2, 3.0),
            ..self
        }
    }
}

/// Colors and sizes that differ between terminal and file output.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub foreground: RGBColor,
    pub caption_size: u32,
    pub label_size: u32,
    pub margin: u32,
    pub show_caption: bool,
}

impl Theme {
    /// High-contrast, compact styling for low-resolution terminal cells.
    pub fn terminal() -> Self {
        Self {
            foreground: WHITE,
            caption_size: 10,
            label_size: 10,
            margin: 1,
            show_caption: false,
        }
    }

    pub fn svg() -> Self {
        Self {
            foreground: BLACK,
            caption_size: 24,
            label_size: 14,
            margin: 20,
            show_caption: true,
        }
    }
}

/// Draw `figure` as a shaded 3D surface onto `root`.
pub fn draw_surface<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &SurfaceFigure,
    view: View,
    theme: &Theme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let [x0, x1] = figure.axis2.bounds();
    let [z0, z1] = figure.axis1.bounds();
    let (x0, x1) = widen(x0, x1);
    let (z0, z1) = widen(z0, z1);
    let (h0, h1) = figure.height_range();

    let fg = theme.foreground;
    let label_style = ("sans-serif", theme.label_size).into_font().color(&fg);

    let mut builder = ChartBuilder::on(root);
    builder.margin(theme.margin);
    if theme.show_caption {
        builder.caption(
            &figure.title,
            ("sans-serif", theme.caption_size).into_font().color(&fg),
        );
    }
    let mut chart = builder.build_cartesian_3d(x0..x1, h0..h1, z0..z1)?;

    chart.with_projection(|mut pb| {
        pb.yaw = view.yaw;
        pb.pitch = view.pitch;
        pb.scale = view.scale;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(fg.mix(0.15))
        .bold_grid_style(fg.mix(0.4))
        .max_light_lines(3)
        .label_style(label_style.clone())
        .draw()?;

    if figure.axis1.len() >= 2 && figure.axis2.len() >= 2 {
        chart.draw_series(figure.quads().map(|q| {
            let color = height_color(q.mean_height, h0, h1);
            Polygon::new(q.corners.to_vec(), color.mix(0.85).filled())
        }))?;
    } else {
        // A single-sample axis has no area to shade; draw the profile instead.
        let color = height_color(h1, h0, h1);
        chart.draw_series(LineSeries::new(figure.vertices(), &color))?;
    }

    chart.draw_series([
        Text::new(figure.axis2_label.clone(), (x1, h0, z0), label_style.clone()),
        Text::new(figure.axis1_label.clone(), (x0, h0, z1), label_style.clone()),
        Text::new(figure.output_label.clone(), (x0, h1, z0), label_style),
    ])?;

    Ok(())
}

/// Blue (low) to red (high).
fn height_color(h: f64, lo: f64, hi: f64) -> HSLColor {
    let t = if hi > lo { ((h - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.5 };
    HSLColor(0.66 * (1.0 - t), 0.85, 0.5)
}

/// Write the figure to an SVG file.
pub fn write_svg(path: &Path, figure: &SurfaceFigure, size: (u32, u32)) -> Result<(), RenderError> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(backend_error)?;
    draw_surface(&root, figure, View::default(), &Theme::svg()).map_err(backend_error)?;
    root.present().map_err(backend_error)?;
    tracing::info!(path = %path.display(), "wrote surface SVG");
    Ok(())
}

/// Render the figure to an in-memory SVG document.
pub fn render_svg_string(figure: &SurfaceFigure, size: (u32, u32)) -> Result<String, RenderError> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, size).into_drawing_area();
        root.fill(&WHITE).map_err(backend_error)?;
        draw_surface(&root, figure, View::default(), &Theme::svg()).map_err(backend_error)?;
        root.present().map_err(backend_error)?;
    }
    Ok(buf)
}

fn backend_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Backend(e.to_string())
}
