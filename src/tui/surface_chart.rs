//! Plotters-powered 3D surface widget for Ratatui.
//!
//! The drawing itself is shared with the SVG export (`render::draw_surface`);
//! this widget only adapts it to a terminal buffer via
//! `plotters-ratatui-backend`.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::render::{SurfaceFigure, Theme, View, draw_surface};

/// Render-only view of a finished surface.
pub struct SurfaceChart<'a> {
    pub figure: &'a SurfaceFigure,
    pub view: View,
}

impl Widget for SurfaceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out a 3D chart in a handful of cells.
        if area.width < 24 || area.height < 10 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let figure = self.figure;
        let view = self.view;
        let widget = widget_fn(move |root| {
            draw_surface(&root, figure, view, &Theme::terminal())?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
