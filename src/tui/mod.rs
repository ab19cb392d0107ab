//! Ratatui-based surface viewer.
//!
//! The sweep runs on a background thread while the TUI shows a progress
//! gauge; once it finishes, the fan-speed surface is drawn with Plotters and
//! can be rotated and zoomed. Quitting mid-sweep cancels it after the
//! in-flight cell.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::app::pipeline::{self, SweepOutput, SweepSettings};
use crate::domain::{GridCell, ProgressState};
use crate::error::{AppError, EXIT_INVOCATION, EXIT_RENDER};
use crate::progress::{ProgressReporter, format_percentage};
use crate::render::View;
use crate::sweep::CancelToken;

mod surface_chart;

use surface_chart::SurfaceChart;

const YAW_STEP: f64 = 0.1;
const PITCH_STEP: f64 = 0.05;
const ZOOM_STEP: f64 = 1.1;

/// Start the viewer: sweep in the background, then display the surface.
pub fn run(settings: SweepSettings) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_RENDER, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::start(settings);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(EXIT_RENDER, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                EXIT_RENDER,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Forwards progress from the sweep thread to the UI thread.
struct ChannelProgress {
    tx: Sender<(ProgressState, GridCell)>,
}

impl ProgressReporter for ChannelProgress {
    fn report(&mut self, state: ProgressState, cell: &GridCell) {
        // The receiver is gone only when the UI is already shutting down.
        let _ = self.tx.send((state, *cell));
    }
}

enum Phase {
    Sweeping {
        state: ProgressState,
        last_cell: Option<GridCell>,
    },
    Ready(Box<SweepOutput>),
}

struct App {
    settings: SweepSettings,
    phase: Phase,
    view: View,
    cancel: CancelToken,
    progress_rx: Receiver<(ProgressState, GridCell)>,
    worker: Option<JoinHandle<Result<SweepOutput, AppError>>>,
    status: String,
}

impl App {
    fn start(settings: SweepSettings) -> Self {
        let cancel = CancelToken::new();
        let (tx, progress_rx) = mpsc::channel();

        let total = pipeline::build_grid(&settings.grid)
            .map(|spec| spec.total_cells())
            .unwrap_or(0);
        let status = format!("Running {}", settings.controller.program.display());

        let worker = {
            let settings = settings.clone();
            let cancel = cancel.clone();
            thread::spawn(move || {
                pipeline::run_sweep(&settings, &mut ChannelProgress { tx }, Some(cancel))
            })
        };

        Self {
            settings,
            phase: Phase::Sweeping {
                state: ProgressState::new(total),
                last_cell: None,
            },
            view: View::default(),
            cancel,
            progress_rx,
            worker: Some(worker),
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_progress() {
                needs_redraw = true;
            }
            if self.collect_worker()? {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_RENDER, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_RENDER, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read()
                .map_err(|e| AppError::new(EXIT_RENDER, format!("Event read error: {e}")))?
            {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply queued progress updates. Returns whether anything changed.
    fn drain_progress(&mut self) -> bool {
        let Phase::Sweeping { state, last_cell } = &mut self.phase else {
            return false;
        };
        let mut changed = false;
        for (s, cell) in self.progress_rx.try_iter() {
            *state = s;
            *last_cell = Some(cell);
            changed = true;
        }
        changed
    }

    /// Pick up the sweep result once the worker thread has finished.
    ///
    /// A failed or cancelled sweep ends the viewer with that error.
    fn collect_worker(&mut self) -> Result<bool, AppError> {
        if !self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            return Ok(false);
        }
        let Some(handle) = self.worker.take() else {
            return Ok(false);
        };
        let output = handle
            .join()
            .map_err(|_| AppError::new(EXIT_INVOCATION, "Sweep worker panicked."))??;

        self.status = format!(
            "Sweep finished: {} cells in {:.2}s",
            output.spec.total_cells(),
            output.elapsed.as_secs_f64()
        );
        self.phase = Phase::Ready(Box::new(output));
        Ok(true)
    }

    /// Returns `true` when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            return match self.phase {
                Phase::Ready(_) => true,
                Phase::Sweeping { .. } => {
                    // Keep looping until the worker observes the token and returns.
                    self.cancel.cancel();
                    self.status = "Cancelling after the current cell...".to_string();
                    false
                }
            };
        }

        if let Phase::Sweeping { .. } = self.phase {
            return false;
        }

        self.view = match code {
            KeyCode::Left => self.view.rotated(-YAW_STEP, 0.0),
            KeyCode::Right => self.view.rotated(YAW_STEP, 0.0),
            KeyCode::Up => self.view.rotated(0.0, PITCH_STEP),
            KeyCode::Down => self.view.rotated(0.0, -PITCH_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => self.view.zoomed(ZOOM_STEP),
            KeyCode::Char('-') => self.view.zoomed(1.0 / ZOOM_STEP),
            KeyCode::Char('r') => View::default(),
            _ => return false,
        };
        self.status = format!(
            "yaw {:.2}  pitch {:.2}  zoom {:.2}",
            self.view.yaw, self.view.pitch, self.view.scale
        );
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let grid = &self.settings.grid;
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled(
                "tecsweep",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" - fan speed response surface"),
        ]));

        let fixed = crate::grid::fixed_kinds_for(grid.outer, grid.inner)
            .iter()
            .zip(grid.fixed_values())
            .map(|(k, v)| format!("{}={v}{}", k.cli_name(), k.unit()))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(Line::from(format!(
            "swept: {} x {}   fixed: {fixed}",
            grid.outer.axis_label(),
            grid.inner.axis_label()
        )));

        let stats = match &self.phase {
            Phase::Sweeping { state, .. } => {
                format!("progress: {}% ({}/{})", format_percentage(*state), state.current, state.total)
            }
            Phase::Ready(output) => stats_line(output),
        };
        lines.push(Line::from(Span::styled(stats, Style::default().fg(Color::Green))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(match &self.phase {
            Phase::Sweeping { .. } => "Sweeping".to_string(),
            Phase::Ready(output) => output.figure.title.clone(),
        });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &self.phase {
            Phase::Sweeping { state, last_cell } => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Length(2), Constraint::Min(0)])
                    .split(inner);

                let ratio = (state.percentage() / 100.0).clamp(0.0, 1.0);
                let gauge = Gauge::default()
                    .block(Block::default().borders(Borders::ALL))
                    .gauge_style(Style::default().fg(Color::Cyan))
                    .ratio(ratio)
                    .label(format!("{}%", format_percentage(*state)));
                frame.render_widget(gauge, rows[0]);

                let detail = last_cell
                    .map(|c| format!("last cell: {c}"))
                    .unwrap_or_else(|| "waiting for the first reading...".to_string());
                let p = Paragraph::new(detail)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Gray));
                frame.render_widget(p, rows[1]);
            }
            Phase::Ready(output) => {
                frame.render_widget(
                    SurfaceChart {
                        figure: &output.figure,
                        view: self.view,
                    },
                    inner,
                );
            }
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.phase {
            Phase::Sweeping { .. } => "q cancel",
            Phase::Ready(_) => "\u{2190}/\u{2192} yaw  \u{2191}/\u{2193} pitch  +/- zoom  r reset  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn stats_line(output: &SweepOutput) -> String {
    let mut parts = Vec::new();
    if let Some((lo, hi)) = output.matrix.min_max() {
        parts.push(format!("min {lo:.2}%  max {hi:.2}%"));
    }
    if let Some(mean) = output.matrix.mean() {
        parts.push(format!("mean {mean:.2}%"));
    }
    if let Some(((i, j), v)) = output.matrix.argmax() {
        parts.push(format!(
            "peak {v:.2}% at {}={}, {}={}",
            output.spec.outer().kind(),
            output.spec.outer().values()[i],
            output.spec.inner().kind(),
            output.spec.inner().values()[j],
        ));
    }
    parts.join("   ")
}
