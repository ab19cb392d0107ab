//! Shared domain types.
//!
//! These types are intentionally kept small and immutable once built so they can be:
//!
//! - handed between the grid, sweep and render stages by reference
//! - compared directly in tests
//! - formatted into error reports that reproduce a failing invocation

use std::fmt;

use clap::ValueEnum;
use nalgebra::DMatrix;

/// The four logical inputs of the fan controller.
///
/// Declaration order is the controller's positional argument order:
///
/// `<program> <temperature> <temperature-change> <cooler-power> <heater-power>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum InputKind {
    /// Water temperature (°C).
    Temperature,
    /// Temperature change rate (°C/s).
    TemperatureChange,
    /// TEC cooler power (%).
    CoolerPower,
    /// TEC heater power (%).
    HeaterPower,
}

impl InputKind {
    pub const ALL: [InputKind; 4] = [
        InputKind::Temperature,
        InputKind::TemperatureChange,
        InputKind::CoolerPower,
        InputKind::HeaterPower,
    ];

    /// Position of this input in the controller's argument list.
    pub fn arg_index(self) -> usize {
        match self {
            InputKind::Temperature => 0,
            InputKind::TemperatureChange => 1,
            InputKind::CoolerPower => 2,
            InputKind::HeaterPower => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            InputKind::Temperature => "Temperature",
            InputKind::TemperatureChange => "Temperature Change",
            InputKind::CoolerPower => "Cooler Peltier",
            InputKind::HeaterPower => "Heater Peltier",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            InputKind::Temperature => "°C",
            InputKind::TemperatureChange => "°C/s",
            InputKind::CoolerPower | InputKind::HeaterPower => "%",
        }
    }

    /// Axis label including the unit, e.g. `Temperature (°C)`.
    pub fn axis_label(self) -> String {
        format!("{} ({})", self.display_name(), self.unit())
    }

    /// Name as accepted on the command line (`cooler-power`, ...).
    pub fn cli_name(self) -> &'static str {
        match self {
            InputKind::Temperature => "temperature",
            InputKind::TemperatureChange => "temperature-change",
            InputKind::CoolerPower => "cooler-power",
            InputKind::HeaterPower => "heater-power",
        }
    }

    /// Sampled range used when nothing else is configured.
    pub fn default_descriptor(self) -> AxisDescriptor {
        let (min, max) = match self {
            InputKind::Temperature => (10.0, 45.0),
            InputKind::TemperatureChange => (-1.0, 1.0),
            InputKind::CoolerPower | InputKind::HeaterPower => (0.0, 100.0),
        };
        AxisDescriptor {
            min,
            max,
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// Value held when this input is not swept.
    pub fn default_fixed_value(self) -> f64 {
        match self {
            InputKind::Temperature => 25.0,
            InputKind::TemperatureChange => 0.0,
            InputKind::CoolerPower | InputKind::HeaterPower => 50.0,
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

/// Samples per swept axis when no resolution is given.
pub const DEFAULT_RESOLUTION: usize = 50;

/// Label of the vertical (output) dimension.
pub const OUTPUT_LABEL: &str = "Fan Speed (%)";

/// Range description for one logical input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDescriptor {
    pub min: f64,
    pub max: f64,
    pub resolution: usize,
}

/// Evenly spaced, inclusive samples of one logical input.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    kind: InputKind,
    values: Vec<f64>,
}

impl Axis {
    pub fn new(kind: InputKind, values: Vec<f64>) -> Self {
        Self { kind, values }
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `[first, last]` sample values.
    pub fn bounds(&self) -> [f64; 2] {
        let first = self.values.first().copied().unwrap_or(0.0);
        let last = self.values.last().copied().unwrap_or(first);
        [first, last]
    }
}

/// Values of the two inputs that stay constant for a whole sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedInputs {
    pub kinds: [InputKind; 2],
    pub values: [f64; 2],
}

/// The four concrete values passed to one controller invocation,
/// stored in positional argument order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    values: [f64; 4],
}

impl GridCell {
    /// Assemble a cell from `(kind, value)` pairs. Each kind must appear once.
    pub fn from_inputs(inputs: [(InputKind, f64); 4]) -> Self {
        let mut values = [0.0; 4];
        for (kind, value) in inputs {
            values[kind.arg_index()] = value;
        }
        Self { values }
    }

    pub fn value(&self, kind: InputKind) -> f64 {
        self.values[kind.arg_index()]
    }

    pub fn values(&self) -> [f64; 4] {
        self.values
    }

    /// Values formatted as separate process arguments.
    ///
    /// Rust's `Display` for `f64` is shortest-round-trip and never uses an exponent.
    pub fn to_args(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = InputKind::ALL
            .iter()
            .map(|&k| format!("{}={}", k.cli_name(), self.value(k)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Sweep output: one controller reading per `(outer, inner)` index pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMatrix {
    data: DMatrix<f64>,
}

impl ResultMatrix {
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: DMatrix::zeros(rows, cols),
        }
    }

    /// Build a matrix from row slices. Returns `None` for ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != n_cols) {
            return None;
        }
        Some(Self {
            data: DMatrix::from_fn(n_rows, n_cols, |i, j| rows[i][j]),
        })
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[(row, col)] = value;
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        if self.data.is_empty() {
            return None;
        }
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in self.data.iter() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        Some((lo, hi))
    }

    pub fn mean(&self) -> Option<f64> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.data.mean())
        }
    }

    /// Index and value of the largest reading (first one in row-major order on ties).
    pub fn argmax(&self) -> Option<((usize, usize), f64)> {
        let (rows, cols) = self.shape();
        let mut best: Option<((usize, usize), f64)> = None;
        for i in 0..rows {
            for j in 0..cols {
                let v = self.data[(i, j)];
                if best.is_none_or(|(_, b)| v > b) {
                    best = Some(((i, j), v));
                }
            }
        }
        best
    }
}

/// Sweep progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub current: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Percent complete in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        100.0 * self.current as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_orders_values_by_argument_position() {
        let cell = GridCell::from_inputs([
            (InputKind::CoolerPower, 30.0),
            (InputKind::Temperature, 10.5),
            (InputKind::HeaterPower, 50.0),
            (InputKind::TemperatureChange, -0.25),
        ]);
        assert_eq!(cell.values(), [10.5, -0.25, 30.0, 50.0]);
        assert_eq!(cell.to_args(), vec!["10.5", "-0.25", "30", "50"]);
    }

    #[test]
    fn small_values_format_without_exponent() {
        let cell = GridCell::from_inputs([
            (InputKind::Temperature, 1e-7),
            (InputKind::TemperatureChange, 0.0),
            (InputKind::CoolerPower, 0.0),
            (InputKind::HeaterPower, 0.0),
        ]);
        assert_eq!(cell.to_args()[0], "0.0000001");
    }

    #[test]
    fn matrix_argmax_reports_row_and_column() {
        let m = ResultMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 9.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.argmax(), Some(((1, 1), 9.0)));
        assert_eq!(m.row(0), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(ResultMatrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn progress_percentage_hits_exactly_one_hundred() {
        let state = ProgressState { current: 9, total: 9 };
        assert_eq!(state.percentage(), 100.0);
        assert!(state.is_complete());
    }
}
