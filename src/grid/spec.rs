//! Grid specification: which inputs are swept, over what ranges, and what the
//! others are held at.

use thiserror::Error;

use crate::domain::{Axis, AxisDescriptor, FixedInputs, InputKind};

/// Invalid grid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("invalid range for {kind}: min={min}, max={max} (must be finite and min <= max)")]
    InvalidRange { kind: InputKind, min: f64, max: f64 },

    #[error("resolution for {kind} must be >= 1")]
    ZeroResolution { kind: InputKind },

    #[error("{kind} cannot be swept on both axes")]
    DuplicateSweptInput { kind: InputKind },

    #[error("fixed value for {kind} must be finite, got {value}")]
    NonFiniteFixedValue { kind: InputKind, value: f64 },
}

/// Range descriptors for all four logical inputs, indexed by argument position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRanges {
    descriptors: [AxisDescriptor; 4],
}

impl InputRanges {
    pub fn get(&self, kind: InputKind) -> AxisDescriptor {
        self.descriptors[kind.arg_index()]
    }

    pub fn set(&mut self, kind: InputKind, descriptor: AxisDescriptor) {
        self.descriptors[kind.arg_index()] = descriptor;
    }

    /// Apply one resolution to every input.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        for d in &mut self.descriptors {
            d.resolution = resolution;
        }
        self
    }
}

impl Default for InputRanges {
    fn default() -> Self {
        Self {
            descriptors: InputKind::ALL.map(InputKind::default_descriptor),
        }
    }
}

/// A validated sweep grid: two sampled axes plus the fixed pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    outer: Axis,
    inner: Axis,
    fixed: FixedInputs,
}

impl GridSpec {
    /// Build a grid sweeping `outer` × `inner` with the other two inputs held at
    /// `fixed_values` (given in argument order of the remaining kinds).
    pub fn build(
        ranges: &InputRanges,
        outer: InputKind,
        inner: InputKind,
        fixed_values: [f64; 2],
    ) -> Result<Self, GridError> {
        if outer == inner {
            return Err(GridError::DuplicateSweptInput { kind: outer });
        }

        let outer_axis = sample_axis(outer, ranges.get(outer))?;
        let inner_axis = sample_axis(inner, ranges.get(inner))?;

        let fixed_kinds = fixed_kinds_for(outer, inner);
        for (&kind, &value) in fixed_kinds.iter().zip(fixed_values.iter()) {
            if !value.is_finite() {
                return Err(GridError::NonFiniteFixedValue { kind, value });
            }
        }

        Ok(Self {
            outer: outer_axis,
            inner: inner_axis,
            fixed: FixedInputs {
                kinds: fixed_kinds,
                values: fixed_values,
            },
        })
    }

    /// Build directly from pre-sampled axes.
    ///
    /// Useful when the caller wants exact sample values rather than a linspace.
    pub fn from_axes(outer: Axis, inner: Axis, fixed_values: [f64; 2]) -> Result<Self, GridError> {
        if outer.kind() == inner.kind() {
            return Err(GridError::DuplicateSweptInput { kind: outer.kind() });
        }
        for axis in [&outer, &inner] {
            if axis.is_empty() {
                return Err(GridError::ZeroResolution { kind: axis.kind() });
            }
            if axis.values().iter().any(|v| !v.is_finite()) {
                let [min, max] = axis.bounds();
                return Err(GridError::InvalidRange { kind: axis.kind(), min, max });
            }
        }
        let fixed_kinds = fixed_kinds_for(outer.kind(), inner.kind());
        for (&kind, &value) in fixed_kinds.iter().zip(fixed_values.iter()) {
            if !value.is_finite() {
                return Err(GridError::NonFiniteFixedValue { kind, value });
            }
        }
        Ok(Self {
            outer,
            inner,
            fixed: FixedInputs {
                kinds: fixed_kinds,
                values: fixed_values,
            },
        })
    }

    pub fn outer(&self) -> &Axis {
        &self.outer
    }

    pub fn inner(&self) -> &Axis {
        &self.inner
    }

    pub fn fixed(&self) -> &FixedInputs {
        &self.fixed
    }

    /// `(len(outer), len(inner))`.
    pub fn shape(&self) -> (usize, usize) {
        (self.outer.len(), self.inner.len())
    }

    pub fn total_cells(&self) -> usize {
        self.outer.len() * self.inner.len()
    }
}

/// The two inputs not swept, in argument order.
pub fn fixed_kinds_for(outer: InputKind, inner: InputKind) -> [InputKind; 2] {
    let mut rest = InputKind::ALL
        .into_iter()
        .filter(|&k| k != outer && k != inner);
    // Exactly two remain once outer != inner.
    let first = rest.next().unwrap_or(InputKind::TemperatureChange);
    let second = rest.next().unwrap_or(InputKind::HeaterPower);
    [first, second]
}

fn sample_axis(kind: InputKind, d: AxisDescriptor) -> Result<Axis, GridError> {
    let values = linspace(d.min, d.max, d.resolution).map_err(|e| match e {
        LinspaceError::Range => GridError::InvalidRange { kind, min: d.min, max: d.max },
        LinspaceError::Steps => GridError::ZeroResolution { kind },
    })?;
    Ok(Axis::new(kind, values))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinspaceError {
    Range,
    Steps,
}

/// `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// A single step yields `[min]`; the final sample is pinned to `max`.
fn linspace(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, LinspaceError> {
    if !(min.is_finite() && max.is_finite() && min <= max) {
        return Err(LinspaceError::Range);
    }
    if steps == 0 {
        return Err(LinspaceError::Steps);
    }
    if steps == 1 {
        return Ok(vec![min]);
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps - 1 {
        out.push(min + step * i as f64);
    }
    out.push(max);
    Ok(out)
}
