//! Domain types used throughout the sweep.
//!
//! This module defines:
//!
//! - the logical controller inputs (`InputKind`) and their ranges (`AxisDescriptor`)
//! - sampled axes and per-invocation cells (`Axis`, `FixedInputs`, `GridCell`)
//! - sweep outputs (`ResultMatrix`, `ProgressState`)

pub mod types;

pub use types::*;
