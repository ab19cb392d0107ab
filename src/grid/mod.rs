//! Sweep grid construction.
//!
//! Responsibilities:
//!
//! - sample each swept input into an evenly spaced, inclusive axis
//! - hold the remaining two inputs at fixed values
//! - enumerate grid cells in row-major `(outer, inner)` order

pub mod cells;
pub mod spec;

pub use cells::*;
pub use spec::*;
