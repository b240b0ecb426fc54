//! Mathematical utilities: Hill saturation, spend grids, series statistics.

pub mod grid;
pub mod hill;
pub mod stats;

pub use grid::*;
pub use hill::*;
pub use stats::*;
