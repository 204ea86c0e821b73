//! Analysis modules.
//!
//! Tabulation, binning and grouped statistics over the flattened points.

pub mod aggregator;
pub mod histogram;
pub mod table;

pub use aggregator::*;
pub use histogram::Histogram2d;
pub use table::PointTable;
