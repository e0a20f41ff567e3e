//! Numerical utilities: linear least squares, Levenberg–Marquardt, statistics.

pub mod lm;
pub mod lsq;
pub mod stats;

pub use lm::*;
pub use lsq::*;
pub use stats::*;
