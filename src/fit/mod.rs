//! Standard-curve fitting.
//!
//! Responsibilities:
//!
//! - derive the fixed initial guess from the standards
//! - run Levenberg–Marquardt on the 4PL model
//! - report goodness-of-fit and typed failures

pub mod fitter;
pub mod initial;

pub use fitter::*;
pub use initial::*;
