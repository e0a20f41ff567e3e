//! Four-parameter logistic (4PL) dose-response model.
//!
//! Kept as small pure functions so fitting, inversion and plotting share one
//! definition of the curve.

pub mod model;

pub use model::*;
