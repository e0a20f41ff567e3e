//! Plate-level processing: replicate averaging and blank correction.

pub mod average;
pub mod blank;

pub use average::*;
pub use blank::*;
