//! Plotting: terminal preview and the SVG analysis figure.

pub mod ascii;
pub mod chart;

pub use ascii::*;
pub use chart::*;
