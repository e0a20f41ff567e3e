//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - processed-plate CSV export (`export`)
//! - standard-curve JSON export (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
