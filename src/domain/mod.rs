//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - plate rows at each stage (`Measurement`, `AveragedRow`, `CorrectedRow`)
//! - blank search outcome (`BlankStatus`)
//! - fit outputs (`CurveParams`, `FitQuality`, `FitResult`)
//! - inversion outcome (`Concentration`)
//! - run configuration and the curve JSON schema

pub mod types;

pub use types::*;
