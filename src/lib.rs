//! `elisa-curves` library crate.
//!
//! The binary (`elisa`) is a thin wrapper around this library so that:
//!
//! - the assay, fitting and inversion stages are testable without spawning processes
//! - the pipeline can be driven from other front-ends

pub mod app;
pub mod assay;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod invert;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
