//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real entry point. It
//! - loads `.env` and sets up logging
//! - parses CLI arguments (prompting for missing paths)
//! - runs the pipeline and prints summaries
//! - writes the output artifacts

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::prompt::{prompt_for_path, validate_csv_path};
use crate::cli::{AnalyzeArgs, Cli, Command, ProcessArgs};
use crate::domain::{AnalysisConfig, OutputPaths, ProcessConfig};
use crate::error::AppError;
use crate::math::LmOptions;

pub mod pipeline;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "elisa_curves=info";

/// Entry point for the `elisa` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    // `elisa` and `elisa --samples x.csv` behave like `elisa analyze ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    match cli.command {
        Command::Process(args) => handle_process(args),
        Command::Analyze(args) => handle_analyze(args),
    }
}

/// Logs go to stderr so stdout carries only prompts and summaries.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // A subscriber may already be installed (e.g. when embedded); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_process(args: ProcessArgs) -> Result<(), AppError> {
    let config = process_config_from_args(&args)?;
    let run = pipeline::run_process(&config)?;

    println!(
        "{}",
        crate::report::format_processing_summary(&run.samples.headers, &run.corrected.rows)
    );
    pipeline::write_process_outputs(&config.outputs, &run)
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_fit_summary(&run.fit));
    if config.preview {
        println!(
            "{}",
            crate::plot::render_standard_curve(
                &run.points,
                &run.fit.params,
                config.preview_width,
                config.preview_height
            )
        );
    }
    println!(
        "{}",
        crate::report::format_results_summary(&run.samples.headers, &run.results)
    );

    pipeline::write_analysis_outputs(&config, &run, Utc::now())
}

pub fn process_config_from_args(args: &ProcessArgs) -> Result<ProcessConfig, AppError> {
    Ok(ProcessConfig {
        samples_path: path_or_prompt(args.common.samples.as_ref(), "Enter the path to the ELISA data CSV: ")?,
        blank_name: args.common.blank.clone(),
        outputs: OutputPaths::in_dir(&args.common.out_dir),
    })
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    let samples_path = path_or_prompt(args.common.samples.as_ref(), "Enter the path to the ELISA data CSV: ")?;
    let standards_path = path_or_prompt(args.standards.as_ref(), "Enter the path to the standard curve CSV: ")?;

    Ok(AnalysisConfig {
        samples_path,
        standards_path,
        blank_name: args.common.blank.clone(),
        outputs: OutputPaths::in_dir(&args.common.out_dir),
        export_curve: args.export_curve.clone(),
        solver: LmOptions {
            max_evaluations: args.max_evals,
            ..LmOptions::default()
        },
        preview: !args.no_preview,
        preview_width: args.width,
        preview_height: args.height,
    })
}

fn path_or_prompt(flag: Option<&PathBuf>, prompt: &str) -> Result<PathBuf, AppError> {
    match flag {
        Some(path) => validate_csv_path(path),
        None => prompt_for_path(prompt),
    }
}

/// Rewrite argv so `elisa` defaults to `elisa analyze`.
///
/// Rules:
/// - `elisa`                       -> `elisa analyze`
/// - `elisa --samples x.csv ...`   -> `elisa analyze --samples x.csv ...`
/// - `elisa --help/--version/-h`   -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(arg1.as_str(), "process" | "analyze");
    if !is_top_level_help_or_version && !is_subcommand && arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_analyze() {
        assert_eq!(rewrite_args(argv(&["elisa"])), argv(&["elisa", "analyze"]));
    }

    #[test]
    fn leading_flags_go_to_analyze() {
        assert_eq!(
            rewrite_args(argv(&["elisa", "-s", "plate.csv"])),
            argv(&["elisa", "analyze", "-s", "plate.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["elisa", "process", "-s", "x.csv"]),
            argv(&["elisa", "analyze"]),
            argv(&["elisa", "--help"]),
            argv(&["elisa", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn analyze_config_carries_flags() {
        let samples = tempfile::NamedTempFile::new().unwrap();
        let standards = tempfile::NamedTempFile::new().unwrap();
        let cli = Cli::parse_from([
            "elisa",
            "analyze",
            "-s",
            samples.path().to_str().unwrap(),
            "-t",
            standards.path().to_str().unwrap(),
            "--out-dir",
            "out",
            "--max-evals",
            "250",
            "--no-preview",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };

        let config = analysis_config_from_args(&args).unwrap();
        assert_eq!(config.samples_path, samples.path());
        assert_eq!(config.solver.max_evaluations, 250);
        assert!(!config.preview);
        assert_eq!(config.outputs.report, PathBuf::from("out").join(OutputPaths::REPORT));
    }

    #[test]
    fn missing_flag_path_is_rejected() {
        let err = path_or_prompt(Some(&PathBuf::from("/nonexistent/plate.csv")), "").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_IO);
    }
}
