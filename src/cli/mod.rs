//! Command-line parsing for the ELISA analyzer.
//!
//! Argument parsing and command dispatch stay separate from the assay and
//! fitting code; `app` folds the parsed flags into run configs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DEFAULT_BLANK_NAME;
use crate::math::LmOptions;

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "elisa", version, about = "ELISA plate processing and 4PL standard-curve analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Average duplicate ODs, subtract the blank and write the processed CSV.
    Process(ProcessArgs),
    /// Full analysis: fit the standard curve and compute sample concentrations.
    ///
    /// This is the default when no subcommand is given.
    Analyze(AnalyzeArgs),
}

/// Options shared by both commands.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Sample plate CSV (`Sample`, `OD1`, `OD2`). Prompted for when omitted.
    #[arg(short = 's', long, value_name = "CSV")]
    pub samples: Option<PathBuf>,

    /// Label of the blank well (matched case-insensitively).
    #[arg(short = 'b', long, env = "ELISA_BLANK", default_value = DEFAULT_BLANK_NAME)]
    pub blank: String,

    /// Output directory for `elisa_result.csv` and `elisa_report.txt`.
    ///
    /// `analyze` also writes the analysis figure there as SVG (`elisa_analysis.svg`), not PNG.
    #[arg(short = 'o', long, env = "ELISA_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

/// Options for `elisa process`.
#[derive(Debug, Args, Clone)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options for `elisa analyze`.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Standard-curve CSV (`OD1`, `OD2`, `Concentration (ng/ml)`). Prompted for when omitted.
    #[arg(short = 't', long, value_name = "CSV")]
    pub standards: Option<PathBuf>,

    /// Model-evaluation budget of the curve fitter.
    #[arg(long, default_value_t = LmOptions::DEFAULT_MAX_EVALUATIONS)]
    pub max_evals: usize,

    /// Export the fitted curve (params + quality + grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Skip the ASCII standard-curve preview.
    #[arg(long)]
    pub no_preview: bool,

    /// Preview width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Preview height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::try_parse_from([
            "elisa",
            "analyze",
            "--samples",
            "plate.csv",
            "--standards",
            "std.csv",
            "--blank",
            "blk",
            "--max-evals",
            "500",
            "--no-preview",
        ])
        .unwrap();

        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.common.samples, Some(PathBuf::from("plate.csv")));
        assert_eq!(args.standards, Some(PathBuf::from("std.csv")));
        assert_eq!(args.common.blank, "blk");
        assert_eq!(args.max_evals, 500);
        assert!(args.no_preview);
        assert!(args.export_curve.is_none());
    }

    #[test]
    fn help_names_the_svg_figure() {
        let help = Cli::command()
            .find_subcommand_mut("analyze")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains(crate::domain::OutputPaths::PLOT), "{help}");
        assert!(help.contains("SVG"));
    }

    #[test]
    fn process_defaults() {
        let cli = Cli::try_parse_from(["elisa", "process", "-s", "plate.csv"]).unwrap();
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.common.out_dir, PathBuf::from("."));
    }
}
