use acdc_batch::DEFAULT_RESULTS_PATH;
use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "AC/DC power-flow regression harness", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario suite through the solver and write the result store
    Run {
        /// Scenario suite (YAML or JSON); the built-in regression suite if omitted
        #[arg(long, value_hint = ValueHint::FilePath)]
        suite: Option<PathBuf>,
        /// Solver binary; searched in ~/.acdc/solvers/ and PATH if omitted
        #[arg(long, value_hint = ValueHint::ExecutablePath)]
        solver: Option<PathBuf>,
        /// Directory the solver resolves case identifiers against
        #[arg(long, value_hint = ValueHint::DirPath)]
        case_root: Option<PathBuf>,
        /// Result store destination (overwritten)
        #[arg(short, long, default_value = DEFAULT_RESULTS_PATH, value_hint = ValueHint::FilePath)]
        out: PathBuf,
        /// Let the solver print its own progress output
        #[arg(long)]
        verbose_solver: bool,
    },
    /// Classify every scenario in a result store
    Summary {
        /// Result store to read
        #[arg(value_hint = ValueHint::FilePath)]
        results: PathBuf,
    },
    /// Compare two result stores table by table
    Compare {
        /// Reference result store
        #[arg(value_hint = ValueHint::FilePath)]
        reference: PathBuf,
        /// Candidate result store
        #[arg(value_hint = ValueHint::FilePath)]
        candidate: PathBuf,
        /// Relative tolerance; absolute tolerance is 100x this
        #[arg(long, default_value_t = 1e-5)]
        tolerance: f64,
        /// Count a NaN on both sides as a match
        #[arg(long)]
        nan_equal: bool,
        /// Also print a field-by-field comparison of this scenario
        #[arg(long, value_name = "SCENARIO")]
        detailed: Option<String>,
        /// Write the comparison report to this file
        #[arg(long, value_hint = ValueHint::FilePath)]
        report: Option<PathBuf>,
    },
}
