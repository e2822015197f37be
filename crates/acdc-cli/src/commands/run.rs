use std::path::{Path, PathBuf};

use acdc_batch::summary::print_summary;
use acdc_batch::{load_suite, persist, summarize, ScenarioRunner, ScenarioSuite};
use acdc_solver::{SolverProcess, DEFAULT_SOLVER_BINARY};
use anyhow::Result;
use tracing::info;

pub fn handle(
    suite: Option<&Path>,
    solver: Option<&Path>,
    case_root: Option<&Path>,
    out: &Path,
    verbose_solver: bool,
) -> Result<()> {
    let suite = match suite {
        Some(path) => load_suite(path)?,
        None => ScenarioSuite::builtin(),
    };
    let suite = if verbose_solver {
        suite.with_suppressed_output(false)
    } else {
        suite
    };

    let binary: PathBuf = match solver {
        Some(path) => path.to_path_buf(),
        None => SolverProcess::find_binary(DEFAULT_SOLVER_BINARY)?,
    };
    let mut process = SolverProcess::new(binary);
    if let Some(root) = case_root {
        process = process.with_case_root(root);
    }

    println!("{}", "=".repeat(80));
    println!("AC/DC Power Flow Regression Suite");
    println!("{}", "=".repeat(80));
    info!(
        scenarios = suite.len(),
        solver = %process.binary_path().display(),
        "running suite"
    );

    let store = ScenarioRunner::new(&process).run_suite(&suite)?;
    persist(&store, out)?;

    println!();
    println!("{}", "=".repeat(80));
    println!("Suite complete. Results saved to: {}", out.display());
    println!("{}", "=".repeat(80));
    print_summary(&summarize(&store));
    Ok(())
}
