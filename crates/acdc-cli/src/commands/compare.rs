use std::path::Path;

use acdc_batch::compare::{all_pass, print_comparison};
use acdc_batch::detail::print_detail;
use acdc_batch::{
    compare_stores, detail_scenario, load, write_report, ComparisonStatus, Tolerance,
};
use anyhow::{bail, Result};
use tracing::info;

pub fn handle(
    reference: &Path,
    candidate: &Path,
    tolerance: f64,
    nan_equal: bool,
    detailed: Option<&str>,
    report: Option<&Path>,
) -> Result<()> {
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        bail!("tolerance must be a non-negative number, got {tolerance}");
    }
    let tolerance = Tolerance::from_relative(tolerance).with_equal_nan(nan_equal);
    info!(
        reference = %reference.display(),
        candidate = %candidate.display(),
        rtol = tolerance.rtol,
        atol = tolerance.atol,
        equal_nan = tolerance.equal_nan,
        "comparing result stores"
    );
    let reference_store = load(reference)?;
    let candidate_store = load(candidate)?;
    let comparisons = compare_stores(&reference_store, &candidate_store, tolerance);
    print_comparison(&comparisons);

    if let Some(path) = report {
        write_report(&comparisons, tolerance, path)?;
        println!();
        println!("Report saved to: {}", path.display());
    }
    if let Some(name) = detailed {
        let detail = detail_scenario(name, &reference_store, &candidate_store, tolerance)?;
        print_detail(&detail);
    }

    if !all_pass(&comparisons) {
        let failing = comparisons.iter().filter(|c| c.status != ComparisonStatus::Pass).count();
        bail!("{failing} scenario(s) differ from the reference");
    }
    println!();
    println!("All scenarios match the reference");
    Ok(())
}
