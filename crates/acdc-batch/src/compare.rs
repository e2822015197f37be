//! Table-by-table equivalence check between two result stores.
//!
//! Typically the reference store comes from one solver implementation and
//! the candidate from another. Each AC table (`bus`, `gen`, `branch`) and DC
//! table (`busdc`, `convdc`, `branchdc`) is compared cell by cell with the
//! usual closeness rule `|a - b| <= atol + rtol * |b|`, where `a` is the
//! reference value. An infinite cell matches only the same infinity, and NaN
//! never matches unless [`Tolerance::equal_nan`] is set.

use acdc_solver::{ConvergenceFlag, Matrix};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::record::{ResultRecord, SuccessRecord};
use crate::store::ResultStore;

// Keeps the relative difference finite where the reference is zero.
const REL_EPS: f64 = 1e-12;

/// Relative and absolute comparison tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
    /// Treat a NaN on both sides as a match.
    pub equal_nan: bool,
}

impl Tolerance {
    /// `rtol` as given, `atol` a hundred times looser.
    pub fn from_relative(rtol: f64) -> Self {
        Self {
            rtol,
            atol: rtol * 100.0,
            equal_nan: false,
        }
    }

    pub fn with_equal_nan(mut self, equal_nan: bool) -> Self {
        self.equal_nan = equal_nan;
        self
    }

    /// Absolute difference of two cells. A NaN difference counts as infinite.
    pub(crate) fn abs_diff(&self, a: f64, b: f64) -> f64 {
        if a == b || (self.equal_nan && a.is_nan() && b.is_nan()) {
            return 0.0;
        }
        let d = (a - b).abs();
        if d.is_nan() {
            f64::INFINITY
        } else {
            d
        }
    }

    /// Closeness of one reference cell `a` and candidate cell `b`.
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            self.equal_nan && a.is_nan() && b.is_nan()
        } else if a.is_infinite() || b.is_infinite() {
            a == b
        } else {
            (a - b).abs() <= self.atol + self.rtol * b.abs()
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::from_relative(1e-5)
    }
}

/// Difference statistics for one pair of same-shaped tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableStats {
    pub shape: (usize, usize),
    pub matches: bool,
    pub max_abs_diff: f64,
    pub mean_abs_diff: f64,
    pub max_rel_diff: f64,
    pub mean_rel_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableDiff {
    ShapeMismatch {
        reference: (usize, usize),
        candidate: (usize, usize),
    },
    Compared(TableStats),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableComparison {
    pub table: &'static str,
    pub diff: TableDiff,
}

impl TableComparison {
    pub fn matches(&self) -> bool {
        matches!(&self.diff, TableDiff::Compared(stats) if stats.matches)
    }

    pub fn max_abs_diff(&self) -> Option<f64> {
        match &self.diff {
            TableDiff::Compared(stats) => Some(stats.max_abs_diff),
            TableDiff::ShapeMismatch { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonStatus {
    Pass,
    DifferencesFound,
    /// At least one side recorded a failure instead of results.
    Failed,
    /// The scenario exists in only one of the stores.
    Missing,
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonStatus::Pass => "PASS",
            ComparisonStatus::DifferencesFound => "DIFFERENCES_FOUND",
            ComparisonStatus::Failed => "FAILED",
            ComparisonStatus::Missing => "MISSING",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub name: String,
    pub status: ComparisonStatus,
    pub reference_converged: Option<ConvergenceFlag>,
    pub candidate_converged: Option<ConvergenceFlag>,
    pub ac_results: Vec<TableComparison>,
    pub dc_results: Vec<TableComparison>,
    pub note: Option<String>,
}

impl ScenarioComparison {
    fn without_tables(name: &str, status: ComparisonStatus, note: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            reference_converged: None,
            candidate_converged: None,
            ac_results: Vec::new(),
            dc_results: Vec::new(),
            note: Some(note),
        }
    }

    /// Both sides solved but disagree on whether they converged.
    pub fn convergence_differs(&self) -> bool {
        match (self.reference_converged, self.candidate_converged) {
            (Some(r), Some(c)) => r.is_converged() != c.is_converged(),
            _ => false,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableComparison> {
        self.ac_results.iter().chain(self.dc_results.iter())
    }

    /// Largest absolute difference over all compared tables, 0 if none.
    pub fn max_abs_diff(&self) -> f64 {
        self.tables()
            .filter_map(TableComparison::max_abs_diff)
            .fold(0.0, f64::max)
    }
}

/// Compare two tables cell by cell.
pub fn compare_tables(
    table: &'static str,
    reference: &Matrix,
    candidate: &Matrix,
    tolerance: Tolerance,
) -> TableComparison {
    if reference.shape() != candidate.shape() {
        return TableComparison {
            table,
            diff: TableDiff::ShapeMismatch {
                reference: reference.shape(),
                candidate: candidate.shape(),
            },
        };
    }

    let mut matches = true;
    let (mut max_abs, mut sum_abs) = (0.0_f64, 0.0_f64);
    let (mut max_rel, mut sum_rel, mut rel_count) = (0.0_f64, 0.0_f64, 0usize);
    let mut count = 0usize;

    for (a, b) in reference.values().zip(candidate.values()) {
        count += 1;
        let abs = tolerance.abs_diff(a, b);
        if !tolerance.is_close(a, b) {
            matches = false;
        }
        max_abs = max_abs.max(abs);
        sum_abs += abs;

        let rel = abs / (a.abs() + REL_EPS);
        if !rel.is_nan() {
            max_rel = max_rel.max(rel);
            sum_rel += rel;
            rel_count += 1;
        }
    }

    let mean = |sum: f64, n: usize| if n == 0 { 0.0 } else { sum / n as f64 };
    TableComparison {
        table,
        diff: TableDiff::Compared(TableStats {
            shape: reference.shape(),
            matches,
            max_abs_diff: max_abs,
            mean_abs_diff: mean(sum_abs, count),
            max_rel_diff: max_rel,
            mean_rel_diff: mean(sum_rel, rel_count),
        }),
    }
}

fn compare_success(
    name: &str,
    reference: &SuccessRecord,
    candidate: &SuccessRecord,
    tolerance: Tolerance,
) -> ScenarioComparison {
    let (ra, ca) = (&reference.resultsac, &candidate.resultsac);
    let (rd, cd) = (&reference.resultsdc, &candidate.resultsdc);
    let ac_results = vec![
        compare_tables("bus", &ra.bus, &ca.bus, tolerance),
        compare_tables("gen", &ra.gen, &ca.gen, tolerance),
        compare_tables("branch", &ra.branch, &ca.branch, tolerance),
    ];
    let dc_results = vec![
        compare_tables("busdc", &rd.busdc, &cd.busdc, tolerance),
        compare_tables("convdc", &rd.convdc, &cd.convdc, tolerance),
        compare_tables("branchdc", &rd.branchdc, &cd.branchdc, tolerance),
    ];
    let all_match = ac_results.iter().chain(&dc_results).all(TableComparison::matches);

    let comparison = ScenarioComparison {
        name: name.to_string(),
        status: if all_match {
            ComparisonStatus::Pass
        } else {
            ComparisonStatus::DifferencesFound
        },
        reference_converged: Some(reference.converged),
        candidate_converged: Some(candidate.converged),
        ac_results,
        dc_results,
        note: None,
    };
    if comparison.convergence_differs() {
        warn!(
            scenario = name,
            reference = %reference.converged,
            candidate = %candidate.converged,
            "convergence status differs"
        );
    }
    comparison
}

fn compare_records(
    name: &str,
    reference: &ResultRecord,
    candidate: &ResultRecord,
    tolerance: Tolerance,
) -> ScenarioComparison {
    match (reference, candidate) {
        (ResultRecord::Success(r), ResultRecord::Success(c)) => {
            compare_success(name, r, c, tolerance)
        }
        _ => {
            let side = |record: &ResultRecord| {
                record
                    .error_message()
                    .map_or_else(|| "ok".to_string(), |msg| format!("error: {msg}"))
            };
            let mut comparison = ScenarioComparison::without_tables(
                name,
                ComparisonStatus::Failed,
                format!("reference {}; candidate {}", side(reference), side(candidate)),
            );
            comparison.reference_converged = reference.converged();
            comparison.candidate_converged = candidate.converged();
            comparison
        }
    }
}

/// Compare every scenario of `reference` against `candidate`, in reference
/// order, followed by scenarios only the candidate has.
pub fn compare_stores(
    reference: &ResultStore,
    candidate: &ResultStore,
    tolerance: Tolerance,
) -> Vec<ScenarioComparison> {
    let mut comparisons: Vec<ScenarioComparison> = reference
        .iter()
        .map(|(name, ref_record)| match candidate.get(name) {
            Some(cand_record) => compare_records(name, ref_record, cand_record, tolerance),
            None => {
                warn!(scenario = name, "missing from candidate results");
                ScenarioComparison::without_tables(
                    name,
                    ComparisonStatus::Missing,
                    "not present in candidate results".to_string(),
                )
            }
        })
        .collect();

    for name in candidate.names().filter(|n| reference.get(n).is_none()) {
        warn!(scenario = name, "missing from reference results");
        comparisons.push(ScenarioComparison::without_tables(
            name,
            ComparisonStatus::Missing,
            "not present in reference results".to_string(),
        ));
    }
    comparisons
}

pub fn all_pass(comparisons: &[ScenarioComparison]) -> bool {
    comparisons.iter().all(|c| c.status == ComparisonStatus::Pass)
}

/// Print one block per scenario, then the per-scenario verdict lines.
pub fn print_comparison(comparisons: &[ScenarioComparison]) {
    for comparison in comparisons {
        println!();
        println!("{}: {}", comparison.name, comparison.status);
        if let (Some(r), Some(c)) = (comparison.reference_converged, comparison.candidate_converged)
        {
            let flag = if comparison.convergence_differs() {
                "  (differs)"
            } else {
                ""
            };
            println!("  converged: reference {r}, candidate {c}{flag}");
        }
        for table in comparison.tables() {
            match &table.diff {
                TableDiff::ShapeMismatch {
                    reference,
                    candidate,
                } => println!(
                    "  {:<10} shape mismatch: {:?} vs {:?}",
                    table.table, reference, candidate
                ),
                TableDiff::Compared(stats) => println!(
                    "  {:<10} {:?} match={} max abs {:.2e} max rel {:.2e}",
                    table.table, stats.shape, stats.matches, stats.max_abs_diff, stats.max_rel_diff
                ),
            }
        }
        if let Some(note) = &comparison.note {
            println!("  {note}");
        }
    }

    println!();
    println!("Comparison:");
    for comparison in comparisons {
        match comparison.status {
            ComparisonStatus::Pass | ComparisonStatus::DifferencesFound => println!(
                "  {:<20}: {} (max diff: {:.2e})",
                comparison.name,
                comparison.status,
                comparison.max_abs_diff()
            ),
            _ => println!("  {:<20}: {}", comparison.name, comparison.status),
        }
    }
}

/// Plain-text comparison report, one section per scenario.
pub fn render_report(comparisons: &[ScenarioComparison], tolerance: Tolerance) -> String {
    let flag = |c: Option<ConvergenceFlag>| c.map_or_else(|| "N/A".to_string(), |c| c.to_string());
    let mut out = String::new();
    let _ = writeln!(out, "AC/DC Result Comparison Report");
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(
        out,
        "rtol {:e}, atol {:e}, NaN equal: {}",
        tolerance.rtol, tolerance.atol, tolerance.equal_nan
    );

    for comparison in comparisons {
        let _ = writeln!(out);
        let _ = writeln!(out, "Scenario: {}", comparison.name);
        let _ = writeln!(out, "{}", "-".repeat(80));
        let _ = writeln!(out, "Status: {}", comparison.status);
        let _ = writeln!(out, "Reference converged: {}", flag(comparison.reference_converged));
        let _ = writeln!(out, "Candidate converged: {}", flag(comparison.candidate_converged));

        for (label, tables) in [
            ("AC results", &comparison.ac_results),
            ("DC results", &comparison.dc_results),
        ] {
            if tables.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{label}:");
            for table in tables {
                let _ = writeln!(out, "  {}:", table.table);
                match &table.diff {
                    TableDiff::ShapeMismatch {
                        reference,
                        candidate,
                    } => {
                        let _ = writeln!(out, "    Shape mismatch: {reference:?} vs {candidate:?}");
                    }
                    TableDiff::Compared(stats) => {
                        let _ = writeln!(out, "    Match: {}", stats.matches);
                        let _ = writeln!(out, "    Max abs diff: {:.2e}", stats.max_abs_diff);
                        let _ = writeln!(out, "    Max rel diff: {:.2e}", stats.max_rel_diff);
                    }
                }
            }
        }
        if let Some(note) = &comparison.note {
            let _ = writeln!(out, "Note: {note}");
        }
    }
    out
}

/// Write the [`render_report`] text to `path`, replacing any existing file.
pub fn write_report(
    comparisons: &[ScenarioComparison],
    tolerance: Tolerance,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    fs::write(path, render_report(comparisons, tolerance))
        .with_context(|| format!("writing comparison report {}", path.display()))?;
    info!(path = %path.display(), scenarios = comparisons.len(), "wrote comparison report");
    Ok(())
}
