use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::record::ResultRecord;
use crate::store::ResultStore;

/// Outcome class of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Pass,
    NoConvergence,
    Failed,
    /// Neither an error nor a convergence flag was recorded.
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Pass => "PASS",
            Classification::NoConvergence => "NO CONVERGENCE",
            Classification::Failed => "FAILED",
            Classification::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure beats convergence; convergence is whatever the solver said.
pub fn classify(record: &ResultRecord) -> Classification {
    match record {
        ResultRecord::Failure(_) => Classification::Failed,
        ResultRecord::Success(s) if s.converged.is_converged() => Classification::Pass,
        ResultRecord::Success(_) => Classification::NoConvergence,
    }
}

/// Classify one entry of an untyped results document by the fields present.
pub fn classify_entry(entry: &Value) -> Classification {
    if entry.get("error").is_some() {
        return Classification::Failed;
    }
    match entry.get("converged") {
        Some(flag) if is_truthy(flag) => Classification::Pass,
        Some(_) => Classification::NoConvergence,
        None => Classification::Unknown,
    }
}

// Arrays follow matrix semantics: true only when non-empty and every element
// is true, so `[[1]]` from a matrix-oriented writer counts as converged.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::Array(items) => !items.is_empty() && items.iter().all(is_truthy),
        Value::Null | Value::String(_) | Value::Object(_) => false,
    }
}

/// `(name, classification)` for every scenario, in store order.
pub fn summarize(store: &ResultStore) -> Vec<(String, Classification)> {
    store
        .iter()
        .map(|(name, record)| (name.to_string(), classify(record)))
        .collect()
}

/// Summarize a results document that may come from another producer.
pub fn summarize_document(document: &Value) -> Result<Vec<(String, Classification)>> {
    let Some(entries) = document.as_object() else {
        bail!("results document must be an object keyed by scenario name");
    };
    Ok(entries
        .iter()
        .map(|(name, entry)| (name.clone(), classify_entry(entry)))
        .collect())
}

/// Per-class totals of a summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub pass: usize,
    pub no_convergence: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl SummaryCounts {
    pub fn tally(lines: &[(String, Classification)]) -> Self {
        let mut counts = Self::default();
        for (_, class) in lines {
            match class {
                Classification::Pass => counts.pass += 1,
                Classification::NoConvergence => counts.no_convergence += 1,
                Classification::Failed => counts.failed += 1,
                Classification::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pass + self.no_convergence + self.failed + self.unknown
    }
}

pub fn format_line(name: &str, class: Classification) -> String {
    format!("{name}: {class}")
}

/// Print the summary block: one line per scenario, then the totals.
pub fn print_summary(lines: &[(String, Classification)]) {
    println!();
    println!("Summary:");
    for (name, class) in lines {
        println!("  {}", format_line(name, *class));
    }
    let counts = SummaryCounts::tally(lines);
    println!();
    println!(
        "{} scenarios: {} pass, {} no convergence, {} failed, {} unknown",
        counts.total(),
        counts.pass,
        counts.no_convergence,
        counts.failed,
        counts.unknown
    );
}
