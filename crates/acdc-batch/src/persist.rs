use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::store::ResultStore;

/// Where a run writes its results unless told otherwise.
pub const DEFAULT_RESULTS_PATH: &str = "acdc_results.json";

/// Write the whole store to `path`, replacing any existing file.
///
/// The document is one JSON object keyed by scenario name. Each value is
/// either `{resultsac, resultsdc, converged, timecalc, case_ac, case_dc}` or
/// `{error, case_ac, case_dc}`.
pub fn persist(store: &ResultStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating results directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(store).context("serializing result store to JSON")?;
    fs::write(path, json).with_context(|| format!("writing results '{}'", path.display()))?;
    Ok(())
}

/// Read a store written by [`persist`] (or any producer of the same layout).
pub fn load(path: &Path) -> Result<ResultStore> {
    let file =
        File::open(path).with_context(|| format!("opening results '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing results '{}'", path.display()))
}

/// Read a results file as an untyped JSON document.
pub fn load_document(path: &Path) -> Result<Value> {
    let file =
        File::open(path).with_context(|| format!("opening results '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing results '{}'", path.display()))
}
