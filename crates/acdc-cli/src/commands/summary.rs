use std::path::Path;

use acdc_batch::summary::print_summary;
use acdc_batch::{load_document, summarize_document};
use anyhow::{Context, Result};

pub fn handle(results: &Path) -> Result<()> {
    let document = load_document(results)?;
    let lines = summarize_document(&document)
        .with_context(|| format!("summarizing '{}'", results.display()))?;
    println!("Results: {}", results.display());
    print_summary(&lines);
    Ok(())
}
