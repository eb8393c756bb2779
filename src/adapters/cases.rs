//! Historical case files and per-case CSV reports.

use crate::core::evaluation::{CaseResult, HistoricalCase};
use crate::utils::error::Result;
use std::path::Path;

/// Reads a JSON array of `{"input": {...}, "expected_output": ...}` objects.
pub fn load_cases<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalCase>> {
    let content = std::fs::read(path)?;
    let cases = serde_json::from_slice(&content)?;
    Ok(cases)
}

pub fn write_report<P: AsRef<Path>>(path: P, results: &[CaseResult]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}
