//! Output module for batch reports
//!
//! This module handles:
//! - The JSON report of every target in a batch
//! - A markdown summary next to it
//! - Console statistics

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{BatchReport, OutputError, OutputResult};
pub use stats::print_statistics;

use std::path::{Path, PathBuf};

/// File name of the JSON report under the download root
pub const REPORT_FILE: &str = "report.json";

/// File name of the markdown summary under the download root
pub const SUMMARY_FILE: &str = "summary.md";

/// Writes `report.json` and `summary.md` under `root`
///
/// # Returns
///
/// * `Ok((json_path, markdown_path))` - Both files written
/// * `Err(OutputError)` - Serialization or IO failed
pub fn write_report(report: &BatchReport, root: &Path) -> OutputResult<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(root)?;

    let json_path = root.join(REPORT_FILE);
    std::fs::write(&json_path, serde_json::to_string_pretty(report)?)?;

    let markdown_path = root.join(SUMMARY_FILE);
    generate_markdown_summary(report, &markdown_path)?;

    tracing::info!(
        "Wrote {} and {}",
        json_path.display(),
        markdown_path.display()
    );

    Ok((json_path, markdown_path))
}
