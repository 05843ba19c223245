//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a batch run,
//! including per-target outcomes and item failures.

use crate::crawler::OutcomeStatus;
use crate::output::report::{BatchReport, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary for a batch
///
/// # Arguments
///
/// * `report` - The batch report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &BatchReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a batch report as markdown
pub fn format_markdown_summary(report: &BatchReport) -> String {
    let mut md = String::new();

    md.push_str("# Galleria Batch Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!("- **Duration**: {} seconds\n", report.duration_seconds()));
    md.push_str(&format!("- **Download Root**: {}\n", report.download_root));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.config_hash));

    // Totals
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Targets**: {}\n", report.targets.len()));
    md.push_str(&format!("- **Images Retrieved**: {}\n", report.total_retrieved()));
    md.push_str(&format!("- **Item Failures**: {}\n", report.total_failed_items()));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", report.success_rate()));

    md.push_str("| Status | Targets |\n");
    md.push_str("|--------|---------|\n");
    for status in [OutcomeStatus::Retrieved, OutcomeStatus::Empty, OutcomeStatus::Failed] {
        md.push_str(&format!("| {} | {} |\n", status, report.count_by_status(status)));
    }
    md.push('\n');

    // Per target
    if !report.targets.is_empty() {
        md.push_str("## Targets\n\n");
        md.push_str("| Target | Name | Status | Images | Failures | Attempts |\n");
        md.push_str("|--------|------|--------|--------|----------|----------|\n");

        for target in &report.targets {
            let (name, attempts) = match &target.result {
                Some(result) => (result.display_name.as_str(), result.attempts.to_string()),
                None => ("-", "-".to_string()),
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                target.target_id,
                escape_cell(name),
                target.status,
                target.retrieved_count(),
                target.failed_count(),
                attempts
            ));
        }
        md.push('\n');
    }

    // Errors
    let failed: Vec<_> = report.targets.iter().filter(|t| t.error.is_some()).collect();
    if !failed.is_empty() {
        md.push_str("## Failed Targets\n\n");
        for target in failed {
            md.push_str(&format!(
                "- {}: {}\n",
                target.address,
                target.error.as_deref().unwrap_or_default()
            ));
        }
        md.push('\n');
    }

    let item_failures: Vec<_> = report
        .targets
        .iter()
        .filter_map(|t| t.result.as_ref())
        .flat_map(|r| r.failures.iter().map(move |f| (&r.target_id, f)))
        .collect();
    if !item_failures.is_empty() {
        md.push_str("## Item Failures\n\n");
        for (target_id, failure) in item_failures {
            md.push_str(&format!("- [{}] {}: {}\n", target_id, failure.url, failure.error));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Galleria*\n");

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
