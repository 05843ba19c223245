//! Console statistics for a finished batch

use crate::crawler::OutcomeStatus;
use crate::output::report::BatchReport;

/// Prints batch statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The batch to display
pub fn print_statistics(report: &BatchReport) {
    println!("=== Batch Statistics ===\n");

    println!("Overview:");
    println!("  Targets: {}", report.targets.len());
    println!("  Images retrieved: {}", report.total_retrieved());
    println!("  Item failures: {}", report.total_failed_items());
    println!("  Duration: {}s", report.duration_seconds());
    println!();

    println!("Targets by Status:");
    for status in [OutcomeStatus::Retrieved, OutcomeStatus::Empty, OutcomeStatus::Failed] {
        let count = report.count_by_status(status);
        let percentage = if report.targets.is_empty() {
            0.0
        } else {
            (count as f64 / report.targets.len() as f64) * 100.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    for target in &report.targets {
        match (&target.result, &target.error) {
            (Some(result), _) => println!(
                "  [{}] {} - {} images",
                target.status,
                result.display_name,
                result.retrieved_paths.len()
            ),
            (None, Some(error)) => println!("  [{}] {} - {}", target.status, target.address, error),
            (None, None) => println!("  [{}] {}", target.status, target.address),
        }
    }
}
