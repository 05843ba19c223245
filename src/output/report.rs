//! Batch report types
//!
//! A [`BatchReport`] records every target of one CLI run and is written
//! next to the downloaded images.

use crate::crawler::{OutcomeStatus, TargetOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything one batch run produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// SHA-256 of the config file, or "default"
    pub config_hash: String,

    pub download_root: String,
    pub targets: Vec<TargetOutcome>,
}

impl BatchReport {
    pub fn new(
        started_at: DateTime<Utc>,
        config_hash: &str,
        download_root: &str,
        targets: Vec<TargetOutcome>,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            config_hash: config_hash.to_string(),
            download_root: download_root.to_string(),
            targets,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    pub fn count_by_status(&self, status: OutcomeStatus) -> usize {
        self.targets.iter().filter(|t| t.status == status).count()
    }

    /// Total images stored across all targets
    pub fn total_retrieved(&self) -> usize {
        self.targets.iter().map(TargetOutcome::retrieved_count).sum()
    }

    /// Total item failures across all targets
    pub fn total_failed_items(&self) -> usize {
        self.targets.iter().map(TargetOutcome::failed_count).sum()
    }

    /// Percentage of targets that stored at least one image
    pub fn success_rate(&self) -> f64 {
        if self.targets.is_empty() {
            return 0.0;
        }
        (self.count_by_status(OutcomeStatus::Retrieved) as f64 / self.targets.len() as f64) * 100.0
    }
}
