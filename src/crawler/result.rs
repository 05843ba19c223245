//! Per-target results

use crate::retrieve::RetrievalFailure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What one successful crawl attempt produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlAttemptResult {
    /// False when no URLs were selected or none could be retrieved
    pub success: bool,
    pub target_id: String,
    pub display_name: String,
    pub retrieved_paths: Vec<PathBuf>,
    pub total_candidates_found: usize,
    pub failures: Vec<RetrievalFailure>,
    /// Attempt number that produced this result (1-based)
    pub attempts: u32,
}

/// Coarse classification of a target outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// At least one image stored
    Retrieved,
    /// Finished without images
    Empty,
    /// Attempts exhausted or input rejected
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieved => "retrieved",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The recorded outcome of one address in a batch
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub address: String,
    pub target_id: String,
    pub status: OutcomeStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CrawlAttemptResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetOutcome {
    /// Builds the outcome for one target
    ///
    /// A completed attempt reports the id it resolved; `target_id` is used
    /// when every attempt failed.
    pub fn from_result(
        address: &str,
        target_id: &str,
        started_at: DateTime<Utc>,
        result: crate::Result<CrawlAttemptResult>,
    ) -> Self {
        let target_id = match &result {
            Ok(result) => result.target_id.clone(),
            Err(_) => target_id.to_string(),
        };
        let (status, result, error) = match result {
            Ok(result) if result.success => (OutcomeStatus::Retrieved, Some(result), None),
            Ok(result) => (OutcomeStatus::Empty, Some(result), None),
            Err(e) => (OutcomeStatus::Failed, None, Some(e.to_string())),
        };

        Self {
            address: address.to_string(),
            target_id,
            status,
            started_at,
            finished_at: Utc::now(),
            result,
            error,
        }
    }

    /// Number of images stored for this target
    pub fn retrieved_count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.retrieved_paths.len())
    }

    /// Number of item failures for this target
    pub fn failed_count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.failures.len())
    }
}
