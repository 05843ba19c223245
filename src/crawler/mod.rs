//! Crawler module for driving product pages
//!
//! This module contains the per-target crawl lifecycle, including:
//! - The response tap feeding the extraction engine
//! - Navigation, lazy-load scrolling and settling
//! - URL selection and retrieval
//! - Attempt retry and batch runs

mod orchestrator;
mod result;
mod tap;

pub use orchestrator::CrawlOrchestrator;
pub use result::{CrawlAttemptResult, OutcomeStatus, TargetOutcome};
pub use tap::{ResponseTap, TapSummary};
