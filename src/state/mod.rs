//! State module for tracking crawl progress
//!
//! This module provides the per-target lifecycle used by the orchestrator.
//!
//! # Components
//!
//! - `CrawlState`: the states a target moves through
//! - `StateTracker`: validated transitions plus the path taken

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlState, StateTracker};
