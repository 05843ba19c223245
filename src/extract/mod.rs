//! Image URL extraction from response payloads
//!
//! This module contains:
//! - The ordered candidate pattern set compiled from the site profile
//! - The exclusion filter for interface chrome (shared with ranking)
//! - The extraction store keyed by crawl target
//! - The engine tying them together

mod engine;
mod patterns;
mod store;

pub use engine::ExtractionEngine;
pub use patterns::{ExclusionFilter, PatternKind, PatternSet};
pub use store::{ExtractionStore, OrderedSet};
