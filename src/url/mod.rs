//! URL handling module for Galleria
//!
//! This module provides canonicalization of CDN image URLs, size marker
//! parsing, CDN host matching, target id derivation and file name sanitizing.

mod canonical;
mod domain;
mod markers;
mod matcher;
mod target;

// Re-export main functions
pub use canonical::Canonicalizer;
pub use domain::{extract_host, is_cdn_url};
pub use markers::{find_markers, parse_marker, size_rank, strip_markers, SizeMarker};
pub use matcher::matches_wildcard;
pub use target::{extract_target_id, sanitize_filename, target_id_from_payload, UNKNOWN_TARGET};
