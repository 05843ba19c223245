//! Galleria: a product gallery image harvester
//!
//! This crate discovers image URLs while a product page loads, canonicalizes them
//! to their high-resolution form, ranks them, and retrieves them to disk with
//! pacing and per-target retry.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod rank;
pub mod retrieve;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Galleria operations
#[derive(Debug, Error)]
pub enum GalleriaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL '{url}': {reason}")]
    Validation { url: String, reason: String },

    #[error("Transient fetch failure for {url}: {message}")]
    TransientFetch { url: String, message: String },

    #[error("Response for {url} exceeds the {limit} byte cap")]
    Oversize { url: String, limit: u64 },

    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Giving up after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        last: Box<GalleriaError>,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Galleria operations
pub type Result<T> = std::result::Result<T, GalleriaError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlAttemptResult, CrawlOrchestrator};
pub use extract::ExtractionEngine;
pub use rank::RankingFilter;
pub use retrieve::RetrievalCoordinator;
pub use state::CrawlState;
pub use url::Canonicalizer;
