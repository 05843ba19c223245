//! Configuration module for Galleria
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; an absent file means `Config::default()`.
//!
//! # Example
//!
//! ```no_run
//! use galleria::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("galleria.toml")).unwrap();
//! println!("Retry cap: {}", config.crawl.retry_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, Config, CrawlConfig, ProxyConfig, RetrievalConfig, SiteProfile};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
