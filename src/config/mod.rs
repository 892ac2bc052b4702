//! Configuration module for Pagescope
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pagescope::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagescope.toml")).unwrap();
//! println!("Link checks in flight: {}", config.crawler.max_concurrent_link_checks);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default};
