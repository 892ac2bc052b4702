//! Pagescope: single-page crawl and audit engine
//!
//! This crate fetches one URL per crawl job, parses its markup, extracts a page
//! profile (title, headings, metadata, structured data), classifies and checks
//! every outbound link, detects login forms, and tracks internal links across a
//! user's jobs to flag orphan pages.

pub mod config;
pub mod crawler;
pub mod markup;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Pagescope operations
#[derive(Debug, Error)]
pub enum PagescopeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid state transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: i64,
        from: state::JobStatus,
        to: state::JobStatus,
    },

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
}

/// Failure to retrieve a document over HTTP
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("failed to fetch URL: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Reasons a single crawl run ends without a result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Markup parsing never fails; this covers input that cannot be crawled at all,
    /// such as an unparseable target URL.
    #[error("failed to parse {0}")]
    Parse(String),

    #[error("crawl cancelled")]
    Cancelled,
}

/// Result type alias for Pagescope operations
pub type Result<T> = std::result::Result<T, PagescopeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, PageProfile};
pub use state::{CancellationRegistry, JobStatus};
pub use storage::{CrawlJob, SqliteStorage, Storage};
