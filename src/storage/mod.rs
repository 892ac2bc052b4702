//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Crawl job lifecycle and page profile persistence
//! - Broken link records per job
//! - Internal link edges used for orphan detection

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::PageProfile;
use crate::state::JobStatus;
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A crawl job as stored in the database
///
/// Profile fields are only meaningful when `status` is `Completed`; otherwise
/// they are empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlJob {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
    pub status: JobStatus,

    /// Incremented every time the job enters `running`
    pub attempt: i64,

    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,

    #[serde(flatten)]
    pub profile: PageProfile,

    pub broken_links: u32,
    pub inbound_internal_links: u32,
    pub is_orphan: bool,
}

/// A link that failed its health check during a job's crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkRecord {
    pub id: i64,
    pub job_id: i64,
    pub url: String,
    pub status_code: u16,
    pub error: Option<String>,
    pub created_at: String,
}

/// Sortable job columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Url,
    Status,
    PageTitle,
    StartedAt,
    CompletedAt,
}

impl SortField {
    /// Column name, from a fixed whitelist
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Url => "url",
            Self::Status => "status",
            Self::PageTitle => "page_title",
            Self::StartedAt => "started_at",
            Self::CompletedAt => "completed_at",
        }
    }

    /// Parses a column name; anything outside the whitelist is rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "url" => Some(Self::Url),
            "status" => Some(Self::Status),
            "page_title" => Some(Self::PageTitle),
            "started_at" => Some(Self::StartedAt),
            "completed_at" => Some(Self::CompletedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses `asc`/`desc` (any case)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Paging, sorting and filtering for job listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    page: u32,
    limit: u32,
    pub sort_by: SortField,
    pub order: SortOrder,

    /// Substring matched against the URL or page title
    pub search: Option<String>,

    pub status: Option<JobStatus>,
}

impl JobQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Sets the 1-based page number; 0 is treated as 1
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size; values outside 1..=100 fall back to the default
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = if (1..=Self::MAX_LIMIT).contains(&limit) {
            limit
        } else {
            Self::DEFAULT_LIMIT
        };
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            search: None,
            status: None,
        }
    }
}
