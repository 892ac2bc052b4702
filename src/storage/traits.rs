//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::{BrokenLinkInfo, PageProfile};
use crate::state::JobStatus;
use crate::storage::{BrokenLinkRecord, CrawlJob, JobQuery};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every job is owned by a user id; lookups that take an `owner` never return
/// another user's jobs. Terminal writes carry the attempt number they belong to
/// and are ignored if the job has since been reset or restarted.
pub trait Storage {
    // ===== Job Management =====

    /// Creates a queued job and returns its id
    fn create_job(&mut self, owner: i64, url: &str) -> StorageResult<i64>;

    /// Gets a job owned by `owner`
    fn get_job(&self, id: i64, owner: i64) -> StorageResult<CrawlJob>;

    /// Lists one page of jobs and the total number matching the filters
    fn list_jobs(&self, owner: i64, query: &JobQuery) -> StorageResult<(Vec<CrawlJob>, u64)>;

    /// All jobs owned by `owner`, oldest first
    fn list_jobs_for_user(&self, owner: i64) -> StorageResult<Vec<CrawlJob>>;

    /// Moves a job to `running`, stamps `started_at` and returns the new attempt
    fn mark_running(&mut self, id: i64) -> StorageResult<i64>;

    /// Writes the profile and marks the job `completed`
    ///
    /// Returns false (and writes nothing) if `attempt` is no longer the job's
    /// running attempt.
    fn complete_job(
        &mut self,
        id: i64,
        attempt: i64,
        profile: &PageProfile,
        broken_links: u32,
    ) -> StorageResult<bool>;

    /// Completes a running attempt together with its broken links and edges
    ///
    /// All writes happen in one transaction. Returns false (and writes nothing)
    /// if `attempt` is no longer the job's running attempt.
    fn complete_crawl(
        &mut self,
        id: i64,
        attempt: i64,
        profile: &PageProfile,
        broken: &[BrokenLinkInfo],
        internal_targets: &[String],
    ) -> StorageResult<bool>;

    /// Ends a running attempt as `error` or `stopped`
    fn fail_job(
        &mut self,
        id: i64,
        attempt: i64,
        status: JobStatus,
        message: Option<&str>,
    ) -> StorageResult<bool>;

    /// Resets a job to `queued` and clears every result field
    fn reset_job(&mut self, id: i64) -> StorageResult<()>;

    /// Deletes the owned jobs among `ids` with their broken links and edges
    fn delete_jobs(&mut self, ids: &[i64], owner: i64) -> StorageResult<usize>;

    /// Stores the graph-derived fields of a job
    fn update_link_stats(&mut self, id: i64, inbound: u64, is_orphan: bool) -> StorageResult<()>;

    // ===== Broken Links =====

    fn insert_broken_link(
        &mut self,
        job_id: i64,
        url: &str,
        status_code: u16,
        error: Option<&str>,
    ) -> StorageResult<()>;

    fn get_broken_links(&self, job_id: i64) -> StorageResult<Vec<BrokenLinkRecord>>;

    fn delete_broken_links(&mut self, job_id: i64) -> StorageResult<()>;

    // ===== Internal Link Graph =====

    /// Replaces every outgoing edge of a job
    fn replace_internal_links(&mut self, job_id: i64, to_urls: &[String]) -> StorageResult<()>;

    /// Counts edges to `url` from the owner's jobs other than `excluding_job`
    fn count_inbound(&self, url: &str, excluding_job: i64, owner: i64) -> StorageResult<u64>;
}
