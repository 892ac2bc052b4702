//! Output module for presenting crawl jobs
//!
//! This module handles:
//! - Plain-text tables and job reports for the terminal
//! - JSON documents for scripting (`--json`)

mod text;

pub use text::{format_job_details, format_job_table};

use crate::storage::{BrokenLinkRecord, CrawlJob};
use serde::Serialize;

#[derive(Serialize)]
struct JobPage<'a> {
    jobs: &'a [CrawlJob],
    total: u64,
    page: u32,
    limit: u32,
}

#[derive(Serialize)]
struct JobReport<'a> {
    job: &'a CrawlJob,
    broken_links: &'a [BrokenLinkRecord],
}

/// Serializes one page of jobs with its paging information
pub fn job_page_json(
    jobs: &[CrawlJob],
    total: u64,
    page: u32,
    limit: u32,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JobPage {
        jobs,
        total,
        page,
        limit,
    })
}

/// Serializes a job and its broken links
pub fn job_details_json(job: &CrawlJob, broken: &[BrokenLinkRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JobReport {
        job,
        broken_links: broken,
    })
}
