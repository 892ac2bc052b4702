//! Cross-crawl internal link graph
//!
//! Each completed crawl stores the internal links found on its page as edges
//! `(from_job, to_url)` through `Storage::complete_crawl`. A job is an orphan
//! when no *other* job of the same user links to its URL.

use crate::storage::{Storage, StorageResult};

/// Recomputes inbound counts and orphan flags for every job of `owner`
///
/// Returns the number of orphaned jobs.
pub fn recompute_orphans<S: Storage + ?Sized>(storage: &mut S, owner: i64) -> StorageResult<usize> {
    let jobs = storage.list_jobs_for_user(owner)?;
    let mut orphans = 0;

    for job in &jobs {
        let inbound = storage.count_inbound(&job.url, job.id, owner)?;
        let is_orphan = inbound == 0;
        if is_orphan {
            orphans += 1;
        }
        storage.update_link_stats(job.id, inbound, is_orphan)?;
    }

    tracing::debug!(
        "Recomputed link graph for user {}: {} jobs, {} orphans",
        owner,
        jobs.len(),
        orphans
    );

    Ok(orphans)
}
