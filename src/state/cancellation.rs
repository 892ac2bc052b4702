//! Per-job cancellation registry
//!
//! Every running crawl owns a `CancellationToken` registered under its job id.
//! Stop requests look the token up and cancel it; the crawl task polls the token
//! at its checkpoints. Cancellation is cooperative: requests already on the wire
//! are not aborted.
//!
//! The registry is an ordinary value shared through an `Arc`; there is no
//! process-global map.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Handle held by a running crawl task
#[derive(Debug, Clone)]
pub struct JobSignal {
    job_id: i64,
    generation: u64,
    token: CancellationToken,
}

impl JobSignal {
    /// The job this signal belongs to
    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    /// Registration generation, used to unregister only this registration
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-blocking check for a pending stop request
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    token: CancellationToken,
}

/// Thread-safe map of job id to cancellation token
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    entries: DashMap<i64, Entry>,
    next_generation: AtomicU64,
}

impl CancellationRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh token for a job and returns the task's handle
    ///
    /// A previous registration for the same job is replaced. It is not cancelled:
    /// whoever superseded it (a re-run) has already signalled it if needed.
    pub fn register(&self, job_id: i64) -> JobSignal {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        self.entries.insert(
            job_id,
            Entry {
                generation,
                token: token.clone(),
            },
        );

        JobSignal {
            job_id,
            generation,
            token,
        }
    }

    /// Delivers a stop signal to a job
    ///
    /// Returns `true` if the signal was delivered, `false` if the job has no
    /// registration or was already signalled. A duplicate stop is dropped
    /// silently; it is not an error.
    pub fn signal(&self, job_id: i64) -> bool {
        // get_mut holds the shard write lock, so concurrent signals serialize here
        match self.entries.get_mut(&job_id) {
            Some(entry) if !entry.token.is_cancelled() => {
                entry.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Removes a job's registration if it still belongs to `generation`
    ///
    /// Returns true if an entry was removed. A newer registration for the same
    /// job id is left untouched.
    pub fn unregister(&self, job_id: i64, generation: u64) -> bool {
        self.entries
            .remove_if(&job_id, |_, entry| entry.generation == generation)
            .is_some()
    }

    /// Removes a job's registration regardless of generation (used when a job
    /// record is deleted)
    pub fn remove(&self, job_id: i64) -> bool {
        self.entries.remove(&job_id).is_some()
    }

    /// Returns true if the job currently has a registration
    pub fn is_registered(&self, job_id: i64) -> bool {
        self.entries.contains_key(&job_id)
    }

    /// Number of registered jobs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no job is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
