//! State module for tracking crawl job lifecycles
//!
//! # Components
//!
//! - `JobStatus`: lifecycle of a crawl job (queued, running, completed, error, stopped)
//! - `CancellationRegistry`: per-job cancellation tokens shared between the job
//!   service and the running crawl tasks

mod cancellation;
mod job_status;

// Re-export main types
pub use cancellation::{CancellationRegistry, JobSignal};
pub use job_status::JobStatus;
