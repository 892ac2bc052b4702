//! Crawler coordinator - crawl job orchestration
//!
//! This module owns the job lifecycle:
//! - Creating jobs and moving them through `queued -> running -> terminal`
//! - Running each crawl as an independent tokio task
//! - Delivering stop requests through the cancellation registry
//! - Persisting results and refreshing the owner's link graph
//!
//! Storage is shared as `Arc<Mutex<SqliteStorage>>`; the lock is only ever taken
//! in synchronous sections and never held across an `.await`.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::graph::recompute_orphans;
use crate::crawler::health::{check_links, BrokenLinkInfo, HttpProbe, LinkProbe};
use crate::crawler::links::{extract_links, internal_targets, LinkRecord};
use crate::crawler::login::has_login_form;
use crate::crawler::profile::{extract_profile, PageProfile};
use crate::crawler::{build_http_client, fetch_document};
use crate::markup::Document;
use crate::state::{CancellationRegistry, JobSignal, JobStatus};
use crate::storage::{
    open_storage, BrokenLinkRecord, CrawlJob, JobQuery, SqliteStorage, Storage, StorageError,
    StorageResult,
};
use crate::url::normalize_target;
use crate::{CrawlError, PagescopeError, Result};
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use url::Url;

/// Everything a single parse of the page yields
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub profile: PageProfile,
    pub links: Vec<LinkRecord>,
}

/// Result of a crawl that ran to the end without being cancelled
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub profile: PageProfile,
    pub broken_links: Vec<BrokenLinkInfo>,
    pub internal_targets: Vec<String>,
}

/// Parses the body once and runs every extractor over the same tree
///
/// The parsed tree is not `Send`, so it never outlives this call; only owned
/// results cross into async code.
pub fn analyze_document(body: &[u8], base_url: &Url) -> PageAnalysis {
    let document = Document::parse(body);

    let mut profile = extract_profile(&document);
    profile.has_login_form = has_login_form(document.root());
    let links = extract_links(&document, base_url);

    PageAnalysis { profile, links }
}

/// Main crawler coordinator structure
///
/// Cheap to clone; clones share storage, client and cancellation registry.
#[derive(Clone)]
pub struct Coordinator {
    storage: Arc<Mutex<SqliteStorage>>,
    client: Client,
    probe: Arc<dyn LinkProbe>,
    registry: Arc<CancellationRegistry>,
    config: Arc<CrawlerConfig>,
}

impl Coordinator {
    /// Opens the configured database and builds the HTTP client
    pub fn new(config: &Config) -> Result<Self> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Self::with_storage(config, storage)
    }

    /// Builds a coordinator over an already opened storage backend
    pub fn with_storage(config: &Config, storage: SqliteStorage) -> Result<Self> {
        let client = build_http_client(&config.user_agent)?;
        let probe = Arc::new(HttpProbe::new(client.clone()));
        Ok(Self::from_parts(storage, client, probe, config.crawler.clone()))
    }

    /// Assembles a coordinator from explicit parts
    pub fn from_parts(
        storage: SqliteStorage,
        client: Client,
        probe: Arc<dyn LinkProbe>,
        config: CrawlerConfig,
    ) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            client,
            probe,
            registry: Arc::new(CancellationRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// The registry shared with every crawl task
    pub fn registry(&self) -> &Arc<CancellationRegistry> {
        &self.registry
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }

    // ===== Job Service =====

    /// Creates a queued job for `url`
    ///
    /// A missing scheme is completed with `https://`.
    pub fn enqueue(&self, owner: i64, url: &str) -> Result<CrawlJob> {
        let target = normalize_target(url)?;

        let mut storage = self.lock()?;
        let id = storage.create_job(owner, target.as_str())?;
        recompute_orphans(&mut *storage, owner)?;

        tracing::info!("Queued job {} for {}", id, target);
        Ok(storage.get_job(id, owner)?)
    }

    /// Starts a queued or failed job and returns the handle of its task
    pub fn start(&self, id: i64, owner: i64) -> Result<JoinHandle<()>> {
        let (url, attempt, signal) = {
            let mut storage = self.lock()?;
            let job = storage.get_job(id, owner)?;
            if !job.status.can_start() {
                return Err(PagescopeError::InvalidTransition {
                    job_id: id,
                    from: job.status,
                    to: JobStatus::Running,
                });
            }

            let attempt = storage.mark_running(id)?;
            let signal = self.registry.register(id);
            (job.url, attempt, signal)
        };

        let coordinator = self.clone();
        Ok(tokio::spawn(async move {
            coordinator.run_job(id, owner, url, attempt, signal).await;
        }))
    }

    /// Sends a stop signal to a running job
    ///
    /// Returns false if the signal was not delivered (already signalled, or the
    /// task has already unregistered).
    pub fn stop(&self, id: i64, owner: i64) -> Result<bool> {
        let job = self.lock()?.get_job(id, owner)?;
        if !job.status.can_stop() {
            return Err(PagescopeError::InvalidTransition {
                job_id: id,
                from: job.status,
                to: JobStatus::Stopped,
            });
        }

        let delivered = self.registry.signal(id);
        if delivered {
            tracing::info!("Stop requested for job {}", id);
        } else {
            tracing::debug!("Stop for job {} dropped, already signalled", id);
        }
        Ok(delivered)
    }

    /// Resets the owned jobs among `ids` to `queued`, stopping running ones
    ///
    /// Returns the number of jobs reset.
    pub fn rerun(&self, ids: &[i64], owner: i64) -> Result<usize> {
        let mut storage = self.lock()?;
        let mut count = 0;

        for &id in ids {
            let job = match storage.get_job(id, owner) {
                Ok(job) => job,
                Err(StorageError::JobNotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            if job.status == JobStatus::Running {
                self.registry.signal(id);
            }

            storage.reset_job(id)?;
            storage.delete_broken_links(id)?;
            count += 1;
        }

        tracing::info!("Queued {} jobs for re-run", count);
        Ok(count)
    }

    /// Deletes the owned jobs among `ids` and refreshes the owner's link graph
    pub fn delete(&self, ids: &[i64], owner: i64) -> Result<usize> {
        let mut storage = self.lock()?;

        let owned: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|&id| storage.get_job(id, owner).is_ok())
            .collect();

        let deleted = storage.delete_jobs(&owned, owner)?;
        for id in owned {
            self.registry.signal(id);
            self.registry.remove(id);
        }

        recompute_orphans(&mut *storage, owner)?;

        tracing::info!("Deleted {} jobs", deleted);
        Ok(deleted)
    }

    /// A job together with its broken links
    pub fn job_details(&self, id: i64, owner: i64) -> Result<(CrawlJob, Vec<BrokenLinkRecord>)> {
        let storage = self.lock()?;
        let job = storage.get_job(id, owner)?;
        let broken = storage.get_broken_links(id)?;
        Ok((job, broken))
    }

    /// One page of the owner's jobs and the total matching count
    pub fn list_jobs(&self, owner: i64, query: &JobQuery) -> Result<(Vec<CrawlJob>, u64)> {
        Ok(self.lock()?.list_jobs(owner, query)?)
    }

    // ===== Crawl Task =====

    async fn run_job(&self, id: i64, owner: i64, url: String, attempt: i64, signal: JobSignal) {
        tracing::info!("Starting crawl for {} (job {}, attempt {})", url, id, attempt);

        let outcome = self.perform_crawl(&url, &signal).await;
        if let Err(e) = self.finish_job(id, owner, attempt, outcome, &signal) {
            tracing::error!("Failed to record result of job {}: {}", id, e);
        }

        self.registry.unregister(id, signal.generation());
    }

    /// Fetches, analyzes and link-checks one page
    ///
    /// Cancellation is checked on entry, before link analysis and before the
    /// result is handed back for persistence.
    pub async fn perform_crawl(
        &self,
        url: &str,
        signal: &JobSignal,
    ) -> std::result::Result<CrawlOutcome, CrawlError> {
        if signal.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        // Links resolve against the job's target, even after a redirect
        let base_url =
            Url::parse(url).map_err(|e| CrawlError::Parse(format!("{}: {}", url, e)))?;

        let fetched = fetch_document(&self.client, url, self.config.page_timeout()).await?;
        if fetched.final_url != base_url.as_str() {
            tracing::debug!("{} redirected to {}", url, fetched.final_url);
        }

        let PageAnalysis { mut profile, links } = analyze_document(&fetched.body, &base_url);

        if signal.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let health = check_links(
            Arc::clone(&self.probe),
            &links,
            self.config.max_concurrent_link_checks,
            self.config.link_timeout(),
            signal,
        )
        .await?;

        profile.internal_links = health.internal_links;
        profile.external_links = health.external_links;

        if signal.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        Ok(CrawlOutcome {
            profile,
            broken_links: health.broken,
            internal_targets: internal_targets(&links),
        })
    }

    fn finish_job(
        &self,
        id: i64,
        owner: i64,
        attempt: i64,
        outcome: std::result::Result<CrawlOutcome, CrawlError>,
        signal: &JobSignal,
    ) -> StorageResult<()> {
        let mut storage = self.lock()?;

        match outcome {
            Ok(outcome) => {
                let applied = storage.complete_crawl(
                    id,
                    attempt,
                    &outcome.profile,
                    &outcome.broken_links,
                    &outcome.internal_targets,
                )?;
                if !applied {
                    tracing::debug!("Job {} attempt {} superseded, result dropped", id, attempt);
                    return Ok(());
                }

                recompute_orphans(&mut *storage, owner)?;

                tracing::info!(
                    "Crawl completed for job {} - Title: {}, Internal: {}, External: {}, Broken: {}",
                    id,
                    outcome.profile.page_title,
                    outcome.profile.internal_links,
                    outcome.profile.external_links,
                    outcome.broken_links.len()
                );
            }
            Err(e) => {
                let status = if signal.is_cancelled() {
                    tracing::info!("Crawl cancelled for job {}", id);
                    JobStatus::Stopped
                } else {
                    tracing::warn!("Crawl failed for job {}: {}", id, e);
                    JobStatus::Error
                };

                let message = e.to_string();
                storage.fail_job(id, attempt, status, Some(&message))?;
            }
        }

        Ok(())
    }
}
