//! Link health checking
//!
//! Every extracted link is probed with a HEAD request, falling back to a single
//! GET when the HEAD request fails at the transport level. A link is broken when
//! the final status is 400 or above, or when both requests fail (recorded with
//! status 0 and the error text).
//!
//! Probes run as tokio tasks gated by a semaphore; results flow back through a
//! `JoinSet` to the one loop that owns the accumulator.

use super::links::LinkRecord;
use crate::state::JobSignal;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Network side of a link check
///
/// Both methods return the HTTP status code, or the error text if no response
/// was received.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, String>;

    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, String>;
}

/// `LinkProbe` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, String> {
        self.client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| e.to_string())
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, String> {
        self.client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| e.to_string())
    }
}

/// A link that failed its health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkInfo {
    pub url: String,

    /// Final HTTP status, or 0 when no response was received
    pub status_code: u16,

    /// Transport error text when no response was received
    pub error: Option<String>,
}

/// Aggregate result of checking one page's links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkHealth {
    pub internal_links: u32,
    pub external_links: u32,

    /// Broken links in completion order
    pub broken: Vec<BrokenLinkInfo>,
}

/// Probes a single link, returning the failure if it is broken
pub async fn probe_link(
    probe: &dyn LinkProbe,
    url: &str,
    timeout: Duration,
) -> Option<BrokenLinkInfo> {
    let outcome = match probe.head(url, timeout).await {
        Ok(status) => Ok(status),
        Err(head_error) => {
            tracing::debug!("HEAD {} failed ({}), retrying with GET", url, head_error);
            probe.get(url, timeout).await
        }
    };

    match outcome {
        Ok(status) if status >= 400 => Some(BrokenLinkInfo {
            url: url.to_string(),
            status_code: status,
            error: None,
        }),
        Ok(_) => None,
        Err(error) => Some(BrokenLinkInfo {
            url: url.to_string(),
            status_code: 0,
            error: Some(error),
        }),
    }
}

/// Checks all links with at most `max_in_flight` probes outstanding
///
/// # Cancellation
///
/// The signal is checked before each dispatch and again by each worker once it
/// holds a permit. If cancellation is observed, dispatch stops, results of
/// probes already on the wire are discarded and `CrawlError::Cancelled` is
/// returned.
pub async fn check_links(
    probe: Arc<dyn LinkProbe>,
    links: &[LinkRecord],
    max_in_flight: usize,
    timeout: Duration,
    signal: &JobSignal,
) -> Result<LinkHealth, CrawlError> {
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut workers = JoinSet::new();
    let mut health = LinkHealth::default();

    for link in links {
        if signal.is_cancelled() {
            break;
        }

        if link.is_internal {
            health.internal_links += 1;
        } else {
            health.external_links += 1;
        }

        let probe = Arc::clone(&probe);
        let semaphore = Arc::clone(&semaphore);
        let signal = signal.clone();
        let url = link.url.clone();

        workers.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            if signal.is_cancelled() {
                return None;
            }
            probe_link(probe.as_ref(), &url, timeout).await
        });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Some(broken)) => {
                tracing::warn!(
                    "Broken link {} (status {}{})",
                    broken.url,
                    broken.status_code,
                    broken
                        .error
                        .as_deref()
                        .map(|e| format!(", {}", e))
                        .unwrap_or_default()
                );
                health.broken.push(broken);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Link check task failed: {}", e),
        }
    }

    if signal.is_cancelled() {
        tracing::info!("Link check for job {} cancelled", signal.job_id());
        return Err(CrawlError::Cancelled);
    }

    Ok(health)
}
