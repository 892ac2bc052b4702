use crate::common::{create_coordinator, create_test_config, mount_page, USER};
use async_trait::async_trait;
use pagescope::crawler::{build_http_client, LinkProbe};
use pagescope::storage::SqliteStorage;
use pagescope::{Coordinator, JobStatus, PagescopeError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Link probe that parks until the test releases it
///
/// Lets a test act while the crawl sits between fetch and persistence.
struct GatedProbe {
    reached: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl LinkProbe for GatedProbe {
    async fn head(&self, _url: &str, _timeout: Duration) -> Result<u16, String> {
        self.reached.notify_one();
        self.release.notified().await;
        Ok(200)
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<u16, String> {
        self.head(url, timeout).await
    }
}

fn gated_coordinator() -> (Coordinator, Arc<Notify>, Arc<Notify>) {
    let config = create_test_config();
    let reached = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let probe = GatedProbe {
        reached: Arc::clone(&reached),
        release: Arc::clone(&release),
    };

    let coordinator = Coordinator::from_parts(
        SqliteStorage::new_in_memory().unwrap(),
        build_http_client(&config.user_agent).unwrap(),
        Arc::new(probe),
        config.crawler,
    );
    (coordinator, reached, release)
}

#[tokio::test]
async fn test_stop_after_fetch_leaves_no_profile() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Should not be stored</title><h1>x</h1><a href="/next">next</a>"#.to_string(),
    )
    .await;

    let (coordinator, reached, release) = gated_coordinator();
    let job = coordinator.enqueue(USER, &server.uri()).unwrap();
    let handle = coordinator.start(job.id, USER).unwrap();

    // The page has been fetched and parsed; link analysis is in progress
    reached.notified().await;
    assert_eq!(
        coordinator.job_details(job.id, USER).unwrap().0.status,
        JobStatus::Running
    );
    assert!(coordinator.stop(job.id, USER).unwrap());
    assert!(!coordinator.stop(job.id, USER).unwrap());
    release.notify_one();

    handle.await.unwrap();

    let (job, broken) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(job.status, JobStatus::Stopped);
    assert!(job.completed_at.is_some());
    assert!(job.profile.page_title.is_empty());
    assert_eq!(job.profile.h1_count, 0);
    assert_eq!(job.profile.internal_links, 0);
    assert!(broken.is_empty());
    assert!(!coordinator.registry().is_registered(job.id));
}

#[tokio::test]
async fn test_rerun_supersedes_running_attempt() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Fresh</title><a href="/next">next</a>"#.to_string(),
    )
    .await;

    let (coordinator, reached, release) = gated_coordinator();
    let job = coordinator.enqueue(USER, &server.uri()).unwrap();
    let first = coordinator.start(job.id, USER).unwrap();
    reached.notified().await;

    // Re-run while the first attempt is parked in link analysis
    assert_eq!(coordinator.rerun(&[job.id], USER).unwrap(), 1);
    release.notify_one();
    first.await.unwrap();

    // The old attempt must not have overwritten the reset
    let (queued, _) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(queued.status, JobStatus::Queued);
    assert!(queued.error_message.is_none());

    let second = coordinator.start(job.id, USER).unwrap();
    reached.notified().await;
    release.notify_one();
    second.await.unwrap();

    let (done, _) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.attempt, 2);
    assert_eq!(done.profile.page_title, "Fresh");
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/next">next</a>"#.to_string()).await;

    let (coordinator, reached, release) = gated_coordinator();
    let job = coordinator.enqueue(USER, &server.uri()).unwrap();
    let handle = coordinator.start(job.id, USER).unwrap();

    let err = coordinator.start(job.id, USER).unwrap_err();
    assert!(matches!(
        err,
        PagescopeError::InvalidTransition {
            from: JobStatus::Running,
            ..
        }
    ));

    reached.notified().await;
    release.notify_one();
    handle.await.unwrap();

    // Completed jobs need a re-run before they can start again
    assert!(matches!(
        coordinator.start(job.id, USER),
        Err(PagescopeError::InvalidTransition {
            from: JobStatus::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_delete_removes_job() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<title>x</title>".to_string()).await;

    let coordinator = create_coordinator();
    let job = coordinator.enqueue(USER, &server.uri()).unwrap();
    coordinator.start(job.id, USER).unwrap().await.unwrap();

    assert_eq!(coordinator.delete(&[job.id], 2).unwrap(), 0);
    assert_eq!(coordinator.delete(&[job.id], USER).unwrap(), 1);
    assert!(coordinator.job_details(job.id, USER).is_err());
}

#[tokio::test]
async fn test_stop_during_failed_fetch_records_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let coordinator = create_coordinator();
    let job = coordinator.enqueue(USER, &server.uri()).unwrap();
    let handle = coordinator.start(job.id, USER).unwrap();

    // Wait until the page request is in flight
    loop {
        let seen = server.received_requests().await.unwrap_or_default();
        if !seen.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(coordinator.stop(job.id, USER).unwrap());

    handle.await.unwrap();

    let (job, broken) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(job.status, JobStatus::Stopped);
    assert_eq!(job.error_message.as_deref(), Some("HTTP error: 500"));
    assert!(job.completed_at.is_some());
    assert!(broken.is_empty());
}
