use crate::common::{create_coordinator, mount_page, USER};
use pagescope::storage::JobQuery;
use pagescope::JobStatus;
use wiremock::MockServer;

#[tokio::test]
async fn test_orphan_detection_across_jobs() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/a", r#"<a href="/b">B</a>"#.to_string()).await;
    mount_page(&server, "/b", "<p>no links</p>".to_string()).await;
    mount_page(&server, "/c", "<p>nobody links here</p>".to_string()).await;

    let coordinator = create_coordinator();
    let mut ids = Vec::new();
    for page in ["a", "b", "c"] {
        let job = coordinator
            .enqueue(USER, &format!("{}/{}", base_url, page))
            .unwrap();
        ids.push(job.id);
    }
    for &id in &ids {
        coordinator.start(id, USER).unwrap().await.unwrap();
    }

    let (a, _) = coordinator.job_details(ids[0], USER).unwrap();
    let (b, _) = coordinator.job_details(ids[1], USER).unwrap();
    let (c, _) = coordinator.job_details(ids[2], USER).unwrap();

    assert_eq!(a.status, JobStatus::Completed);
    assert!(b.inbound_internal_links >= 1);
    assert!(!b.is_orphan);
    assert_eq!(c.inbound_internal_links, 0);
    assert!(c.is_orphan);
    assert!(a.is_orphan);
}

#[tokio::test]
async fn test_other_users_do_not_link_in() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_page(&server, "/a", r#"<a href="/b">B</a>"#.to_string()).await;

    let coordinator = create_coordinator();
    let theirs = coordinator
        .enqueue(2, &format!("{}/a", base_url))
        .unwrap();
    let mine = coordinator
        .enqueue(USER, &format!("{}/b", base_url))
        .unwrap();

    coordinator.start(theirs.id, 2).unwrap().await.unwrap();

    let (mine, _) = coordinator.job_details(mine.id, USER).unwrap();
    assert!(mine.is_orphan);

    let (jobs, total) = coordinator.list_jobs(USER, &JobQuery::default()).unwrap();
    assert_eq!(total, 1);
    assert_eq!(jobs[0].id, mine.id);
}
