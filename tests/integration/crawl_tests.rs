use crate::common::{create_coordinator, mount_head, mount_page, USER};
use pagescope::JobStatus;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_profile_and_broken_links() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let port = url::Url::parse(&base_url)
        .expect("Failed to parse base URL")
        .port()
        .expect("mock server port");

    // "localhost" is a different host string than 127.0.0.1, so these links
    // count as external while still reaching the mock server
    let page = format!(
        r#"<!DOCTYPE html>
        <html><head>
            <title>  Home Page  </title>
            <meta name="description" content="Fallback">
            <meta property="og:description" content="Open Graph description">
            <link rel="canonical" href="{base}/canonical">
            <script type="application/ld+json">{{"@type":"WebSite"}}</script>
        </head><body>
            <h1>Welcome</h1><h2>A</h2><h2>B</h2>
            <img src="/hero.png">
            <img src="/logo.png" alt="Logo">
            <a href="/ok">OK</a>
            <a href="/missing">Missing</a>
            <a href="http://localhost:{port}/ext">External</a>
            <a href="http://127.0.0.1:1/closed">Closed port</a>
            <a href="mailto:team@example.com">Mail</a>
            <form><input type="password" name="pw"><button>Sign in</button></form>
        </body></html>"#,
        base = base_url,
        port = port
    );

    mount_page(&server, "/", page).await;
    mount_head(&server, "/ok", 200).await;
    mount_head(&server, "/ext", 200).await;
    // Unmatched requests (/missing) get wiremock's default 404

    let coordinator = create_coordinator();
    let job = coordinator.enqueue(USER, &base_url).unwrap();
    coordinator.start(job.id, USER).unwrap().await.unwrap();

    let (job, broken) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(job.status, JobStatus::Completed, "error: {:?}", job.error_message);
    assert_eq!(job.attempt, 1);
    assert!(job.error_message.is_none());
    assert!(job.completed_at.is_some());

    let profile = &job.profile;
    assert_eq!(profile.html_version, "HTML5");
    assert_eq!(profile.page_title, "Home Page");
    assert_eq!(profile.h1_count, 1);
    assert_eq!(profile.h2_count, 2);
    assert_eq!(profile.meta_description, "Open Graph description");
    assert_eq!(profile.canonical, format!("{}/canonical", base_url));
    assert_eq!(profile.images_missing_alt, vec!["/hero.png".to_string()]);
    assert!(profile.has_jsonld);
    assert_eq!(profile.jsonld_snippet, r#"{"@type":"WebSite"}"#);
    assert!(profile.has_login_form);
    assert_eq!(profile.internal_links, 2);
    assert_eq!(profile.external_links, 2);

    assert_eq!(job.broken_links, 2);
    let mut broken = broken;
    broken.sort_by(|a, b| a.url.cmp(&b.url));
    assert_eq!(broken[0].url, "http://127.0.0.1:1/closed");
    assert_eq!(broken[0].status_code, 0);
    assert!(broken[0].error.is_some());
    assert_eq!(broken[1].url, format!("{}/missing", base_url));
    assert_eq!(broken[1].status_code, 404);
}

#[tokio::test]
async fn test_head_failure_falls_back_to_get() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", r#"<a href="/flaky">Flaky</a>"#.to_string()).await;
    // HEAD answers slower than the link timeout, GET answers at once
    Mock::given(method("HEAD"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let coordinator = create_coordinator();
    let job = coordinator.enqueue(USER, &base_url).unwrap();
    coordinator.start(job.id, USER).unwrap().await.unwrap();

    let (job, broken) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].status_code, 410);
}

#[tokio::test]
async fn test_fetch_404_ends_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let coordinator = create_coordinator();
    let job = coordinator
        .enqueue(USER, &format!("{}/gone", server.uri()))
        .unwrap();
    coordinator.start(job.id, USER).unwrap().await.unwrap();

    let (job, broken) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error_message.as_deref(), Some("HTTP error: 404"));
    assert!(job.completed_at.is_some());
    assert!(job.profile.page_title.is_empty());
    assert!(broken.is_empty());
}

#[tokio::test]
async fn test_error_job_can_be_started_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<title>Back</title>".to_string()).await;

    let coordinator = create_coordinator();
    let job = coordinator.enqueue(USER, &server.uri()).unwrap();

    coordinator.start(job.id, USER).unwrap().await.unwrap();
    let (failed, _) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(failed.status, JobStatus::Error);

    coordinator.start(job.id, USER).unwrap().await.unwrap();
    let (done, _) = coordinator.job_details(job.id, USER).unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.attempt, 2);
    assert_eq!(done.profile.page_title, "Back");
    assert!(done.error_message.is_none());
}

#[tokio::test]
async fn test_links_resolve_against_target_after_redirect() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let port = url::Url::parse(&base_url)
        .expect("Failed to parse base URL")
        .port()
        .expect("mock server port");

    // The page moves to another host string; its links still point home
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("http://localhost:{}/a2", port).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/a2",
        format!(r#"<a href="{}/b">B</a><a href="/c">C</a>"#, base_url),
    )
    .await;
    mount_page(&server, "/b", "<p>b</p>".to_string()).await;
    mount_head(&server, "/b", 200).await;
    mount_head(&server, "/c", 200).await;

    let coordinator = create_coordinator();
    let a = coordinator
        .enqueue(USER, &format!("{}/a", base_url))
        .unwrap();
    let b = coordinator
        .enqueue(USER, &format!("{}/b", base_url))
        .unwrap();
    coordinator.start(a.id, USER).unwrap().await.unwrap();

    let (a, broken) = coordinator.job_details(a.id, USER).unwrap();
    assert_eq!(a.status, JobStatus::Completed, "error: {:?}", a.error_message);
    assert_eq!(a.profile.internal_links, 2);
    assert_eq!(a.profile.external_links, 0);
    assert!(broken.is_empty());

    let (b, _) = coordinator.job_details(b.id, USER).unwrap();
    assert_eq!(b.inbound_internal_links, 1);
    assert!(!b.is_orphan);
}
