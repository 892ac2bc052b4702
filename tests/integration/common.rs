use pagescope::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use pagescope::storage::SqliteStorage;
use pagescope::Coordinator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Owner used by most tests
pub const USER: i64 = 1;

/// Creates a test configuration with short timeouts
pub fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            page_timeout_secs: 5,
            link_timeout_secs: 2,
            max_concurrent_link_checks: 4,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
    }
}

/// Coordinator over an in-memory database
pub fn create_coordinator() -> Coordinator {
    Coordinator::with_storage(
        &create_test_config(),
        SqliteStorage::new_in_memory().expect("in-memory storage"),
    )
    .expect("coordinator")
}

/// Serves `body` as an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Answers HEAD probes for `route` with `status`
pub async fn mount_head(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
