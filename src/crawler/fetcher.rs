//! HTTP fetcher implementation
//!
//! This module handles the page request for a crawl job:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests for the crawled page, with a per-request timeout
//! - Error classification into `FetchError`
//!
//! There are no retries. Only an exact `200 OK` is accepted.

use crate::config::UserAgentConfig;
use crate::FetchError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Maximum number of redirects followed for any request
pub const MAX_REDIRECTS: usize = 10;

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final URL after redirects
    pub final_url: String,

    /// Raw response body
    pub body: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// Timeouts are applied per request (page fetches and link probes use different
/// limits), so the client itself only carries a connect timeout.
///
/// # Example
///
/// ```no_run
/// use pagescope::config::UserAgentConfig;
/// use pagescope::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body
///
/// # Outcomes
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 200 | `Ok(FetchedDocument)` |
/// | Any other status | `FetchError::Status(code)` |
/// | Timeout elapsed | `FetchError::Timeout` |
/// | Connection/TLS/redirect failure | `FetchError::Transport` |
/// | Body could not be read | `FetchError::Body` |
pub async fn fetch_document(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<FetchedDocument, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status.as_u16()));
    }

    let final_url = response.url().to_string();

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Body(e.to_string())
        }
    })?;

    tracing::debug!("Fetched {} ({} bytes)", final_url, body.len());

    Ok(FetchedDocument {
        final_url,
        body: body.to_vec(),
    })
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_ok_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header(
                "user-agent",
                "TestCrawler/1.0 (+https://example.com/about; admin@example.com)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Hi</title>"))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let url = format!("{}/page", server.uri());
        let doc = fetch_document(&client, &url, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(doc.body, b"<title>Hi</title>");
        assert_eq!(doc.final_url, url);
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();

        let err = fetch_document(&client, &format!("{}/missing", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(404));
        assert_eq!(err.to_string(), "HTTP error: 404");

        let err = fetch_document(&client, &format!("{}/empty", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(204));
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let doc = fetch_document(&client, &format!("{}/old", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(doc.final_url, format!("{}/new", server.uri()));
        assert_eq!(doc.body, b"moved");
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let err = fetch_document(&client, &server.uri(), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport() {
        // Bind then drop a listener to get a port nobody is serving
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = build_http_client(&create_test_config()).unwrap();
        let err = fetch_document(
            &client,
            &format!("http://127.0.0.1:{}/", port),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }
}
