//! HTTP fetcher implementation
//!
//! This module handles the plain HTTP requests of a run:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests for the sitemap and for mirrored assets
//!
//! There is no retry logic; a failed request is reported once and the caller
//! records it.

use crate::config::AssetsConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed before a request fails
const MAX_REDIRECTS: usize = 10;

/// Connect timeout, bounded separately from the whole-request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Body and metadata of a completed GET
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl FetchedBody {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds an HTTP client with proper configuration
///
/// Each asset worker builds its own client, so no connection pool is shared
/// between workers.
///
/// # Arguments
///
/// * `config` - The asset configuration (user agent and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_snapshot::config::AssetsConfig;
/// use site_snapshot::crawler::build_http_client;
///
/// let client = build_http_client(&AssetsConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &AssetsConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body whatever the status code
///
/// Only transport failures (DNS, connect, TLS, timeout, body read) are
/// errors; interpreting the status is left to the caller.
pub async fn fetch_url(client: &Client, url: &str) -> Result<FetchedBody, reqwest::Error> {
    tracing::debug!("GET {}", url);

    let response = client.get(url).send().await?;
    let final_url = response.url().to_string();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = response.bytes().await?.to_vec();

    tracing::trace!("GET {} -> {} ({} bytes)", url, status, body.len());

    Ok(FetchedBody {
        final_url,
        status,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&AssetsConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_url_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .and(header("user-agent", "SnapshotTest/1.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0x89, 0x50, 0x4e, 0x47], "image/png"),
            )
            .mount(&server)
            .await;

        let config = AssetsConfig {
            user_agent: "SnapshotTest/1.0".to_string(),
            ..AssetsConfig::default()
        };
        let client = build_http_client(&config).unwrap();
        let fetched = fetch_url(&client, &format!("{}/logo.png", server.uri()))
            .await
            .unwrap();

        assert!(fetched.is_success());
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));
        assert_eq!(fetched.body, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn test_fetch_url_error_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.css"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_http_client(&AssetsConfig::default()).unwrap();
        let fetched = fetch_url(&client, &format!("{}/missing.css", server.uri()))
            .await
            .unwrap();

        assert_eq!(fetched.status, 404);
        assert!(!fetched.is_success());
    }

    #[tokio::test]
    async fn test_fetch_url_connection_refused() {
        let client = build_http_client(&AssetsConfig::default()).unwrap();
        let result = fetch_url(&client, "http://127.0.0.1:1/nothing").await;
        assert!(result.is_err());
    }
}
