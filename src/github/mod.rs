pub mod pagination;
pub mod types;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "pr-change-analyzer";
const API_VERSION: &str = "2022-11-28";

/// Typed outcome of a failed API call. Callers decide per call whether a
/// failure is fatal to the PR, the repository, or the run — it is never
/// raised past them as a panic.
#[derive(Debug, Error)]
pub enum HttpFailure {
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GitHub API transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One successful API response: the JSON body plus the opaque rel="next"
/// cursor from the Link header, if any.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: serde_json::Value,
    pub next: Option<String>,
}

/// Seam between the crawl logic and the wire. Production uses reqwest;
/// tests inject canned pages.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<ApiResponse, HttpFailure>;
}

/// reqwest-backed transport with uniform GitHub headers on every call.
pub struct HttpTransport {
    client: reqwest::Client,
    token: String,
}

impl HttpTransport {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<ApiResponse, HttpFailure> {
        let response = self
            .client
            .get(url)
            .query(params)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        let next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(pagination::parse_next_link);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HttpFailure::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        Ok(ApiResponse { body, next })
    }
}

/// Rate-limited GitHub client. Every call is followed by a fixed delay,
/// success or failure, because the API enforces a shared per-token budget.
/// The delay is injectable so tests can run with zero pacing.
pub struct GitHubClient {
    transport: Box<dyn Transport>,
    delay: Duration,
}

impl GitHubClient {
    pub fn new(token: String, delay: Duration) -> Self {
        Self {
            transport: Box::new(HttpTransport::new(token)),
            delay,
        }
    }

    pub fn with_transport(transport: Box<dyn Transport>, delay: Duration) -> Self {
        Self { transport, delay }
    }

    /// Issue a GET against a repo-relative endpoint (e.g. "repos/org/name/pulls").
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<ApiResponse, HttpFailure> {
        self.get_url(&format!("{API_BASE}/{endpoint}"), params).await
    }

    /// Issue a GET against an absolute URL (pagination cursors are opaque
    /// absolute URLs and must be used verbatim).
    pub async fn get_url(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<ApiResponse, HttpFailure> {
        debug!(%url, "GitHub API request");
        let result = self.transport.get(url, params).await;
        // Unconditional pause, even on failure: callers must not be able to
        // retry in a tight loop past the rate budget.
        tokio::time::sleep(self.delay).await;
        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned-page transport for crawl tests. Serves `pages` in order and
    /// keeps re-serving the last page if called again; counts every call.
    pub struct MockTransport {
        pages: Vec<ApiResponse>,
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl MockTransport {
        pub fn new(pages: Vec<ApiResponse>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail_after: None,
            }
        }

        /// Succeed for the first `n` calls, then return an HTTP 500.
        pub fn failing_after(pages: Vec<ApiResponse>, n: usize) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail_after: Some(n),
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(
            &self,
            _url: &str,
            _params: &[(String, String)],
        ) -> Result<ApiResponse, HttpFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(n) = self.fail_after {
                if call >= n {
                    return Err(HttpFailure::Status {
                        status: 500,
                        message: "mock failure".to_string(),
                    });
                }
            }
            let index = call.min(self.pages.len().saturating_sub(1));
            Ok(self.pages[index].clone())
        }
    }

    pub fn page(body: serde_json::Value, next: Option<&str>) -> ApiResponse {
        ApiResponse {
            body,
            next: next.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{page, MockTransport};
    use super::*;

    #[tokio::test]
    async fn test_client_surfaces_status_failure() {
        let transport = MockTransport::failing_after(vec![], 0);
        let client = GitHubClient::with_transport(Box::new(transport), Duration::ZERO);
        let err = client.get("repos/org/repo/pulls", &[]).await.unwrap_err();
        match err {
            HttpFailure::Status { status, .. } => assert_eq!(status, 500),
            other => panic!("expected status failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_returns_body_and_cursor() {
        let transport = MockTransport::new(vec![page(
            serde_json::json!([{"ok": true}]),
            Some("https://api.github.com/next"),
        )]);
        let client = GitHubClient::with_transport(Box::new(transport), Duration::ZERO);
        let response = client.get("repos/org/repo/pulls", &[]).await.unwrap();
        assert!(response.body.is_array());
        assert_eq!(response.next.as_deref(), Some("https://api.github.com/next"));
    }
}
