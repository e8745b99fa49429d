//! HTTP page source.
//!
//! The actual HTTP client is abstracted via a trait; the CLI plugs in a
//! reqwest-backed client, tests plug in canned responses.

use crate::config::SyncConfig;
use crate::cursor::CursorState;
use crate::error::{SyncError, SyncResult};
use crate::fetcher::PageSource;
use parking_lot::RwLock;
use sessync_protocol::{resource_url, SessionPage};
use std::time::Duration;
use thiserror::Error;

/// One GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Collection URL without query string.
    pub url: String,
    /// Query parameters, unencoded.
    pub query: Vec<(String, String)>,
    /// Request timeout.
    pub timeout: Duration,
}

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP status level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other client failure.
    #[error("{0}")]
    Other(String),
}

/// HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// Performs a GET request.
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).get(request)
    }
}

/// Fetches session pages over HTTP.
pub struct HttpPageSource<C: HttpClient> {
    url: String,
    timeout: Duration,
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpPageSource<C> {
    /// Creates a source for an explicit collection URL.
    pub fn new(url: impl Into<String>, client: C) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Creates a source for the configured platform and endpoint.
    pub fn from_config(config: &SyncConfig, client: C) -> Self {
        Self::new(resource_url(&config.platform, config.endpoint()), client)
            .with_timeout(config.fetch_timeout)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the collection URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn fail(&self, err: SyncError) -> SyncError {
        *self.last_error.write() = Some(err.to_string());
        err
    }
}

impl<C: HttpClient> PageSource for HttpPageSource<C> {
    fn fetch_page(&self, cursor: &CursorState, page_size: u32) -> SyncResult<SessionPage> {
        let request = HttpRequest {
            url: self.url.clone(),
            query: cursor.page_query(page_size).to_query_pairs(),
            timeout: self.timeout,
        };
        tracing::debug!(url = %request.url, cursor = %cursor.position(), "fetching page");

        let response = self.client.get(&request).map_err(|e| {
            let retryable = matches!(e, HttpError::Timeout(_) | HttpError::Connect(_));
            self.fail(SyncError::Transport {
                message: e.to_string(),
                retryable,
            })
        })?;

        if !response.is_success() {
            let message = format!("HTTP {} from {}", response.status, self.url);
            let err = if response.status == 429 || response.status >= 500 {
                SyncError::transport_retryable(message)
            } else {
                SyncError::transport_fatal(message)
            };
            return Err(self.fail(err));
        }

        let page = SessionPage::decode(&response.body)
            .map_err(|e| self.fail(SyncError::Protocol(format!("failed to decode page: {e}"))))?;
        *self.last_error.write() = None;
        Ok(page)
    }
}

impl<C: HttpClient> std::fmt::Debug for HttpPageSource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageSource")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::JobKey;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    struct TestClient {
        response: Mutex<Result<HttpResponse, HttpError>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl TestClient {
        fn new(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response: Mutex::new(response),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn ok(body: &str) -> Self {
            Self::new(Ok(HttpResponse {
                status: 200,
                body: body.as_bytes().to_vec(),
            }))
        }
    }

    impl HttpClient for TestClient {
        fn get(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
            self.seen.lock().push(request.clone());
            self.response.lock().clone()
        }
    }

    fn cursor() -> CursorState {
        let job = JobKey::event_sessions("events/-/sessions/");
        CursorState::at(job, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(), Some(5))
    }

    fn query_value<'a>(request: &'a HttpRequest, key: &str) -> &'a str {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn builds_request_from_config_and_cursor() {
        let config = SyncConfig::new("acme.example.com", "events/-/sessions/")
            .with_fetch_timeout(Duration::from_secs(5));
        let source = HttpPageSource::from_config(&config, TestClient::ok(r#"{"Items":[]}"#));
        assert_eq!(
            source.url(),
            "https://acme.example.com/api/2012-02-01/auth/resources/events/-/sessions/"
        );

        let page = source.fetch_page(&cursor(), 100).unwrap();
        assert!(page.is_empty());
        assert!(!page.has_more());

        let seen = source.client.seen.lock();
        let request = &seen[0];
        assert_eq!(request.timeout, Duration::from_secs(5));
        assert_eq!(query_value(request, "$top"), "100");
        assert_eq!(query_value(request, "$expand"), "EventSession/Event");
        assert_eq!(
            query_value(request, "$orderby"),
            "LastModifiedDateTime ASC,SessionID ASC"
        );
        assert!(query_value(request, "$filter").contains("SessionID gt 5"));
    }

    #[test]
    fn server_errors_are_retryable() {
        let source = HttpPageSource::new(
            "http://localhost/x",
            TestClient::new(Ok(HttpResponse {
                status: 503,
                body: Vec::new(),
            })),
        );
        let err = source.fetch_page(&cursor(), 10).unwrap_err();
        assert!(err.is_retryable());
        assert!(source.last_error().unwrap().contains("503"));
    }

    #[test]
    fn client_errors_are_fatal() {
        let source = HttpPageSource::new(
            "http://localhost/x",
            TestClient::new(Ok(HttpResponse {
                status: 401,
                body: Vec::new(),
            })),
        );
        let err = source.fetch_page(&cursor(), 10).unwrap_err();
        assert!(matches!(err, SyncError::Transport { retryable: false, .. }));
    }

    #[test]
    fn timeouts_are_retryable() {
        let source = HttpPageSource::new(
            "http://localhost/x",
            TestClient::new(Err(HttpError::Timeout("30s".into()))),
        );
        assert!(source.fetch_page(&cursor(), 10).unwrap_err().is_retryable());
    }

    #[test]
    fn garbage_body_is_protocol_error() {
        let source = HttpPageSource::new("http://localhost/x", TestClient::ok("<html>"));
        assert!(matches!(
            source.fetch_page(&cursor(), 10),
            Err(SyncError::Protocol(_))
        ));

        let source = HttpPageSource::new("http://localhost/x", TestClient::ok(""));
        assert!(matches!(
            source.fetch_page(&cursor(), 10),
            Err(SyncError::Protocol(_))
        ));
    }

    #[test]
    fn success_clears_last_error() {
        let source = HttpPageSource::new(
            "http://localhost/x",
            TestClient::new(Err(HttpError::Connect("refused".into()))),
        );
        assert!(source.fetch_page(&cursor(), 10).is_err());
        assert!(source.last_error().is_some());

        *source.client.response.lock() = Ok(HttpResponse {
            status: 200,
            body: br#"{"Items":[],"Links":[{"rel":"next","href":"/p2"}]}"#.to_vec(),
        });
        assert!(source.fetch_page(&cursor(), 10).unwrap().has_more());
        assert!(source.last_error().is_none());
    }
}
