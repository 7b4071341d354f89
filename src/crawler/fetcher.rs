//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with its timeout budget
//! - GET requests to fetch page content
//! - Error classification
//!
//! The fetch contract is deliberately blunt: one GET per URL, no retries,
//! and only a 200 response counts as a page. Redirects are never followed;
//! a 3xx comes back as a plain failure like any other non-200 status.

use crate::config::CrawlerConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// User agent sent with every request
const USER_AGENT: &str = concat!("linkwell/", env!("CARGO_PKG_VERSION"));

/// Result of a fetch attempt
///
/// Both variants mean the URL is used up; the store never sees a retry.
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTTP 200 with the raw, undecoded response body
    Success { body: Vec<u8> },

    /// Anything else that can happen to a request
    Failure { reason: FetchFailure },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Why a fetch attempt produced no page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Non-200 status code, redirects included
    Status(u16),

    /// Connect or read timeout
    Timeout,

    /// Transport-level failure (DNS, refused connection, TLS, bad URL)
    Network(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Timeout => write!(f, "request timeout"),
            Self::Network(error) => write!(f, "network error: {}", error),
        }
    }
}

/// Builds the HTTP client shared by all workers
///
/// # Arguments
///
/// * `config` - The crawler configuration carrying the timeout budget
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.read_timeout_ms))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stateless page fetcher wrapping the shared client
///
/// Cloning is cheap; the underlying client is reference-counted and shared
/// across all pool workers.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a single URL
    ///
    /// Never returns an error: every failure mode folds into
    /// [`FetchOutcome::Failure`] so one bad URL cannot disturb the rest of
    /// a batch.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchOutcome::Failure {
                    reason: classify_error(&e),
                }
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return FetchOutcome::Failure {
                reason: FetchFailure::Status(status.as_u16()),
            };
        }

        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
            },
            Err(e) => FetchOutcome::Failure {
                reason: classify_error(&e),
            },
        }
    }
}

fn classify_error(error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(read_timeout_ms: u64) -> CrawlerConfig {
        CrawlerConfig {
            read_timeout_ms,
            ..CrawlerConfig::default()
        }
    }

    async fn test_fetcher(read_timeout_ms: u64) -> PageFetcher {
        let client = build_http_client(&test_config(read_timeout_ms)).unwrap();
        PageFetcher::new(client)
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&CrawlerConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_success_returns_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0x00, 0x61]))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(5_000).await;
        let outcome = fetcher.fetch(&format!("{}/page", server.uri())).await;

        // Bytes pass through undecoded; decoding is the extractor's job
        match outcome {
            FetchOutcome::Success { body } => assert_eq!(body, vec![0xFF, 0x00, 0x61]),
            FetchOutcome::Failure { reason } => panic!("unexpected failure: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_non_200_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(5_000).await;
        let outcome = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        match outcome {
            FetchOutcome::Failure { reason } => assert_eq!(reason, FetchFailure::Status(404)),
            FetchOutcome::Success { .. } => panic!("404 must not be a success"),
        }
    }

    #[tokio::test]
    async fn test_redirect_is_failure_and_never_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/target"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/target"))
            .respond_with(ResponseTemplate::new(200).set_body_string("should never be fetched"))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(5_000).await;
        let outcome = fetcher.fetch(&format!("{}/moved", server.uri())).await;

        match outcome {
            FetchOutcome::Failure { reason } => assert_eq!(reason, FetchFailure::Status(301)),
            FetchOutcome::Success { .. } => panic!("redirect must not be a success"),
        }
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(1_500)),
            )
            .mount(&server)
            .await;

        let fetcher = test_fetcher(200).await;
        let outcome = fetcher.fetch(&format!("{}/slow", server.uri())).await;

        match outcome {
            FetchOutcome::Failure { reason } => assert_eq!(reason, FetchFailure::Timeout),
            FetchOutcome::Success { .. } => panic!("slow response must time out"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let fetcher = test_fetcher(5_000).await;
        // Port 1 is never listening
        let outcome = fetcher.fetch("http://127.0.0.1:1/").await;

        match outcome {
            FetchOutcome::Failure { reason } => {
                assert!(matches!(reason, FetchFailure::Network(_)))
            }
            FetchOutcome::Success { .. } => panic!("refused connection must fail"),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_failure() {
        let fetcher = test_fetcher(5_000).await;
        let outcome = fetcher.fetch("not a url").await;
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(FetchFailure::Status(503).to_string(), "HTTP status 503");
        assert_eq!(FetchFailure::Timeout.to_string(), "request timeout");
    }
}
