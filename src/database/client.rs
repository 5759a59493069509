//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry logic (max 3 retries)
//! - Rate limit error handling

use crate::error::DatabaseError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("vuln-scan/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, DatabaseError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, DatabaseError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                DatabaseError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Perform a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
        service: &str,
    ) -> Result<T, DatabaseError> {
        let response = self
            .send_with_retry(|| self.client.get(url), resource, service)
            .await?;
        parse_json(response, resource, service).await
    }

    /// Perform a POST request with a JSON body and parse the JSON response
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        resource: &str,
        service: &str,
    ) -> Result<T, DatabaseError> {
        let response = self
            .send_with_retry(|| self.client.post(url).json(body), resource, service)
            .await?;
        parse_json(response, resource, service).await
    }

    /// Sends a request, retrying transport errors and HTTP 429 with backoff
    async fn send_with_retry<F>(
        &self,
        build: F,
        resource: &str,
        service: &str,
    ) -> Result<Response, DatabaseError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(DatabaseError::RateLimitExceeded {
                            service: service.to_string(),
                        });
                    } else if status == StatusCode::NOT_FOUND {
                        return Err(DatabaseError::PackageNotFound {
                            package: resource.to_string(),
                            service: service.to_string(),
                        });
                    } else if !status.is_success() {
                        return Err(DatabaseError::network_error(
                            resource,
                            service,
                            format!("HTTP {}", status),
                        ));
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        DatabaseError::timeout(resource, service)
                    } else {
                        DatabaseError::network_error(resource, service, e.to_string())
                    });
                }
            }

            if attempt < self.max_retries {
                debug!(resource, service, attempt, delay_ms = delay, "retrying request");
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay *= 2;
            }
        }

        Err(last_error
            .unwrap_or_else(|| DatabaseError::network_error(resource, service, "unknown error")))
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: Response,
    resource: &str,
    service: &str,
) -> Result<T, DatabaseError> {
    response.json::<T>().await.map_err(|e| {
        DatabaseError::invalid_response(resource, service, format!("failed to parse JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client() -> HttpClient {
        HttpClient::with_config(Duration::from_secs(5), "test-agent/1.0")
            .unwrap()
            .with_max_retries(1)
    }

    #[test]
    fn test_http_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_http_client_with_max_retries() {
        let client = HttpClient::new().unwrap().with_max_retries(5);
        assert_eq!(client.max_retries, 5);
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert!(DEFAULT_USER_AGENT.starts_with("vuln-scan/"));
        assert_eq!(MAX_RETRIES, 3);
        assert_eq!(BASE_DELAY_MS, 100);
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let value: Value = fast_client()
            .get_json(&format!("{}/thing", server.uri()), "thing", "test")
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audit"))
            .and(body_json(serde_json::json!({"name": "app"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"n": 1})))
            .mount(&server)
            .await;

        let value: Value = fast_client()
            .post_json(
                &format!("{}/audit", server.uri()),
                &serde_json::json!({"name": "app"}),
                "audit",
                "test",
            )
            .await
            .unwrap();
        assert_eq!(value["n"], 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fast_client()
            .get_json::<Value>(&format!("{}/missing", server.uri()), "missing", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::PackageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let err = fast_client()
            .get_json::<Value>(&format!("{}/busy", server.uri()), "busy", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fast_client()
            .get_json::<Value>(&format!("{}/broken", server.uri()), "broken", "test")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = fast_client()
            .get_json::<Value>(&format!("{}/text", server.uri()), "text", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidResponse { .. }));
    }
}
