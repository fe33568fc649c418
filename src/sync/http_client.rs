//! Rate-limited HTTP client for the marketing platform API
//!
//! This module provides the single gateway used for every platform call.
//! It attaches the static authentication headers, classifies responses
//! (2xx success, 429 throttled, anything else fatal), retries throttled
//! calls through [`RetryManager`], and optionally paces outbound requests.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error};

use crate::config::{PlatformConfig, RateLimitConfig, RetryConfig};
use crate::error::ApiError;
use crate::sync::retry::{RetryManager, Sleeper, TokioSleeper};

/// HTTP client with throttling retry and request pacing
///
/// Features:
/// - Static `Api-Token` and JSON content-type headers
/// - Exponential backoff on HTTP 429 via [`RetryManager`]
/// - Global concurrent request limiting via semaphore
/// - Minimum interval between outbound requests
pub struct RateLimitedClient {
    client: Client,
    base_url: String,
    retry: RetryManager,
    sleeper: Arc<dyn Sleeper>,
    semaphore: Arc<Semaphore>,
    last_request: Mutex<Option<Instant>>,
    rate_limit: RateLimitConfig,
}

impl fmt::Debug for RateLimitedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitedClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}

impl RateLimitedClient {
    /// Create a new platform client
    pub fn new(
        platform: &PlatformConfig,
        retry: RetryConfig,
        rate_limit: RateLimitConfig,
    ) -> Result<Self, ApiError> {
        Self::with_sleeper(platform, retry, rate_limit, Arc::new(TokioSleeper))
    }

    /// Create a platform client with a custom sleeper for backoff and pacing
    pub fn with_sleeper(
        platform: &PlatformConfig,
        retry: RetryConfig,
        rate_limit: RateLimitConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&platform.api_token)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid API token header: {}", e)))?;
        headers.insert(HeaderName::from_static("api-token"), token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(platform.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: platform.base_url.trim_end_matches('/').to_string(),
            retry: RetryManager::with_sleeper(retry, sleeper.clone()),
            sleeper,
            semaphore: Arc::new(Semaphore::new(rate_limit.max_concurrent.max(1))),
            last_request: Mutex::new(None),
            rate_limit,
        })
    }

    /// Perform a GET request and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let body = self.request(Method::GET, path, query, None).await?;
        decode_body(&body)
    }

    /// Perform a POST request with a JSON body
    ///
    /// Any 2xx status is success; the response body is not inspected.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &B,
    ) -> Result<(), ApiError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.request(Method::POST, path, &[], Some(&payload)).await?;
        Ok(())
    }

    /// Execute one logical call, retrying while throttled
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<&serde_json::Value>,
    ) -> Result<Bytes, ApiError> {
        let url = self.url(path);

        let result = self
            .retry
            .execute(|| self.send_once(method.clone(), &url, query, payload))
            .await;

        match &result {
            Ok(body) => debug!(
                method = %method,
                url = %url,
                body_size = body.len(),
                "API call succeeded"
            ),
            Err(err) => error!(method = %method, url = %url, error = %err, "API call failed"),
        }

        result
    }

    /// Send a single attempt and classify the response
    async fn send_once(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        payload: Option<&serde_json::Value>,
    ) -> Result<Bytes, ApiError> {
        // Acquire semaphore permit to limit concurrent requests
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Request limiter closed: {}", e)))?;

        self.wait_for_rate_limit().await;

        debug!(method = %method, url = url, "Sending HTTP request");

        let mut builder = self.client.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::NetworkTimeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .bytes()
                .await
                .map_err(|e| ApiError::Network(e.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::Throttled);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Wait until the minimum interval since the previous request has passed
    async fn wait_for_rate_limit(&self) {
        let min_interval = Duration::from_millis(self.rate_limit.min_interval_ms);
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < min_interval {
                let wait_time = min_interval - elapsed;
                debug!(wait_ms = wait_time.as_millis(), "Waiting for rate limit");
                self.sleeper.sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Get number of available permits (concurrent request slots)
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}
