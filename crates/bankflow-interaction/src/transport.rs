//! HTTP transport for the upstream API.

use async_trait::async_trait;
use bankflow_core::error::{BankflowError, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;

pub use reqwest::Method;

/// Sends one authenticated JSON request and returns the decoded response body.
///
/// Only `GET` (payload as query string) and `POST` (payload as JSON body) are
/// supported; anything else fails with `InvalidMethod` before sending.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value>;
}

/// Rejects methods other than GET and POST.
pub fn ensure_supported(method: &Method) -> Result<()> {
    if *method == Method::GET || *method == Method::POST {
        Ok(())
    } else {
        Err(BankflowError::InvalidMethod(method.to_string()))
    }
}

/// Retry behaviour for transient failures.
///
/// Only connection errors and 5xx responses are retried; 4xx answers are final.
/// POST creates upstream resources, so it is retried only when
/// `retry_non_idempotent` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub retry_non_idempotent: bool,
}

impl RetryPolicy {
    /// No retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
            retry_non_idempotent: false,
        }
    }

    /// Retries GET requests up to `max_retries` times with a fixed pause.
    pub fn fixed(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            retry_non_idempotent: false,
        }
    }

    /// Also retries POST requests, accepting possible duplicates upstream.
    pub fn with_non_idempotent(mut self, enabled: bool) -> Self {
        self.retry_non_idempotent = enabled;
        self
    }

    pub fn is_retryable(err: &BankflowError) -> bool {
        match err {
            BankflowError::Transport(_) => true,
            BankflowError::UpstreamHttp { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether a failed `method` request may be sent again after `attempt` retries.
    pub fn should_retry(&self, method: &Method, attempt: u32, err: &BankflowError) -> bool {
        attempt < self.max_retries
            && (*method == Method::GET || self.retry_non_idempotent)
            && Self::is_retryable(err)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    retry: RetryPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransportBuilder {
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl ReqwestTransportBuilder {
    /// Sets a per-request timeout. Without one requests may wait indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| BankflowError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(ReqwestTransport {
            client,
            retry: self.retry,
        })
    }
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header("accept", "application/json")
            .header("Authorization", format!("Token {token}"))
            .header("Content-Type", "application/json");

        request = if *method == Method::GET {
            request.query(&query_pairs(payload))
        } else {
            request.json(payload)
        };

        let response = request.send().await.map_err(|err| {
            BankflowError::Transport(format!("{method} {url} failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::warn!("{} {} returned {}: {}", method, url, status, body);
            return Err(BankflowError::upstream(status.as_u16(), body));
        }

        let bytes = response.bytes().await.map_err(|err| {
            BankflowError::Transport(format!("failed to read response from {url}: {err}"))
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value> {
        ensure_supported(&method)?;
        tracing::debug!("{} {}", method, url);

        let mut attempt = 0;
        loop {
            match self.send_once(&method, url, token, payload).await {
                Err(err) if self.retry.should_retry(&method, attempt, &err) => {
                    attempt += 1;
                    tracing::warn!(
                        "Retrying {} {} ({}/{}) after: {}",
                        method,
                        url,
                        attempt,
                        self.retry.max_retries,
                        err
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                result => return result,
            }
        }
    }
}

/// Flattens a payload into query pairs; strings are sent verbatim, other values
/// as their JSON text.
fn query_pairs(payload: &Map<String, Value>) -> Vec<(String, String)> {
    payload
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
