use crate::config::ProviderConfig;
use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};
use url::Url;

/// Outcome of a single GET. Only transient failures are worth repeating.
#[derive(Debug)]
enum AttemptError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::Retryable(_))
    }

    fn into_inner(self) -> anyhow::Error {
        match self {
            AttemptError::Retryable(e) | AttemptError::Fatal(e) => e,
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    config: ProviderConfig,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Yahoo hands out a session cookie on first contact
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// Fetch a URL as text, retrying network errors, 429 and 5xx with
    /// exponential backoff plus jitter.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        // 2^n * factor: first retry waits retry_base_ms, then doubles
        let strategy = ExponentialBackoff::from_millis(2)
            .factor((self.config.retry_base_ms / 2).max(1))
            .map(jitter)
            .take(self.config.max_retries as usize);

        RetryIf::start(strategy, || self.attempt(url), AttemptError::is_retryable)
            .await
            .map_err(AttemptError::into_inner)
            .with_context(|| format!("GET {} failed", url))
    }

    async fn attempt(&self, url: &Url) -> Result<String, AttemptError> {
        debug!("GET {}", url);

        let resp = self.inner.get(url.clone()).send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            AttemptError::Retryable(anyhow!("Request error: {}", e))
        })?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!("Provider answered {} for {}, backing off", status, url);
            return Err(AttemptError::Retryable(anyhow!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(anyhow!("HTTP error {}", status)));
        }

        resp.text()
            .await
            .map_err(|e| AttemptError::Retryable(anyhow!("Failed to read response body: {}", e)))
    }
}
