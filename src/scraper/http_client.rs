use crate::config::ScraperConfig;
use crate::error::ExportError;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

/// Thin reqwest wrapper with a shared cookie jar and bounded retry.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: usize,
    retry_base_ms: u64,
}

/// Outcome of one failed attempt.
#[derive(Debug)]
struct Failure {
    retryable: bool,
    reason: String,
    status: Option<u16>,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Yahoo hands out the crumb only to the session that got the cookie
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            max_retries: config.max_retries,
            retry_base_ms: config.retry_base_ms,
        })
    }

    /// Fetch a URL as text. Transport errors, 429 and 5xx are retried with
    /// jittered exponential backoff; any other non-success status fails at once.
    pub async fn get_text(&self, url: &str) -> Result<String, ExportError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.retry_base_ms / 2)
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.max_retries);

        let mut attempt = 0u32;
        RetryIf::start(
            strategy,
            || {
                attempt += 1;
                self.get_once(url, attempt)
            },
            |f: &Failure| {
                if f.retryable {
                    warn!("GET {} failed ({}), retrying", url, f.reason);
                }
                f.retryable
            },
        )
        .await
        .map_err(|f| ExportError::Fetch {
            url: url.to_string(),
            reason: f.reason,
            status: f.status,
        })
    }

    /// Issue a GET only for its side effects on the cookie jar. The status
    /// is ignored; fc.yahoo.com answers 404 while still setting the cookie.
    pub async fn touch(&self, url: &str) -> Result<(), ExportError> {
        debug!("GET {} (cookie priming)", url);
        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| ExportError::Fetch {
                url: url.to_string(),
                reason: format!("request error: {e}"),
                status: None,
            })?;
        debug!("{} answered {}", url, resp.status());
        Ok(())
    }

    async fn get_once(&self, url: &str, attempt: u32) -> Result<String, Failure> {
        debug!("GET {} (attempt {})", url, attempt);

        let resp = self.inner.get(url).send().await.map_err(|e| Failure {
            retryable: true,
            reason: format!("request error: {e}"),
            status: None,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Failure {
                retryable: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
                reason: format!("HTTP {status}"),
                status: Some(status.as_u16()),
            });
        }

        resp.text().await.map_err(|e| Failure {
            retryable: true,
            reason: format!("failed to read response body: {e}"),
            status: None,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
