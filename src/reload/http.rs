// src/reload/http.rs

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::{ReloaderError, Result};
use crate::reload::retry::{ReloadAttempt, RetryConfig};
use crate::reload::ReloadTrigger;

/// Production trigger: `POST <reload_url>` with an empty body.
///
/// Any 2xx response is success; the body is never read. Every attempt is
/// bounded by `timeout`; failures are retried following `retry`.
#[derive(Debug, Clone)]
pub struct HttpReloadTrigger {
    client: Client,
    url: Url,
    timeout: Duration,
    retry: RetryConfig,
}

impl HttpReloadTrigger {
    pub fn new(url: Url, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ReloaderError::ConfigurationError(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            url,
            timeout,
            retry,
        })
    }

    /// One POST, mapped to a printable error on failure.
    async fn post_once(&self) -> std::result::Result<(), String> {
        let resp = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("request error: {e}"))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("received non-2xx status {status}"))
        }
    }

    async fn trigger_with_retry(&self, cancel: &CancellationToken) -> Result<()> {
        let mut attempt_number = 0;

        loop {
            attempt_number += 1;
            debug!(url = %self.url, attempt = attempt_number, "sending reload request");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ReloaderError::Cancelled),
                res = self.post_once() => res,
            };

            let error = match outcome {
                Ok(()) => {
                    info!(url = %self.url, attempt = attempt_number, "reload triggered");
                    return Ok(());
                }
                Err(e) => e,
            };

            let attempt = ReloadAttempt {
                attempt_number,
                next_backoff: self.retry.next_backoff(attempt_number),
                error,
            };
            warn!(url = %self.url, %attempt, "reload attempt failed");

            let Some(backoff) = attempt.next_backoff else {
                return Err(ReloaderError::ReloadFailed {
                    url: self.url.to_string(),
                    attempts: attempt.attempt_number,
                    last_error: attempt.error,
                });
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ReloaderError::Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }
}

impl ReloadTrigger for HttpReloadTrigger {
    fn trigger<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.trigger_with_retry(cancel))
    }
}
