use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::AppError;

/// Which failures may be retried for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// Reads and model calls: timeouts, connect failures, 429 and 502/503/504.
    Idempotent,
    /// Inserts: only connect failures, where the request never reached the server.
    ConnectOnly,
}

impl Retry {
    fn on_error(self, err: &reqwest::Error) -> bool {
        match self {
            Retry::Idempotent => err.is_timeout() || err.is_connect(),
            Retry::ConnectOnly => err.is_connect(),
        }
    }

    fn on_status(self, status: StatusCode) -> bool {
        self == Retry::Idempotent
            && matches!(
                status,
                StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            )
    }
}

/// Shared HTTP client for every external call, with timeouts and bounded retries.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl Upstream {
    pub fn new(cfg: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_retries: cfg.max_retries,
            backoff: Duration::from_millis(cfg.backoff_ms),
        })
    }

    /// Sends the request built by `build`, retrying per `retry`, and turns any
    /// non-2xx answer into [`AppError::Upstream`] carrying the body text.
    pub async fn send<F>(&self, service: &'static str, retry: Retry, build: F) -> Result<Response, AppError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let can_retry = attempt < self.max_retries;
            match build(&self.client).send().await {
                Ok(res) if res.status().is_success() => {
                    debug!(service, status = %res.status(), attempt, "upstream ok");
                    return Ok(res);
                }
                Ok(res) if can_retry && retry.on_status(res.status()) => {
                    warn!(service, status = %res.status(), attempt, "upstream busy; retrying");
                }
                Ok(res) => {
                    let status = res.status().as_u16();
                    let message = res.text().await.unwrap_or_default();
                    warn!(service, status, %message, "upstream error response");
                    return Err(AppError::Upstream {
                        service,
                        status,
                        message,
                    });
                }
                Err(e) if can_retry && retry.on_error(&e) => {
                    warn!(service, error = %e, attempt, "upstream unreachable; retrying");
                }
                Err(source) => return Err(AppError::Transport { service, source }),
            }
            tokio::time::sleep(self.backoff * 2u32.saturating_pow(attempt)).await;
            attempt += 1;
        }
    }
}
