//! Tile downloads with timeout and retry.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use super::http::AsyncHttpClient;
use super::TileEndpoint;
use crate::coord::TileId;

// =============================================================================
// Fetch Constants
// =============================================================================

/// Default per-attempt deadline (5 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default total attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY_MS: u64 = 200;

/// Jitter added to each retry delay, as a fraction of that delay.
pub const DEFAULT_JITTER_RATIO: f64 = 0.1;

/// Why a tile could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The service has no tile at this address (HTTP 404). Never retried.
    #[error("tile {0} not found")]
    NotFound(TileId),

    /// Timeouts, connection failures and 5xx, still failing after every
    /// allowed attempt.
    #[error("tile fetch failed after {attempts} attempt(s): {reason}")]
    Transient { attempts: u32, reason: String },

    /// Any other non-success status. Not retried.
    #[error("tile request rejected with HTTP {status}")]
    Rejected { status: u16 },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Exponential backoff with proportional jitter.
///
/// Retry `n` (1-based) waits `base_delay * 2^(n-1)` plus up to
/// `jitter_ratio` of that amount. With a ratio below 1.0 every delay is
/// strictly longer than the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `retry` (1-based) without jitter, or `None` once
    /// the attempt budget is spent.
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Adds up to `jitter_ratio` of `delay`, drawn uniformly.
    pub fn jittered(&self, delay: Duration) -> Duration {
        let max_jitter = delay.as_secs_f64() * self.jitter_ratio.clamp(0.0, 1.0);
        if max_jitter <= 0.0 {
            return delay;
        }
        let jitter = rand::rng().random_range(0.0..=max_jitter);
        delay + Duration::from_secs_f64(jitter)
    }
}

/// Fetcher configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Deadline for a single attempt, including reading the body.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self
    }
}

/// Outcome of one attempt.
enum Attempt {
    Done(Vec<u8>),
    Fatal(FetchError),
    Retry(String),
}

/// Downloads raw tile payloads from a [`TileEndpoint`].
pub struct NetworkFetcher<C: AsyncHttpClient> {
    client: C,
    endpoint: TileEndpoint,
    config: FetchConfig,
}

impl<C: AsyncHttpClient> NetworkFetcher<C> {
    pub fn new(client: C, endpoint: TileEndpoint, config: FetchConfig) -> Self {
        Self {
            client,
            endpoint,
            config,
        }
    }

    pub fn endpoint(&self) -> &TileEndpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches the payload for `id`.
    ///
    /// Each attempt is bounded by the configured timeout; dropping the
    /// attempt future aborts the underlying request.
    pub async fn fetch_tile(&self, id: TileId) -> Result<Vec<u8>, FetchError> {
        let url = self.endpoint.url(id);
        let policy = &self.config.retry;
        let mut attempt = 1;

        loop {
            debug!(tile = %id, attempt, "Fetching tile");

            let reason = match self.attempt(id, &url).await {
                Attempt::Done(bytes) => {
                    debug!(tile = %id, attempt, bytes = bytes.len(), "Tile fetched");
                    return Ok(bytes);
                }
                Attempt::Fatal(err) => return Err(err),
                Attempt::Retry(reason) => reason,
            };

            let Some(delay) = policy.delay_for_retry(attempt) else {
                warn!(tile = %id, attempts = attempt, reason = %reason, "Tile fetch failed");
                return Err(FetchError::Transient {
                    attempts: attempt,
                    reason,
                });
            };

            let delay = policy.jittered(delay);
            warn!(
                tile = %id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "Transient fetch failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, id: TileId, url: &str) -> Attempt {
        let response = match tokio::time::timeout(self.config.timeout, self.client.get(url)).await {
            Err(_) => {
                return Attempt::Retry(format!(
                    "timed out after {} ms",
                    self.config.timeout.as_millis()
                ))
            }
            Ok(Err(err)) => return Attempt::Retry(err.to_string()),
            Ok(Ok(response)) => response,
        };

        match response.status {
            _ if response.is_success() => Attempt::Done(response.body),
            404 => Attempt::Fatal(FetchError::NotFound(id)),
            429 | 500..=599 => Attempt::Retry(format!("HTTP {}", response.status)),
            status => Attempt::Fatal(FetchError::Rejected { status }),
        }
    }
}
