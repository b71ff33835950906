use std::thread;
use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;
use tracing::{error, warn};

use crate::error::{Result, ScrapeError};

/// Anything that can turn a URL into a document body. The orchestrator owns
/// retries; implementations make exactly one attempt.
pub trait PageFetcher: Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|err| request_error(url, err))?;
        let status = resp.status();
        let body = resp.text().map_err(|err| request_error(url, err))?;
        if !status.is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                reason: format!("http {status}"),
            });
        }
        Ok(body)
    }
}

fn request_error(url: &str, err: reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::FetchTimeout {
            url: url.to_string(),
        }
    } else {
        ScrapeError::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Uniformly random pause between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub min: Duration,
    pub max: Duration,
}

impl Jitter {
    pub fn between(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn secs(min: u64, max: u64) -> Self {
        Self::between(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn none() -> Self {
        Self::between(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    pub fn pause(&self) {
        let wait = self.sample();
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Jitter::secs(5, 10),
        }
    }
}

/// Runs `fetcher` until it succeeds or the policy is exhausted. Exhaustion is
/// not an error for the caller: the page is simply treated as missing.
pub fn fetch_with_retry<F>(fetcher: &F, url: &str, policy: &RetryPolicy) -> Option<String>
where
    F: PageFetcher + ?Sized,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match fetcher.fetch(url) {
            Ok(body) => return Some(body),
            Err(err) if err.is_retryable() => {
                warn!(%url, attempt, attempts, "{err}");
                if attempt < attempts {
                    policy.backoff.pause();
                }
            }
            Err(err) => {
                error!(%url, "{err}");
                return None;
            }
        }
    }
    error!(%url, attempts, "giving up after repeated fetch failures");
    None
}
