//! Per-client request counter over a trailing time window.
//!
//! Each client key keeps the timestamps of its accepted requests. A request is
//! allowed while fewer than `limit` timestamps fall inside the last `window`.

use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitUsage {
    pub used: usize,
    pub limit: usize,
    pub window_secs: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    requests: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            requests: DashMap::new(),
        }
    }

    /// Rejects the request if the key already used its quota for the window.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    /// Counts an accepted request against the key.
    pub fn record(&self, key: &str) {
        self.record_at(key, Instant::now());
    }

    pub fn usage(&self, key: &str) -> RateLimitUsage {
        self.usage_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        let used = self.prune(key, now);
        if used >= self.limit {
            tracing::warn!(client = key, used, limit = self.limit, "Rate limit exceeded");
            return Err(AppError::RateLimited(self.exceeded_message()));
        }
        Ok(())
    }

    fn record_at(&self, key: &str, now: Instant) {
        let mut entry = self.requests.entry(key.to_string()).or_default();
        entry.retain(|ts| now.duration_since(*ts) < self.window);
        entry.push(now);
    }

    fn usage_at(&self, key: &str, now: Instant) -> RateLimitUsage {
        RateLimitUsage {
            used: self.prune(key, now),
            limit: self.limit,
            window_secs: self.window.as_secs(),
        }
    }

    /// Drops timestamps that left the window and returns how many remain.
    fn prune(&self, key: &str, now: Instant) -> usize {
        match self.requests.get_mut(key) {
            Some(mut entry) => {
                entry.retain(|ts| now.duration_since(*ts) < self.window);
                entry.len()
            }
            None => 0,
        }
    }

    fn exceeded_message(&self) -> String {
        if self.window == Duration::from_secs(60) {
            format!("Rate limit exceeded: {} requests per minute", self.limit)
        } else {
            format!(
                "Rate limit exceeded: {} requests per {} seconds",
                self.limit,
                self.window.as_secs()
            )
        }
    }
}
