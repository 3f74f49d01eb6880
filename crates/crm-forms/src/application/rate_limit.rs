//! Per-form submission rate limiting

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::domain::value_objects::FormId;

/// Rate limit config
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained submissions per minute, per form
    pub per_minute: u32,
    /// Submissions allowed in a burst
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 60,
            burst: 20,
        }
    }
}

/// Token bucket per form
pub struct SubmissionRateLimiter {
    buckets: DashMap<FormId, TokenBucket>,
    config: RateLimitConfig,
}

impl SubmissionRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Take one token for `form_id`
    pub fn try_acquire(&self, form_id: &FormId) -> bool {
        self.try_acquire_at(form_id, Instant::now())
    }

    pub fn try_acquire_at(&self, form_id: &FormId, now: Instant) -> bool {
        let mut bucket = self
            .buckets
            .entry(form_id.clone())
            .or_insert_with(|| TokenBucket::new(self.config.burst, now));
        bucket.try_acquire(self.config.per_minute, now)
    }
}

struct TokenBucket {
    available: u32,
    max: u32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(burst: u32, now: Instant) -> Self {
        Self {
            available: burst,
            max: burst,
            last_refill: now,
        }
    }

    fn try_acquire(&mut self, per_minute: u32, now: Instant) -> bool {
        self.refill(per_minute, now);
        if self.available > 0 {
            self.available -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, per_minute: u32, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let tokens = (elapsed.as_secs_f64() * per_minute as f64 / 60.0) as u32;

        if tokens > 0 {
            self.available = self.available.saturating_add(tokens).min(self.max);
            let spent = Duration::from_secs_f64(tokens as f64 * 60.0 / per_minute as f64);
            self.last_refill += spent;
        }
    }
}
