//! Rate limiter implementation
//!
//! Provides sliding window rate limiting for generation calls per user.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::rate_limit::{RateLimitConfig, RateLimitDecision};
use crate::infrastructure::observability::record_rate_limit_denied;

/// Rate limiter for generation calls
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    /// Per-user request timestamps (epoch millis)
    records: Arc<RwLock<HashMap<String, Vec<i64>>>>,
    /// Last sweep time (epoch millis)
    last_cleanup: Arc<RwLock<i64>>,
}

impl RateLimiter {
    /// Create a rate limiter on the system clock
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_millis();

        Self {
            config,
            clock,
            records: Arc::new(RwLock::new(HashMap::new())),
            last_cleanup: Arc::new(RwLock::new(now)),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check if a request is allowed, without recording it
    pub async fn check(&self, user_id: &str) -> RateLimitDecision {
        self.maybe_cleanup().await;

        let now = self.clock.now_millis();
        let records = self.records.read().await;

        self.decide(records.get(user_id), now)
    }

    /// Record a request
    pub async fn record(&self, user_id: &str) {
        let now = self.clock.now_millis();
        let mut records = self.records.write().await;

        records.entry(user_id.to_string()).or_default().push(now);
    }

    /// Check and record in one operation
    pub async fn check_and_record(&self, user_id: &str) -> RateLimitDecision {
        self.maybe_cleanup().await;

        let now = self.clock.now_millis();
        let mut records = self.records.write().await;

        let decision = self.decide(records.get(user_id), now);

        if decision.allowed {
            records.entry(user_id.to_string()).or_default().push(now);
        } else {
            record_rate_limit_denied();
            debug!(user_id = %user_id, reset_in_ms = decision.reset_in.as_millis() as u64, "Rate limit denied");
        }

        decision
    }

    /// Requests left in the current window
    pub async fn remaining(&self, user_id: &str) -> u32 {
        let now = self.clock.now_millis();
        let records = self.records.read().await;

        let used = in_window(records.get(user_id), now, self.window_millis()).count() as u32;
        self.config.max_requests.saturating_sub(used)
    }

    /// Time until the oldest request in the window ages out
    pub async fn time_until_reset(&self, user_id: &str) -> Duration {
        let now = self.clock.now_millis();
        let records = self.records.read().await;

        in_window(records.get(user_id), now, self.window_millis())
            .min()
            .map(|oldest| self.until_expiry(oldest, now))
            .unwrap_or(Duration::ZERO)
    }

    /// Reset rate limits for a user
    pub async fn reset(&self, user_id: &str) {
        let mut records = self.records.write().await;
        records.remove(user_id);
    }

    fn window_millis(&self) -> i64 {
        self.config.window.as_millis() as i64
    }

    fn until_expiry(&self, timestamp: i64, now: i64) -> Duration {
        let remaining = (timestamp + self.window_millis() - now).max(0);
        Duration::from_millis(remaining as u64)
    }

    fn decide(&self, records: Option<&Vec<i64>>, now: i64) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let active: Vec<i64> = in_window(records, now, self.window_millis()).collect();
        let count = active.len() as u32;

        let reset_in = active
            .iter()
            .min()
            .map(|oldest| self.until_expiry(*oldest, now))
            .unwrap_or(self.config.window);

        if count >= limit {
            return RateLimitDecision::denied(limit, reset_in);
        }

        RateLimitDecision::allowed(limit.saturating_sub(count + 1), limit, reset_in)
    }

    async fn maybe_cleanup(&self) {
        let now = self.clock.now_millis();
        let interval = self.config.cleanup_interval.as_millis() as i64;

        let should_cleanup = {
            let last = self.last_cleanup.read().await;
            now - *last >= interval
        };

        if should_cleanup {
            let mut last = self.last_cleanup.write().await;
            *last = now;

            let window = self.window_millis();
            let mut records = self.records.write().await;

            for user_records in records.values_mut() {
                user_records.retain(|timestamp| now - timestamp < window);
            }

            records.retain(|_, v| !v.is_empty());
        }
    }

    #[cfg(test)]
    async fn tracked_users(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Timestamps of `records` still inside the window ending at `now`
fn in_window(records: Option<&Vec<i64>>, now: i64, window: i64) -> impl Iterator<Item = i64> + '_ {
    records
        .into_iter()
        .flatten()
        .copied()
        .filter(move |timestamp| now - timestamp < window)
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
