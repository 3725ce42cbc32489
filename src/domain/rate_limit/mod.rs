//! Rate limit domain - Window configuration and decisions

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_REQUESTS: u32 = 15;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Sliding-window limit on generation calls per user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests inside one window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// How often aged-out records are swept
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            ..Self::default()
        }
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Denial message, set only when not allowed
    pub message: Option<String>,
    /// Requests left in the current window
    pub remaining: u32,
    pub limit: u32,
    /// Time until the oldest request in the window ages out
    pub reset_in: Duration,
}

impl RateLimitDecision {
    pub fn allowed(remaining: u32, limit: u32, reset_in: Duration) -> Self {
        Self {
            allowed: true,
            message: None,
            remaining,
            limit,
            reset_in,
        }
    }

    pub fn denied(limit: u32, reset_in: Duration) -> Self {
        Self {
            allowed: false,
            message: Some(format!(
                "Rate limit exceeded. Please wait {} before searching again.",
                format_time_remaining(reset_in)
            )),
            remaining: 0,
            limit,
            reset_in,
        }
    }
}

/// Formats a wait time as whole seconds under a minute, whole minutes above
pub fn format_time_remaining(duration: Duration) -> String {
    let seconds = duration.as_millis().div_ceil(1000);

    if seconds < 60 {
        return format!("{} second{}", seconds, if seconds == 1 { "" } else { "s" });
    }

    let minutes = seconds.div_ceil(60);
    format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
}
