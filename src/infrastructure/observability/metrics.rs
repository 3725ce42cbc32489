//! Metric helpers
//!
//! Uses the `metrics` facade only; installing a recorder is left to the host.

use std::time::Duration;

use metrics::{counter, histogram};

/// Record a cache lookup and what the validator made of it
pub fn record_cache_lookup(tier: &str, verdict: &str) {
    let labels = [("tier", tier.to_string()), ("verdict", verdict.to_string())];

    counter!("prep_cache_lookups_total", &labels).increment(1);
}

/// Record a generation call
pub fn record_generation(scope: &str, provider: &str, success: bool, duration: Duration) {
    let labels = [
        ("scope", scope.to_string()),
        ("provider", provider.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("prep_generations_total", &labels).increment(1);
    histogram!("prep_generation_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record a denied rate limit check
pub fn record_rate_limit_denied() {
    counter!("prep_rate_limit_denied_total").increment(1);
}

/// Record a swallowed storage failure
pub fn record_storage_error(tier: &str, operation: &str) {
    let labels = [
        ("tier", tier.to_string()),
        ("operation", operation.to_string()),
    ];

    counter!("prep_storage_errors_total", &labels).increment(1);
}
