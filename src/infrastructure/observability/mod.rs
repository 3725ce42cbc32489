//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{
    record_cache_lookup, record_generation, record_rate_limit_denied, record_storage_error,
};
