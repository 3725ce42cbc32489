//! Infrastructure layer - storage backends, generation transport and session services

pub mod generation;
pub mod logging;
pub mod observability;
pub mod profile;
pub mod rate_limit;
pub mod services;
pub mod storage;
pub mod timer;
