//! Infrastructure services

mod orchestrator;
mod resume_autosave;
mod session_restorer;
mod tiered_cache;

pub use orchestrator::{GenerationOrchestrator, OrchestratorConfig};
pub use resume_autosave::{ResumeAutosaver, DEFAULT_AUTOSAVE_DEBOUNCE};
pub use session_restorer::{RestoreOutcome, SessionRestorer};
pub use tiered_cache::{
    CacheLookup, CacheStats, Tier, TieredCacheConfig, TieredCacheStore, DEFAULT_SESSION_TTL,
};
