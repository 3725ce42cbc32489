//! Domain layer - Core prep session rules and entities

pub mod cache;
pub mod clock;
pub mod context;
pub mod error;
pub mod generation;
pub mod profile;
pub mod rate_limit;
pub mod search;
pub mod session;
pub mod storage;

pub use cache::{
    CacheEntry, CacheKey, CacheKeyNormalizer, LastFetched, Section, Sections, SessionSnapshot,
    StaleReason, StalenessValidator, Verdict,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextFingerprint, LiveContext, StarStory};
pub use error::DomainError;
pub use generation::{
    ContentGenerator, GenerationRequest, GenerationResponse, GenerationScope, GenerationSettings,
    Provider,
};
pub use profile::{Profile, ProfileStore};
pub use rate_limit::{RateLimitConfig, RateLimitDecision};
pub use search::{parse_search_query, SearchParams, SearchTarget};
pub use session::{DashboardView, ErrorView, FailureKind, RestoreSource, ViewState};
pub use storage::{KeyValueStore, StoreExt};
