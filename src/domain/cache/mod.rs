//! Cache domain - Entries, keys and freshness rules for generated prep content

mod entry;
mod freshness;
mod key;
mod snapshot;

pub use entry::{CacheEntry, Section, Sections};
pub use freshness::{StaleReason, StalenessValidator, Verdict};
pub use key::{normalize, CacheKey, CacheKeyNormalizer, DEFAULT_NAMESPACE};
pub use snapshot::{LastFetched, SessionSnapshot};
