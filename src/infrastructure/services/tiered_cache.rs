//! Two-tier cache of generated prep content
//!
//! The session tier holds entries for the life of the session, bounded by a
//! TTL. The durable tier survives restarts and holds only the restoration
//! snapshot and the last fetched entry. Storage failures never leave this
//! module: they are logged, counted and treated as a miss.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::cache::{
    CacheEntry, CacheKey, CacheKeyNormalizer, LastFetched, SessionSnapshot, DEFAULT_NAMESPACE,
};
use crate::domain::clock::Clock;
use crate::domain::search::SearchTarget;
use crate::domain::storage::{KeyValueStore, StoreExt};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_storage_error;

const SNAPSHOT_SUFFIX: &str = "~snapshot";
const LAST_FETCHED_SUFFIX: &str = "~last";

/// Default session-tier TTL (one hour)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_millis(3_600_000);

/// Storage tier an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Session,
    Durable,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Durable => "durable",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry found by `lookup`, with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub entry: CacheEntry,
    pub tier: Tier,
}

/// Configuration for the tiered cache
#[derive(Debug, Clone)]
pub struct TieredCacheConfig {
    /// Prefix for every key this store writes
    pub namespace: String,
    /// Session-tier time-to-live
    pub session_ttl: Duration,
}

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl TieredCacheConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

/// Point-in-time counts for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub session_entries: usize,
    pub has_snapshot: bool,
    pub last_fetched: Option<CacheKey>,
}

/// Session and durable tiers behind one interface
#[derive(Debug)]
pub struct TieredCacheStore {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    normalizer: CacheKeyNormalizer,
    config: TieredCacheConfig,
}

impl TieredCacheStore {
    pub fn new(
        session: Arc<dyn KeyValueStore>,
        durable: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: TieredCacheConfig,
    ) -> Self {
        Self {
            session,
            durable,
            clock,
            normalizer: CacheKeyNormalizer::new(config.namespace.clone()),
            config,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }

    /// TTL the validator should apply to entries from `tier`.
    ///
    /// The durable last-fetched record mirrors a session write, so it ages out
    /// on the session TTL as well. Only the snapshot is kept without expiry.
    pub fn ttl_for(&self, tier: Tier) -> Option<Duration> {
        match tier {
            Tier::Session | Tier::Durable => Some(self.config.session_ttl),
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn key(&self, target: &SearchTarget) -> CacheKey {
        self.normalizer
            .key(&target.company, &target.position, &target.round)
    }

    fn snapshot_key(&self) -> String {
        format!("{}{}", self.config.namespace, SNAPSHOT_SUFFIX)
    }

    fn last_fetched_key(&self) -> String {
        format!("{}{}", self.config.namespace, LAST_FETCHED_SUFFIX)
    }

    fn swallow<T>(&self, tier: Tier, operation: &str, result: Result<T, DomainError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(tier = %tier, operation = %operation, error = %e, "Cache storage failure ignored");
                record_storage_error(tier.as_str(), operation);
                None
            }
        }
    }

    /// Session-tier entry for `key`; expired entries are evicted and reported absent
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let result = self.session.get::<CacheEntry>(key.as_str()).await;
        let entry = self.swallow(Tier::Session, "get", result).flatten()?;

        let age_ms = entry.age_millis(self.now_millis());
        if age_ms > self.config.session_ttl.as_millis() as i64 {
            debug!(key = %key, age_ms = age_ms, "Evicting expired session entry");
            let removed = self.session.remove(key.as_str()).await;
            self.swallow(Tier::Session, "evict", removed);
            return None;
        }

        Some(entry)
    }

    /// Session tier first, then the durable last-fetched entry if it is for `key`
    pub async fn lookup(&self, key: &CacheKey) -> Option<CacheLookup> {
        if let Some(entry) = self.get(key).await {
            return Some(CacheLookup {
                entry,
                tier: Tier::Session,
            });
        }

        let last = self.last_fetched().await?;
        if last.key != *key {
            return None;
        }

        debug!(key = %key, "Rehydrating from durable last-fetched entry");
        Some(CacheLookup {
            entry: last.entry,
            tier: Tier::Durable,
        })
    }

    /// The most recently written entry, whatever its key
    pub async fn last_fetched(&self) -> Option<LastFetched> {
        let result = self
            .durable
            .get::<LastFetched>(&self.last_fetched_key())
            .await;
        self.swallow(Tier::Durable, "get_last", result).flatten()
    }

    /// Replaces the entry for `key` and mirrors it as the durable last-fetched record
    pub async fn put(&self, key: &CacheKey, entry: &CacheEntry) {
        let result = self.session.set(key.as_str(), entry).await;
        self.swallow(Tier::Session, "put", result);

        let last = LastFetched {
            key: key.clone(),
            entry: entry.clone(),
        };
        let result = self.durable.set(&self.last_fetched_key(), &last).await;
        self.swallow(Tier::Durable, "put_last", result);

        debug!(key = %key, sections = entry.sections.present().len(), "Cache entry written");
    }

    pub async fn remove(&self, key: &CacheKey) -> bool {
        let result = self.session.remove(key.as_str()).await;
        self.swallow(Tier::Session, "remove", result)
            .unwrap_or(false)
    }

    /// Removes everything under `prefix` from both tiers, including a durable
    /// last-fetched entry whose key matches. Returns how many records went.
    pub async fn clear(&self, prefix: &str) -> usize {
        let mut removed = 0;

        let last_matches = self
            .last_fetched()
            .await
            .is_some_and(|last| last.key.starts_with(prefix));

        let result = self.session.clear_prefix(prefix).await;
        removed += self.swallow(Tier::Session, "clear", result).unwrap_or(0);

        let result = self.durable.clear_prefix(prefix).await;
        removed += self.swallow(Tier::Durable, "clear", result).unwrap_or(0);

        if last_matches {
            let result = self.durable.remove(&self.last_fetched_key()).await;
            if self.swallow(Tier::Durable, "clear_last", result) == Some(true) {
                removed += 1;
            }
        }

        debug!(prefix = %prefix, removed = removed, "Cache cleared");
        removed
    }

    pub async fn save_snapshot(&self, snapshot: &SessionSnapshot) {
        let result = self.durable.set(&self.snapshot_key(), snapshot).await;
        self.swallow(Tier::Durable, "save_snapshot", result);
    }

    pub async fn load_snapshot(&self) -> Option<SessionSnapshot> {
        let result = self
            .durable
            .get::<SessionSnapshot>(&self.snapshot_key())
            .await;
        self.swallow(Tier::Durable, "load_snapshot", result).flatten()
    }

    pub async fn clear_snapshot(&self) {
        let result = self.durable.remove(&self.snapshot_key()).await;
        self.swallow(Tier::Durable, "clear_snapshot", result);
    }

    pub async fn stats(&self) -> CacheStats {
        let result = self.session.len().await;
        let session_entries = self.swallow(Tier::Session, "len", result).unwrap_or(0);

        CacheStats {
            session_entries,
            has_snapshot: self.load_snapshot().await.is_some(),
            last_fetched: self.last_fetched().await.map(|last| last.key),
        }
    }
}
