//! Cache key normalization

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default namespace prefix for prep cache keys
pub const DEFAULT_NAMESPACE: &str = "prep_cache:";

const KEY_DELIMITER: &str = "-";

/// Normalized identifier for a (company, position, round) search
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lower-cases and trims each field, then joins them with `-`.
///
/// Fields that themselves contain `-` can collide with other searches; that is
/// accepted since company, position and round names rarely do.
pub fn normalize(company: &str, position: &str, round: &str) -> String {
    [company, position, round]
        .iter()
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

/// Builds namespaced cache keys
#[derive(Debug, Clone)]
pub struct CacheKeyNormalizer {
    namespace: String,
}

impl Default for CacheKeyNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl CacheKeyNormalizer {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self, company: &str, position: &str, round: &str) -> CacheKey {
        CacheKey(format!(
            "{}{}",
            self.namespace,
            normalize(company, position, round)
        ))
    }
}
