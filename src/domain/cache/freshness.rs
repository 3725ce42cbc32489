//! Staleness validation for cached entries

use std::time::Duration;

use serde::Serialize;

use super::entry::{CacheEntry, Section};
use crate::domain::context::ContextFingerprint;

/// Why a cached entry can't be shown as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StaleReason {
    /// Context presence differs between generation time and now
    ContextChanged { cached: bool, live: bool },
    /// Entry outlived the tier's time-to-live
    Expired { age_ms: i64 },
}

/// Result of checking an entry against the live context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Fresh,
    /// Usable, but some sections need to be generated on top
    Partial { missing: Vec<Section> },
    Stale(StaleReason),
}

impl Verdict {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Partial { .. } => "partial",
            Self::Stale(StaleReason::ContextChanged { .. }) => "context_changed",
            Self::Stale(StaleReason::Expired { .. }) => "expired",
        }
    }
}

/// Decides whether a cached entry still reflects the live context
#[derive(Debug, Clone, Copy, Default)]
pub struct StalenessValidator;

impl StalenessValidator {
    /// Checks `entry` against the live context.
    ///
    /// `ttl` applies only when the entry came from a tier that expires; durable
    /// hits pass `None`.
    pub fn validate(
        &self,
        entry: &CacheEntry,
        live: &ContextFingerprint,
        now_millis: i64,
        ttl: Option<Duration>,
    ) -> Verdict {
        if let Some(ttl) = ttl {
            let age_ms = entry.age_millis(now_millis);
            if age_ms > ttl.as_millis() as i64 {
                return Verdict::Stale(StaleReason::Expired { age_ms });
            }
        }

        let live_has_context = live.has_context();
        if entry.has_context != live_has_context {
            return Verdict::Stale(StaleReason::ContextChanged {
                cached: entry.has_context,
                live: live_has_context,
            });
        }

        let missing: Vec<Section> = Section::ALL
            .into_iter()
            .filter(|section| section.depends_on_context())
            .filter(|section| live_has_context && !entry.sections.has(*section))
            .collect();

        if missing.is_empty() {
            Verdict::Fresh
        } else {
            Verdict::Partial { missing }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::Sections;
    use crate::domain::search::SearchTarget;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn entry(has_context: bool, with_match: bool, timestamp: i64) -> CacheEntry {
        let mut sections = Sections::default().with(Section::Recon, json!({"name": "Google"}));
        if with_match {
            sections.set(Section::Match, json!({"headline": "strong fit"}));
        }
        CacheEntry::new(
            &SearchTarget::new("Google", "SWE", "Technical"),
            has_context,
            sections,
            timestamp,
        )
    }

    fn with_context() -> ContextFingerprint {
        ContextFingerprint::new(120, 0)
    }

    fn without_context() -> ContextFingerprint {
        ContextFingerprint::new(0, 0)
    }

    #[test]
    fn test_fresh_when_context_matches() {
        let verdict = StalenessValidator.validate(&entry(true, true, NOW), &with_context(), NOW, None);
        assert_eq!(verdict, Verdict::Fresh);

        let verdict =
            StalenessValidator.validate(&entry(false, false, NOW), &without_context(), NOW, None);
        assert!(verdict.is_fresh());
    }

    #[test]
    fn test_stale_when_context_added() {
        let verdict =
            StalenessValidator.validate(&entry(false, false, NOW), &with_context(), NOW, None);

        assert_eq!(
            verdict,
            Verdict::Stale(StaleReason::ContextChanged {
                cached: false,
                live: true
            })
        );
    }

    #[test]
    fn test_stale_when_context_removed() {
        let verdict =
            StalenessValidator.validate(&entry(true, true, NOW), &without_context(), NOW, None);

        assert!(verdict.is_stale());
        assert_eq!(verdict.label(), "context_changed");
    }

    #[test]
    fn test_partial_when_match_missing() {
        let verdict =
            StalenessValidator.validate(&entry(true, false, NOW), &with_context(), NOW, None);

        assert_eq!(
            verdict,
            Verdict::Partial {
                missing: vec![Section::Match]
            }
        );
    }

    #[test]
    fn test_expired_beats_context_check() {
        let ttl = Duration::from_secs(60);
        let old = entry(false, false, NOW - 61_000);

        let verdict = StalenessValidator.validate(&old, &with_context(), NOW, Some(ttl));

        assert_eq!(verdict, Verdict::Stale(StaleReason::Expired { age_ms: 61_000 }));
    }

    #[test]
    fn test_ttl_boundary_is_still_valid() {
        let ttl = Duration::from_secs(60);
        let edge = entry(true, true, NOW - 60_000);

        let verdict = StalenessValidator.validate(&edge, &with_context(), NOW, Some(ttl));

        assert!(verdict.is_fresh());
    }

    #[test]
    fn test_stories_alone_count_as_context() {
        let live = ContextFingerprint::new(0, 2);
        let verdict = StalenessValidator.validate(&entry(true, true, NOW), &live, NOW, None);
        assert!(verdict.is_fresh());
    }
}
