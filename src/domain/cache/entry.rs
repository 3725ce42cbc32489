//! Cached generation results

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::search::SearchTarget;

/// One independently generatable content unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Recon,
    Match,
    Questions,
    Reverse,
    Technical,
    Coding,
    SystemDesign,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Recon,
        Section::Match,
        Section::Questions,
        Section::Reverse,
        Section::Technical,
        Section::Coding,
        Section::SystemDesign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recon => "recon",
            Self::Match => "match",
            Self::Questions => "questions",
            Self::Reverse => "reverse",
            Self::Technical => "technical",
            Self::Coding => "coding",
            Self::SystemDesign => "systemDesign",
        }
    }

    /// Whether the section's content depends on the candidate's resume
    pub fn depends_on_context(&self) -> bool {
        matches!(self, Self::Match)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated content, one optional payload per section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recon: Option<Value>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_strategy: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_design: Option<Value>,
}

impl Sections {
    pub fn get(&self, section: Section) -> Option<&Value> {
        self.slot(section).as_ref()
    }

    pub fn has(&self, section: Section) -> bool {
        self.get(section).is_some()
    }

    pub fn set(&mut self, section: Section, value: Value) {
        *self.slot_mut(section) = Some(value);
    }

    pub fn with(mut self, section: Section, value: Value) -> Self {
        self.set(section, value);
        self
    }

    pub fn take(&mut self, section: Section) -> Option<Value> {
        self.slot_mut(section).take()
    }

    /// Sections that carry a payload
    pub fn present(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| self.has(*section))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }

    /// Returns a copy of `self` with every section `other` carries replacing ours
    pub fn merged_with(&self, other: &Sections) -> Sections {
        let mut merged = self.clone();

        for section in other.present() {
            if let Some(value) = other.get(section) {
                merged.set(section, value.clone());
            }
        }

        merged
    }

    fn slot(&self, section: Section) -> &Option<Value> {
        match section {
            Section::Recon => &self.recon,
            Section::Match => &self.match_strategy,
            Section::Questions => &self.questions,
            Section::Reverse => &self.reverse,
            Section::Technical => &self.technical,
            Section::Coding => &self.coding,
            Section::SystemDesign => &self.system_design,
        }
    }

    fn slot_mut(&mut self, section: Section) -> &mut Option<Value> {
        match section {
            Section::Recon => &mut self.recon,
            Section::Match => &mut self.match_strategy,
            Section::Questions => &mut self.questions,
            Section::Reverse => &mut self.reverse,
            Section::Technical => &mut self.technical,
            Section::Coding => &mut self.coding,
            Section::SystemDesign => &mut self.system_design,
        }
    }
}

/// A whole generation result for one search.
///
/// Entries are immutable once written; a newer generation for the same key
/// replaces the record instead of patching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Epoch milliseconds at creation
    pub timestamp: i64,
    pub company: String,
    pub position: String,
    pub round: String,
    /// Whether resume/story context existed when the content was generated
    pub has_context: bool,
    #[serde(flatten)]
    pub sections: Sections,
}

impl CacheEntry {
    pub fn new(target: &SearchTarget, has_context: bool, sections: Sections, timestamp: i64) -> Self {
        Self {
            timestamp,
            company: target.company.clone(),
            position: target.position.clone(),
            round: target.round.clone(),
            has_context,
            sections,
        }
    }

    pub fn target(&self) -> SearchTarget {
        SearchTarget::new(&self.company, &self.position, &self.round)
    }

    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.timestamp)
    }
}
