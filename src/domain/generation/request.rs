//! Generation request and response types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::provider::Provider;
use crate::domain::cache::{Section, Sections};
use crate::domain::context::{ContextFingerprint, LiveContext};
use crate::domain::search::SearchTarget;

/// Provider selection for a call
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Credential for `provider`; travels as a header, never in the body
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GenerationSettings {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            model: None,
            api_key: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Which sections a call produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GenerationScope {
    All,
    Only(Section),
}

impl GenerationScope {
    pub fn includes(&self, section: Section) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => *only == section,
        }
    }
}

impl fmt::Display for GenerationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(section) => write!(f, "only:{}", section),
        }
    }
}

impl From<GenerationScope> for String {
    fn from(scope: GenerationScope) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for GenerationScope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "all" {
            return Ok(Self::All);
        }

        value
            .strip_prefix("only:")
            .and_then(|name| Section::ALL.into_iter().find(|s| s.as_str() == name))
            .map(Self::Only)
            .ok_or_else(|| format!("Invalid generation scope: {}", value))
    }
}

/// Input to the content generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub company: String,
    pub position: String,
    pub round: String,
    pub resume_text: String,
    pub stories_text: String,
    pub settings: GenerationSettings,
    pub force_refresh: bool,
    pub scope: GenerationScope,
}

impl GenerationRequest {
    pub fn new(
        target: &SearchTarget,
        context: &LiveContext,
        settings: GenerationSettings,
        force_refresh: bool,
    ) -> Self {
        Self {
            company: target.company.clone(),
            position: target.position.clone(),
            round: target.round.clone(),
            resume_text: context.resume_text.clone(),
            stories_text: context.stories_text(),
            settings,
            force_refresh,
            scope: GenerationScope::All,
        }
    }

    pub fn scoped(mut self, section: Section) -> Self {
        self.scope = GenerationScope::Only(section);
        self
    }

    pub fn target(&self) -> SearchTarget {
        SearchTarget::new(&self.company, &self.position, &self.round)
    }

    /// Context presence of the texts this request carries
    pub fn fingerprint(&self) -> ContextFingerprint {
        ContextFingerprint::of_texts(&self.resume_text, &self.stories_text)
    }
}

/// Output of the content generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(flatten)]
    pub sections: Sections,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResponse {
    pub fn new(sections: Sections) -> Self {
        Self {
            sections,
            from_cache: false,
            error: None,
        }
    }
}
