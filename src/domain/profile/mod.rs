//! Profile domain - The candidate's saved resume and provider preferences

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::generation::Provider;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Saved candidate profile
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_keys: HashMap<Provider, String>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&Provider> = self.api_keys.keys().collect();
        providers.sort();

        f.debug_struct("Profile")
            .field("resume_chars", &self.resume_text.chars().count())
            .field("preferred_provider", &self.preferred_provider)
            .field("preferred_model", &self.preferred_model)
            .field("api_keys_for", &providers)
            .finish()
    }
}

impl Profile {
    pub fn with_api_key(mut self, provider: Provider, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider, key.into());
        self
    }

    pub fn with_resume(mut self, resume_text: impl Into<String>) -> Self {
        self.resume_text = resume_text.into();
        self
    }

    pub fn with_preference(mut self, provider: Provider, model: Option<String>) -> Self {
        self.preferred_provider = Some(provider);
        self.preferred_model = model;
        self
    }

    /// Non-blank credential configured for `provider`
    pub fn credential_for(&self, provider: Provider) -> Option<&str> {
        self.api_keys
            .get(&provider)
            .map(String::as_str)
            .filter(|key| !key.trim().is_empty())
    }

    pub fn has_credential(&self, provider: Provider) -> bool {
        self.credential_for(provider).is_some()
    }
}

/// Source of the candidate profile
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the current profile
    async fn fetch_profile(&self) -> Result<Profile, DomainError>;

    /// Persists new resume text
    async fn update_resume(&self, resume_text: String) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_for_ignores_blank_keys() {
        let profile = Profile::default()
            .with_api_key(Provider::Groq, "gsk-123")
            .with_api_key(Provider::Gemini, "   ");

        assert_eq!(profile.credential_for(Provider::Groq), Some("gsk-123"));
        assert!(!profile.has_credential(Provider::Gemini));
        assert!(!profile.has_credential(Provider::OpenAi));
    }

    #[test]
    fn test_debug_hides_keys_and_resume() {
        let profile = Profile::default()
            .with_resume("private resume")
            .with_api_key(Provider::OpenAi, "sk-secret");

        let debug = format!("{:?}", profile);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("private resume"));
        assert!(debug.contains("OpenAi"));
    }

    #[test]
    fn test_api_keys_never_serialized() {
        let profile = Profile::default().with_api_key(Provider::Groq, "gsk-123");
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("gsk-123"));
    }
}
