//! In-memory profile store

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::profile::{Profile, ProfileStore};
use crate::domain::DomainError;

/// Profile held in process memory, seeded from configuration
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profile: RwLock<Profile>,
}

impl InMemoryProfileStore {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile: RwLock::new(profile),
        }
    }

    /// Seeds the resume from a text file
    pub async fn load_resume(&self, path: &Path) -> Result<(), DomainError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!("Failed to read resume {}: {}", path.display(), e))
        })?;

        self.profile.write().await.resume_text = text;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(&self) -> Result<Profile, DomainError> {
        Ok(self.profile.read().await.clone())
    }

    async fn update_resume(&self, resume_text: String) -> Result<(), DomainError> {
        debug!(chars = resume_text.chars().count(), "Resume saved");
        self.profile.write().await.resume_text = resume_text;
        Ok(())
    }
}
