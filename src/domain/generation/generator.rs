//! Content generator trait

use async_trait::async_trait;

use super::request::{GenerationRequest, GenerationResponse};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Produces interview prep content for a search
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationResponse, DomainError>;
}
