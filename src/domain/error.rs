use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization error: {provider} - {message}")]
    Authorization { provider: String, message: String },

    #[error("{message}")]
    RateLimited { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authorization(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authorization {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user, without the variant prefix
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Authorization { message, .. }
            | Self::RateLimited { message }
            | Self::Provider { message, .. }
            | Self::Storage { message }
            | Self::Configuration { message }
            | Self::Internal { message } => message,
        }
    }

    /// Whether the message points at a quota, rate or timeout condition
    /// that switching to another provider could get around.
    pub fn is_quota_like(&self) -> bool {
        let message = self.user_message().to_lowercase();

        ["quota", "rate limit", "429", "timed out", "timeout", "resource_exhausted"]
            .iter()
            .any(|needle| message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Query is empty");
        assert_eq!(error.to_string(), "Validation error: Query is empty");
        assert_eq!(error.user_message(), "Query is empty");
    }

    #[test]
    fn test_rate_limited_error_displays_message_only() {
        let error = DomainError::rate_limited("Rate limit exceeded. Please wait 5 seconds");
        assert_eq!(
            error.to_string(),
            "Rate limit exceeded. Please wait 5 seconds"
        );
    }

    #[test]
    fn test_provider_error() {
        let error = DomainError::provider("groq", "HTTP 500: boom");
        assert_eq!(error.to_string(), "Provider error: groq - HTTP 500: boom");
    }

    #[test]
    fn test_quota_like_detection() {
        assert!(DomainError::provider("gemini", "RESOURCE_EXHAUSTED: quota").is_quota_like());
        assert!(DomainError::provider("groq", "HTTP 429: slow down").is_quota_like());
        assert!(DomainError::provider("groq", "Request timed out").is_quota_like());
        assert!(DomainError::rate_limited("Rate limit exceeded.").is_quota_like());
        assert!(!DomainError::provider("groq", "malformed payload").is_quota_like());
    }
}
