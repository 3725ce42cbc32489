use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::generation::Provider;
use crate::infrastructure::storage::StoreType;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitSettings,
    pub generation: GenerationConfig,
    pub session: SessionConfig,
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key prefix shared by every record this crate writes
    pub namespace: String,
    pub session_ttl_ms: u64,
    pub session_max_capacity: u64,
    /// Backend for the durable tier
    pub durable: StoreType,
    pub durable_path: String,
    pub durable_max_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub provider: Provider,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: String,
    pub patch_debounce_ms: u64,
    pub autosave_debounce_ms: u64,
    pub progress_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Text file seeding the resume
    pub resume_path: Option<String>,
    /// API keys by provider name
    pub api_keys: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: "prep_cache:".to_string(),
            session_ttl_ms: 3_600_000,
            session_max_capacity: 10_000,
            durable: StoreType::File,
            durable_path: ".prep-cache/durable.json".to_string(),
            durable_max_bytes: Some(5 * 1024 * 1024),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 15,
            window_secs: 60,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/generate".to_string(),
            provider: Provider::default(),
            model: None,
            timeout_secs: 60,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            patch_debounce_ms: 1500,
            autosave_debounce_ms: 2000,
            progress_interval_ms: 400,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("PREP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.storage.namespace, "prep_cache:");
        assert_eq!(config.storage.session_ttl_ms, 3_600_000);
        assert_eq!(config.rate_limit.max_requests, 15);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.generation.provider, Provider::Groq);
        assert_eq!(config.session.patch_debounce_ms, 1500);
    }

    #[test]
    fn test_partial_sources_keep_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [rate_limit]
                max_requests = 5

                [storage]
                durable = "in_memory"

                [profile.api_keys]
                openai = "sk-test"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.storage.durable, StoreType::InMemory);
        assert_eq!(config.profile.api_keys.get("openai").map(String::as_str), Some("sk-test"));
        assert_eq!(config.logging.level, "info");
    }
}
