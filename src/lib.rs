//! Prep Cache
//!
//! Generation cache and session engine for interview-prep content:
//! - Two-tier cache (session TTL tier + durable last-fetched tier)
//! - Context-aware staleness validation with scoped `match` patches
//! - Sliding-window rate limiting per user
//! - Session restoration from URL parameters or a durable snapshot

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use domain::clock::SystemClock;
use domain::generation::{GenerationSettings, Provider};
use domain::profile::Profile;
use domain::rate_limit::RateLimitConfig;
use infrastructure::generation::{HttpClient, HttpGenerator};
use infrastructure::profile::InMemoryProfileStore;
use infrastructure::rate_limit::RateLimiter;
use infrastructure::services::{
    GenerationOrchestrator, OrchestratorConfig, ResumeAutosaver, SessionRestorer,
    TieredCacheConfig, TieredCacheStore,
};
use infrastructure::storage::{StoreConfig, StoreFactory, StoreType};
use tracing::{info, warn};

/// A wired prep session
#[derive(Debug, Clone)]
pub struct PrepSession {
    pub orchestrator: GenerationOrchestrator,
    pub restorer: SessionRestorer,
    pub cache: Arc<TieredCacheStore>,
}

/// Builds a session with every service wired from `config`
pub async fn create_session(config: &AppConfig) -> anyhow::Result<PrepSession> {
    let factory = StoreFactory::new();

    let session_store = factory.create(
        &StoreConfig::in_memory().with_max_capacity(config.storage.session_max_capacity),
    )?;

    let durable_config = match config.storage.durable {
        StoreType::InMemory => StoreConfig::in_memory(),
        StoreType::File => {
            let store = StoreConfig::file(&config.storage.durable_path);
            match config.storage.durable_max_bytes {
                Some(max_bytes) => store.with_max_bytes(max_bytes),
                None => store,
            }
        }
    };
    let durable_store = factory.create(&durable_config)?;

    info!(
        session = %session_store.name(),
        durable = %durable_store.name(),
        namespace = %config.storage.namespace,
        "Storage tiers initialized"
    );

    let clock = Arc::new(SystemClock);
    let cache = Arc::new(TieredCacheStore::new(
        session_store,
        durable_store,
        clock.clone(),
        TieredCacheConfig::default()
            .with_namespace(config.storage.namespace.clone())
            .with_session_ttl(Duration::from_millis(config.storage.session_ttl_ms)),
    ));

    let limiter = Arc::new(RateLimiter::with_clock(
        RateLimitConfig::new(
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        ),
        clock,
    ));

    let client = HttpClient::with_timeout(Duration::from_secs(config.generation.timeout_secs))?;
    let generator = Arc::new(HttpGenerator::new(client, config.generation.endpoint.clone()));

    let profile_store = Arc::new(InMemoryProfileStore::new(seed_profile(config)));
    if let Some(path) = &config.profile.resume_path {
        profile_store.load_resume(Path::new(path)).await?;
    }

    let autosave = ResumeAutosaver::new(
        profile_store.clone(),
        Duration::from_millis(config.session.autosave_debounce_ms),
    );

    let orchestrator = GenerationOrchestrator::new(
        cache.clone(),
        limiter,
        generator,
        profile_store,
        autosave,
        OrchestratorConfig::default()
            .with_user_id(config.session.user_id.clone())
            .with_settings(
                GenerationSettings::new(config.generation.provider)
                    .with_model(config.generation.model.clone()),
            )
            .with_patch_debounce(Duration::from_millis(config.session.patch_debounce_ms))
            .with_progress_interval(Duration::from_millis(config.session.progress_interval_ms)),
    );

    Ok(PrepSession {
        restorer: SessionRestorer::new(orchestrator.clone()),
        orchestrator,
        cache,
    })
}

fn seed_profile(config: &AppConfig) -> Profile {
    let mut profile = Profile::default();

    for (name, key) in &config.profile.api_keys {
        match name.parse::<Provider>() {
            Ok(provider) => profile = profile.with_api_key(provider, key.clone()),
            Err(e) => warn!(provider = %name, error = %e, "Ignoring API key for unknown provider"),
        }
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::ViewState;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: String) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.durable = StoreType::InMemory;
        config.generation.endpoint = endpoint;
        config
            .profile
            .api_keys
            .insert("groq".to_string(), "gsk-test".to_string());
        config
            .profile
            .api_keys
            .insert("mistral".to_string(), "ignored".to_string());
        config
    }

    #[tokio::test]
    async fn test_wired_session_generates_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("Authorization", "Bearer gsk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "recon": {"name": "Google"},
                "questions": {"questions": ["Why Google?"]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = create_session(&test_config(format!("{}/generate", server.uri())))
            .await
            .unwrap();
        session.orchestrator.load_profile().await.unwrap();

        let first = session.orchestrator.analyze("Google").await.unwrap();
        let second = session.orchestrator.analyze("google").await.unwrap();

        assert_eq!(first.state, ViewState::Dashboard);
        assert_eq!(second.sections, first.sections);
        assert!(session.cache.stats().await.has_snapshot);
    }

    #[test]
    fn test_seed_profile_skips_unknown_providers() {
        let profile = seed_profile(&test_config("http://localhost".to_string()));

        assert!(profile.has_credential(Provider::Groq));
        assert!(!profile.has_credential(Provider::OpenAi));
    }
}
