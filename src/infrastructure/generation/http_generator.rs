//! Content generator backed by a remote generation endpoint

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::http_client::HttpClientTrait;
use crate::domain::generation::{ContentGenerator, GenerationRequest, GenerationResponse};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_generation;

/// Posts generation requests as JSON to a configured endpoint
#[derive(Debug)]
pub struct HttpGenerator<C: HttpClientTrait> {
    client: C,
    endpoint: String,
}

impl<C: HttpClientTrait> HttpGenerator<C> {
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<C: HttpClientTrait> ContentGenerator for HttpGenerator<C> {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, DomainError> {
        let provider = request.settings.provider;
        let scope = request.scope.to_string();

        let api_key = request
            .settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DomainError::authorization(
                    provider.as_str(),
                    format!("No API key configured for {}", provider),
                )
            })?;

        let body = serde_json::to_value(&request)
            .map_err(|e| DomainError::internal(format!("Failed to serialize request: {}", e)))?;

        let auth = format!("Bearer {}", api_key);
        let mut headers = vec![("Authorization", auth.as_str()), ("X-Provider", provider.as_str())];
        if let Some(model) = request.settings.model.as_deref() {
            headers.push(("X-Model", model));
        }

        debug!(
            endpoint = %self.endpoint,
            provider = %provider,
            scope = %scope,
            company = %request.company,
            "Calling generation endpoint"
        );

        let started = Instant::now();
        let result = self
            .client
            .post_json(&self.endpoint, headers, &body)
            .await
            .map_err(|e| DomainError::provider(provider.as_str(), e.user_message()))
            .and_then(|value| {
                serde_json::from_value::<GenerationResponse>(value).map_err(|e| {
                    DomainError::provider(
                        provider.as_str(),
                        format!("Malformed generation response: {}", e),
                    )
                })
            })
            .and_then(|response| match response.error {
                Some(error) => Err(DomainError::provider(provider.as_str(), error)),
                None => Ok(response),
            });

        record_generation(&scope, provider.as_str(), result.is_ok(), started.elapsed());

        if let Err(e) = &result {
            warn!(provider = %provider, scope = %scope, error = %e, "Generation failed");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::Section;
    use crate::domain::context::LiveContext;
    use crate::domain::generation::{GenerationSettings, Provider};
    use crate::domain::search::SearchTarget;
    use crate::infrastructure::generation::http_client::mock::MockHttpClient;
    use crate::infrastructure::generation::HttpClient;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(api_key: Option<&str>) -> GenerationRequest {
        let mut settings = GenerationSettings::new(Provider::Gemini)
            .with_model(Some("gemini-2.0-flash".to_string()));
        if let Some(key) = api_key {
            settings = settings.with_api_key(key);
        }

        GenerationRequest::new(
            &SearchTarget::new("Google", "SWE", "Technical"),
            &LiveContext::new("Ten years building distributed systems", vec![]),
            settings,
            false,
        )
    }

    #[tokio::test]
    async fn test_posts_request_with_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("X-Provider", "gemini"))
            .and(header("X-Model", "gemini-2.0-flash"))
            .and(body_partial_json(json!({
                "company": "Google",
                "scope": "only:match",
                "settings": {"provider": "gemini"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "match": {"headline": "Strong fit"},
                "fromCache": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(HttpClient::new(), format!("{}/generate", server.uri()));

        let response = generator
            .generate(request(Some("test-key")).scoped(Section::Match))
            .await
            .unwrap();

        assert_eq!(response.sections.present(), vec![Section::Match]);
    }

    #[tokio::test]
    async fn test_http_error_maps_to_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(HttpClient::new(), server.uri());

        let error = generator.generate(request(Some("key"))).await.unwrap_err();

        match &error {
            DomainError::Provider { provider, message } => {
                assert_eq!(provider, "gemini");
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(error.is_quota_like());
    }

    #[tokio::test]
    async fn test_error_field_in_body_is_failure() {
        let client = MockHttpClient::new().with_response(
            "http://gen.test",
            json!({"error": "RESOURCE_EXHAUSTED", "fromCache": false}),
        );
        let generator = HttpGenerator::new(client, "http://gen.test");

        let result = generator.generate(request(Some("key"))).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_endpoint() {
        let generator = HttpGenerator::new(MockHttpClient::new(), "http://gen.test");

        let result = generator.generate(request(None)).await;

        assert!(matches!(result, Err(DomainError::Authorization { .. })));
        assert!(generator.client.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_body_never_contains_key() {
        let client = MockHttpClient::new()
            .with_response("http://gen.test", json!({"recon": {"name": "Google"}}));
        let generator = HttpGenerator::new(client, "http://gen.test");

        generator.generate(request(Some("very-secret"))).await.unwrap();

        let bodies = generator.client.bodies();
        assert_eq!(bodies.len(), 1);
        assert!(!bodies[0].to_string().contains("very-secret"));
    }
}
