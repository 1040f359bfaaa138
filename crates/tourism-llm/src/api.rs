//! HTTP generator for Ollama, OpenAI-compatible and Anthropic endpoints.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use tourism_types::GeneratorSettings;

use crate::error::GeneratorError;
use crate::generator::{GenerationRequest, TextGenerator};
use crate::response::GenerationResponse;

/// Supported backend APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Local Ollama server (`/api/generate`)
    Ollama,
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Ollama => "http://localhost:11434",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Provider {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => Err(GeneratorError::ConfigError(format!(
                "unknown provider: {other}"
            ))),
        }
    }
}

/// Configuration for [`ApiGenerator`].
#[derive(Debug, Clone)]
pub struct ApiGeneratorConfig {
    pub provider: Provider,

    /// API base URL (e.g., "http://localhost:11434")
    pub base_url: String,

    /// Model used when a request leaves it empty
    pub model: String,

    /// API key, unused by Ollama
    pub api_key: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,

    /// Total attempts per invocation; 1 disables transport retry
    pub max_retries: u32,

    /// First backoff delay between attempts
    pub initial_backoff: Duration,
}

impl ApiGeneratorConfig {
    /// Config for a local Ollama server.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            provider: Provider::Ollama,
            base_url: Provider::Ollama.default_base_url().to_string(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(120),
            max_retries: 1,
            initial_backoff: Duration::from_millis(500),
        }
    }

    /// Config for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Provider::OpenAi,
            base_url: Provider::OpenAi.default_base_url().to_string(),
            api_key: Some(SecretString::from(api_key.into())),
            ..Self::ollama(model)
        }
    }

    /// Config for the Anthropic API.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Provider::Anthropic,
            base_url: Provider::Anthropic.default_base_url().to_string(),
            api_key: Some(SecretString::from(api_key.into())),
            ..Self::ollama(model)
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, GeneratorError> {
        let provider: Provider = settings.provider.parse()?;
        let api_key = settings
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::from(k.clone()));

        if provider.requires_api_key() && api_key.is_none() {
            return Err(GeneratorError::ConfigError(format!(
                "provider {provider} requires an API key"
            )));
        }

        Ok(Self {
            provider,
            base_url: settings
                .api_base_url
                .clone()
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            model: settings.model.clone(),
            api_key,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries.max(1),
            initial_backoff: Duration::from_millis(500),
        })
    }
}

/// HTTP-backed [`TextGenerator`].
pub struct ApiGenerator {
    client: Client,
    config: ApiGeneratorConfig,
}

impl ApiGenerator {
    pub fn new(config: ApiGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, GeneratorError> {
        Self::new(ApiGeneratorConfig::from_settings(settings)?)
    }

    pub fn config(&self) -> &ApiGeneratorConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> &str {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .unwrap_or_default()
    }

    /// Call the API with retry logic.
    async fn call_api(&self, model: &str, prompt: &str) -> Result<String, GeneratorError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            current_interval: self.config.initial_backoff,
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, provider = %self.config.provider, model, "Calling generation API");

            match self.make_request(model, prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        error!(error = %e, attempts, "Generation failed");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "API call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn make_request(&self, model: &str, prompt: &str) -> Result<String, GeneratorError> {
        match self.config.provider {
            Provider::Ollama => self.make_ollama_request(model, prompt).await,
            Provider::OpenAi => self.make_openai_request(model, prompt).await,
            Provider::Anthropic => self.make_anthropic_request(model, prompt).await,
        }
    }

    async fn make_ollama_request(&self, model: &str, prompt: &str) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            response: String,
        }

        let request = OllamaRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;
        Ok(body.response)
    }

    async fn make_openai_request(&self, model: &str, prompt: &str) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            model: &'a str,
            messages: Vec<OpenAIMessage<'a>>,
        }

        #[derive(Serialize)]
        struct OpenAIMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            choices: Vec<OpenAIChoice>,
        }

        #[derive(Deserialize)]
        struct OpenAIChoice {
            message: OpenAIMessageResponse,
        }

        #[derive(Deserialize)]
        struct OpenAIMessageResponse {
            content: String,
        }

        let request = OpenAIRequest {
            model,
            messages: vec![OpenAIMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.url("/chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GeneratorError::ParseError("No choices in response".to_string()))
    }

    async fn make_anthropic_request(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        struct AnthropicRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            messages: Vec<AnthropicMessage<'a>>,
        }

        #[derive(Serialize)]
        struct AnthropicMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            text: String,
        }

        let request = AnthropicRequest {
            model,
            max_tokens: 1024,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.url("/messages"))
            .header("x-api-key", self.api_key())
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;

        body.content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| GeneratorError::ParseError("No content in response".to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GeneratorError> {
    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeneratorError::RateLimitExceeded);
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(GeneratorError::ApiError(format!("HTTP {}: {}", status, body)));
    }

    Ok(response)
}

#[async_trait]
impl TextGenerator for ApiGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GeneratorError> {
        let model = if request.model.trim().is_empty() {
            self.config.model.as_str()
        } else {
            request.model.as_str()
        };
        let text = self.call_api(model, &request.prompt).await?;
        Ok(GenerationResponse::from_backend_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ollama_at(server: &MockServer) -> ApiGenerator {
        ApiGenerator::new(ApiGeneratorConfig::ollama("qwen:0.5b").with_base_url(server.uri()))
            .unwrap()
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("Ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert_eq!("claude".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("gemini".parse::<Provider>().is_err());
    }

    #[test]
    fn test_from_settings_defaults_to_local_ollama() {
        let config = ApiGeneratorConfig::from_settings(&GeneratorSettings::default()).unwrap();
        assert_eq!(config.provider, Provider::Ollama);
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "qwen:0.5b");
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_from_settings_requires_key_for_hosted() {
        let settings = GeneratorSettings {
            provider: "openai".to_string(),
            ..GeneratorSettings::default()
        };
        assert!(matches!(
            ApiGeneratorConfig::from_settings(&settings),
            Err(GeneratorError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_ollama_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"model": "llama3", "stream": false})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "Gondar castles"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = ollama_at(&server)
            .generate(GenerationRequest::new("llama3", "Tell me about Gondar"))
            .await
            .unwrap();
        assert_eq!(response.into_text(), "Gondar castles");
    }

    #[tokio::test]
    async fn test_empty_model_uses_configured_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"model": "qwen:0.5b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = ollama_at(&server)
            .generate(GenerationRequest::new("", "prompt"))
            .await
            .unwrap();
        assert_eq!(response.as_text(), "ok");
    }

    #[tokio::test]
    async fn test_structured_body_is_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "{\"answer\": \"Axum\"}"})),
            )
            .mount(&server)
            .await;

        let response = ollama_at(&server)
            .generate(GenerationRequest::new("m", "p"))
            .await
            .unwrap();
        assert_eq!(
            response,
            GenerationResponse::StructuredAnswer {
                text: "Axum".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_openai_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Harar"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = ApiGenerator::new(
            ApiGeneratorConfig::openai("test-key", "gpt-4o-mini").with_base_url(server.uri()),
        )
        .unwrap();
        let response = generator
            .generate(GenerationRequest::new("gpt-4o-mini", "p"))
            .await
            .unwrap();
        assert_eq!(response.into_text(), "Harar");
    }

    #[tokio::test]
    async fn test_anthropic_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Lalibela"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = ApiGenerator::new(
            ApiGeneratorConfig::anthropic("test-key", "claude-3-haiku-20240307")
                .with_base_url(server.uri()),
        )
        .unwrap();
        let response = generator
            .generate(GenerationRequest::new("claude-3-haiku-20240307", "p"))
            .await
            .unwrap();
        assert_eq!(response.into_text(), "Lalibela");
    }

    #[tokio::test]
    async fn test_rate_limit_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let result = ollama_at(&server)
            .generate(GenerationRequest::new("m", "p"))
            .await;
        assert!(matches!(result, Err(GeneratorError::RateLimitExceeded)));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let result = ollama_at(&server)
            .generate(GenerationRequest::new("m", "p"))
            .await;
        match result {
            Err(GeneratorError::ApiError(message)) => assert!(message.contains("model not loaded")),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retries_until_attempts_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let generator = ApiGenerator::new(
            ApiGeneratorConfig::ollama("m")
                .with_base_url(server.uri())
                .with_max_retries(3)
                .with_initial_backoff(Duration::from_millis(5)),
        )
        .unwrap();
        let result = generator.generate(GenerationRequest::new("m", "p")).await;
        assert!(matches!(result, Err(GeneratorError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .mount(&server)
            .await;

        let result = ollama_at(&server)
            .generate(GenerationRequest::new("m", "p"))
            .await;
        assert!(matches!(result, Err(GeneratorError::ParseError(_))));
    }
}
