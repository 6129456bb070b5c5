use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::GeminiConfig;
use crate::models::{Speaker, Turn};
use crate::utils::limiters::Limiters;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation limiter: {0}")]
    Busy(String),

    #[error("Gemini network error: {0}")]
    Network(String),

    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed Gemini response: {0}")]
    Malformed(String),

    #[error("Gemini returned no text (finish reason: {0})")]
    Empty(String),
}

/// Stateless text generation over a conversation history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// `history` is the prior context, `prompt` the new user message.
    async fn generate(&self, history: &[Turn], prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    config: GeminiConfig,
    limiters: Arc<Limiters>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

// Response Structures
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn wire_role(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "user",
        Speaker::Assistant => "model",
    }
}

impl GeminiService {
    pub fn new(config: GeminiConfig, limiters: Arc<Limiters>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
            limiters,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiService {
    async fn generate(&self, history: &[Turn], prompt: &str) -> Result<String, GenerationError> {
        let (_permit, waited) = Limiters::acquire_timed(
            self.limiters.generation.clone(),
            self.limiters.acquire_timeout,
            "gemini_generate",
        )
        .await
        .map_err(|e| GenerationError::Busy(e.to_string()))?;

        debug!(
            "Gemini generate: {} history turns, prompt_len={}, limiter_wait={:?}",
            history.len(),
            prompt.len(),
            waited
        );

        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|turn| GeminiContent {
                role: wire_role(turn.speaker),
                parts: vec![GeminiPart { text: &turn.content }],
            })
            .collect();
        contents.push(GeminiContent {
            role: "user",
            parts: vec![GeminiPart { text: prompt }],
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&GenerateContentRequest { contents })
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error ({}): {}", status, body);
            return Err(GenerationError::Api { status, body });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Empty("NO_CANDIDATES".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty(
                candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string()),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> GeminiService {
        GeminiService::new(
            GeminiConfig {
                api_key: "test-key".to_string(),
                base_url: server.uri(),
                model: "gemini-1.5-flash".to_string(),
                timeout_seconds: 5,
            },
            Arc::new(Limiters::new(&LimitsConfig::default())),
        )
    }

    #[tokio::test]
    async fn test_generate_sends_history_with_model_role() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "persona" }] },
                    { "role": "model", "parts": [{ "text": "ok" }] },
                    { "role": "user", "parts": [{ "text": "best carry?" }] }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Try " }, { "text": "Faceless Void." }] },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let history = vec![Turn::user("persona"), Turn::assistant("ok")];
        let reply = service.generate(&history, "best carry?").await.unwrap();
        assert_eq!(reply, "Try Faceless Void.");
    }

    #[tokio::test]
    async fn test_quota_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = service_for(&server).generate(&[], "hi").await.unwrap_err();
        match err {
            GenerationError::Api { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("quota"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_blocked_candidate_is_empty_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let err = service_for(&server).generate(&[], "hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Empty(ref r) if r == "SAFETY"));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = service_for(&server).generate(&[], "hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }
}
