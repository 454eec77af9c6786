//! Chat-completion client for the hosted language model.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ApiKey, Config};
use crate::error::{AppError, AppResult};
use crate::models::Language;

pub const MAX_TOKENS: u32 = 2000;
pub const TEMPERATURE: f32 = 0.7;

/// Everything sent to the model for one report. Built once per upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub system_prompt: String,
    pub user_content: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnalysisRequest {
    pub fn new(language: Language, extracted_text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system_prompt: language.system_prompt().to_string(),
            user_content: extracted_text.into(),
            model: model.into(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    fn to_chat_request(&self) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &self.system_prompt,
                },
                Message {
                    role: "user",
                    content: &self.user_content,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Something that can turn an [`AnalysisRequest`] into completion text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &AnalysisRequest) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenRouter chat-completions client. Makes exactly one attempt per call.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_key: ApiKey,
    http_client: reqwest::Client,
    completions_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: ApiKey, completions_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            http_client,
            completions_url: completions_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.openai_api_key.clone(),
            config.completions_url.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, request: &AnalysisRequest) -> AppResult<String> {
        let start = Instant::now();

        info!(
            model = %request.model,
            user_chars = request.user_content.chars().count(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&self.completions_url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request.to_chat_request())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::analysis("request to the completion service timed out")
                } else {
                    AppError::analysis(format!("failed to reach the completion service: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::analysis(format!("failed to read completion response: {}", e)))?;

        if !status.is_success() {
            warn!(status = %status, "Completion service returned an error status");
            return Err(AppError::analysis(format!(
                "completion service returned status {}: {}",
                status, body
            )));
        }

        let content = parse_completion(&body)?;

        debug!(
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            content_chars = content.chars().count(),
            "Chat completion received"
        );

        Ok(content)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion body.
pub fn parse_completion(body: &str) -> AppResult<String> {
    let chat_response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AppError::analysis(format!("unexpected completion response: {}", e)))?;

    chat_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::analysis("no choices in completion response"))?
        .message
        .content
        .ok_or_else(|| AppError::analysis("no content in completion response"))
}
