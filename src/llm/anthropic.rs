// ABOUTME: Anthropic Claude LLM provider implementation using the Messages API
// ABOUTME: Lifts the system message into the top-level system field and sends the vendor version header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Anthropic Provider
//!
//! Implementation of the [`LlmProvider`] trait for Anthropic's Claude models.
//!
//! Like the native Gemini wire format, Anthropic separates system
//! instructions from turn history: a leading `system` message becomes the
//! top-level `system` field. The API additionally requires the
//! `anthropic-version` header on every call, and response text is read from
//! `content[0].text`.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, LlmProvider, MessageRole};
use crate::errors::AppError;

/// Environment variable for Anthropic API key
const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Alternative models tried by the intra-provider fallback dimension
const FALLBACK_MODELS: &[&str] = &[
    "claude-3-5-haiku-latest",
    "claude-3-5-sonnet-latest",
    "claude-3-haiku-20240307",
];

/// Base URL for the Anthropic API
const API_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Required vendor version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connect timeout for cloud providers
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Anthropic Messages API request structure
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Turn message for the Messages API (system excluded)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic Messages API response structure
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

/// Content block in the response
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Error envelope from the Anthropic API
#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: Option<AnthropicError>,
}

/// Error details from the Anthropic API
#[derive(Debug, Deserialize)]
struct AnthropicError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Anthropic Claude LLM provider
pub struct AnthropicProvider {
    api_key: String,
    client: Client,
    default_model: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::builder()
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            default_model: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Create a provider from the `ANTHROPIC_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env::var(ANTHROPIC_API_KEY_ENV).map_err(|_| {
            AppError::config_missing(format!(
                "{ANTHROPIC_API_KEY_ENV} environment variable not set"
            ))
        })?;
        Ok(Self::new(api_key))
    }

    /// Set a custom default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Convert chat messages, lifting the system message out of turn history
    fn convert_messages(messages: &[ChatMessage]) -> (Vec<AnthropicMessage>, Option<String>) {
        let mut turns = Vec::new();
        let mut system = None;

        for message in messages {
            if message.role == MessageRole::System {
                system = Some(message.content.clone());
            } else {
                turns.push(AnthropicMessage {
                    role: message.role.as_str().to_owned(),
                    content: message.content.clone(),
                });
            }
        }

        (turns, system)
    }

    /// Build a Messages API request from a `ChatRequest`
    fn build_request(&self, request: &ChatRequest) -> AnthropicRequest {
        let (messages, system) = Self::convert_messages(&request.messages);
        AnthropicRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            system,
            messages,
            temperature: request.effective_temperature(),
            max_tokens: request.effective_max_tokens(),
        }
    }

    /// Extract text content from a parsed response
    fn extract_content(response: AnthropicResponse) -> Result<String, AppError> {
        response
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| AppError::internal("no text content in Anthropic response"))
    }

    /// Map an API error status to an appropriate classified error
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<AnthropicErrorResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(
                || response_text.to_owned(),
                |e| {
                    format!(
                        "{}: {}",
                        e.error_type.unwrap_or_else(|| "api_error".to_owned()),
                        e.message
                    )
                },
            );
        AppError::provider(status, message)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn display_name(&self) -> &'static str {
        "Anthropic Claude"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn fallback_models(&self) -> Vec<String> {
        FALLBACK_MODELS.iter().map(|&m| m.to_owned()).collect()
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, AppError> {
        let url = format!("{API_BASE_URL}/messages");
        let body = self.build_request(request);

        debug!("Sending request to Anthropic API");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::internal(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "Anthropic API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(error = %e, "Failed to parse Anthropic response");
            AppError::serialization(format!("Failed to parse Anthropic response: {e}"))
        })?;

        Self::extract_content(parsed)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, AppError> {
        let url = format!("{API_BASE_URL}/models");

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Health check failed: {e}")))?;

        Ok(response.status().is_success())
    }
}

impl Debug for AnthropicProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnthropicProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_lifted_to_top_level() {
        let messages = vec![
            ChatMessage::system("You are a coach."),
            ChatMessage::user("hello"),
        ];
        let (turns, system) = AnthropicProvider::convert_messages(&messages);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, "user");
        assert_eq!(system.as_deref(), Some("You are a coach."));
    }

    #[test]
    fn test_rate_limit_classification() {
        let body = r#"{"error":{"type":"rate_limit_error","message":"Too many requests"}}"#;
        assert!(AnthropicProvider::map_api_error(429, body).is_rate_limited());
    }

    #[test]
    fn test_missing_text_block_is_fatal() {
        let response = AnthropicResponse {
            content: vec![ContentBlock { text: None }],
        };
        let err = AnthropicProvider::extract_content(response).unwrap_err();
        assert!(!err.is_retryable());
    }
}
