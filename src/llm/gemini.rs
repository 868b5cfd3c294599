// ABOUTME: Google Gemini LLM provider implementation using the native Generative Language API
// ABOUTME: Lifts the system message into systemInstruction and renames the assistant role to model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Gemini Provider
//!
//! Implementation of the [`LlmProvider`] trait for Google's Gemini models.
//!
//! The native Gemini wire format differs from the OpenAI-compatible family in
//! two ways this adapter owns: conversation history is sent as `contents`
//! entries with roles `user`/`model` (the assistant role is renamed), and a
//! leading `system` message is extracted into a separate `system_instruction`
//! field rather than appearing as a turn.
//!
//! ## Configuration
//!
//! Credentials come from the caller; [`GeminiProvider::from_env`] reads the
//! `GEMINI_API_KEY` environment variable for deployments that resolve secrets
//! from the environment.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, LlmProvider, MessageRole};
use crate::errors::AppError;

/// Environment variable for Gemini API key
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Alternative models tried by the intra-provider fallback dimension
const FALLBACK_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connect timeout for cloud providers
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

/// Content structure for Gemini API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

/// Text part of a content entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

/// Generation configuration
#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    candidate_count: u32,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

/// API error response from Gemini
#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    default_model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key
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

    /// Create a provider from the `GEMINI_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            AppError::config_missing(format!(
                "{GEMINI_API_KEY_ENV} environment variable not set"
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

    /// Build the API URL for a model and method
    fn build_url(&self, model: &str, method: &str) -> String {
        format!(
            "{API_BASE_URL}/models/{model}:{method}?key={}",
            self.api_key
        )
    }

    /// Convert our message role to Gemini's role format
    ///
    /// System messages are handled separately via `system_instruction`; if one
    /// slips through here, map it to "user" for compatibility.
    const fn convert_role(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System | MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }

    /// Convert chat messages to Gemini format
    ///
    /// A `system` message is lifted out of the turn history into the separate
    /// `system_instruction` field.
    fn convert_messages(messages: &[ChatMessage]) -> (Vec<GeminiContent>, Option<GeminiContent>) {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for message in messages {
            if message.role == MessageRole::System {
                system_instruction = Some(GeminiContent {
                    role: None,
                    parts: vec![ContentPart {
                        text: message.content.clone(),
                    }],
                });
            } else {
                contents.push(GeminiContent {
                    role: Some(Self::convert_role(message.role).to_owned()),
                    parts: vec![ContentPart {
                        text: message.content.clone(),
                    }],
                });
            }
        }

        (contents, system_instruction)
    }

    /// Build a Gemini API request from a `ChatRequest`
    fn build_gemini_request(request: &ChatRequest) -> GeminiRequest {
        let (contents, system_instruction) = Self::convert_messages(&request.messages);

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.effective_temperature(),
                max_output_tokens: request.effective_max_tokens(),
                candidate_count: 1,
            },
        }
    }

    /// Extract text content from a Gemini response
    ///
    /// A response lacking `candidates[0].content.parts[0].text` is a fatal
    /// parse error, not a retry signal.
    fn extract_content(response: GeminiResponse) -> Result<String, AppError> {
        if let Some(error) = response.error {
            let status = error.status.unwrap_or_default();
            return Err(AppError::provider(
                200,
                format!("{status} {}", error.message),
            ));
        }

        response
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|mut c| c.parts.drain(..).next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::internal("no text content in Gemini response"))
    }

    /// Map an API error status to an appropriate classified error
    ///
    /// For rate limit (429) responses, the quota message from Gemini is
    /// rewritten into a user-presentable form before classification.
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<GeminiResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_owned(), |e| e.message);

        if status == 429 {
            return AppError::provider(status, extract_quota_message(&message));
        }
        AppError::provider(status, message)
    }
}

/// Extract a user-friendly quota/rate limit message from a Gemini error
///
/// Gemini quota errors embed a retry hint such as "Please retry in 6.4s.";
/// surface that as a wait time when present.
fn extract_quota_message(message: &str) -> String {
    if let Some(retry_pos) = message.find("Please retry in ") {
        let after_prefix = &message[retry_pos + 16..];
        if let Some(s_pos) = after_prefix.find('s') {
            if let Ok(seconds) = after_prefix[..s_pos].parse::<f64>() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let seconds_int = seconds.ceil() as u64;
                return format!(
                    "AI service quota exceeded. Please try again in {seconds_int} seconds."
                );
            }
        }
    }
    "AI service quota exceeded. Please wait a moment and try again.".to_owned()
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn fallback_models(&self) -> Vec<String> {
        FALLBACK_MODELS.iter().map(|&m| m.to_owned()).collect()
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let url = self.build_url(model, "generateContent");

        let gemini_request = Self::build_gemini_request(request);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::internal(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(error = %e, "Failed to parse Gemini response");
                AppError::serialization(format!("Failed to parse Gemini response: {e}"))
            })?;

        Self::extract_content(gemini_response)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, AppError> {
        // Listing models verifies the API key without burning tokens
        let url = format!("{API_BASE_URL}/models?key={}", self.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Health check failed: {e}")))?;

        Ok(response.status().is_success())
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_lifted_to_instruction() {
        let messages = vec![
            ChatMessage::system("You are a coach."),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
        ];
        let (contents, system) = GeminiProvider::convert_messages(&messages);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(system.unwrap().parts[0].text, "You are a coach.");
    }

    #[test]
    fn test_missing_text_path_is_fatal() {
        let response = GeminiResponse {
            candidates: Some(vec![Candidate { content: None }]),
            error: None,
        };
        let err = GeminiProvider::extract_content(response).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_quota_message_extraction() {
        let msg = extract_quota_message("Quota exceeded. Please retry in 6.406453963s.");
        assert_eq!(
            msg,
            "AI service quota exceeded. Please try again in 7 seconds."
        );
        let fallback = extract_quota_message("something else entirely");
        assert!(fallback.contains("quota exceeded"));
    }

    #[test]
    fn test_429_maps_to_rate_limited() {
        let err = GeminiProvider::map_api_error(429, "{\"error\":{\"message\":\"quota\"}}");
        assert!(err.is_rate_limited());
    }
}
