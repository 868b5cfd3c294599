// ABOUTME: OpenAI-compatible LLM provider implementation shared by OpenAI and OpenRouter
// ABOUTME: Config-driven adapter since both vendors speak the same chat-completions wire format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # OpenAI-Compatible Provider
//!
//! Implementation of the [`LlmProvider`] trait for any vendor speaking the
//! OpenAI chat-completions wire format. The system message stays inline in
//! `messages`; response text is read from `choices[0].message.content`.
//!
//! One adapter serves both `OpenAI` and `OpenRouter`: the wire format is
//! identical, OpenRouter merely requires two extra headers identifying the
//! calling application ([`OpenAiCompatibleConfig::extra_headers`]).

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, LlmProvider};
use crate::errors::AppError;

/// Environment variable for OpenAI API key
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable for OpenRouter API key
const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenAI API base URL
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenRouter API base URL
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default OpenAI model
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI models tried by the intra-provider fallback dimension
const OPENAI_FALLBACK_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];

/// Default OpenRouter model
const OPENROUTER_DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

/// OpenRouter models tried by the intra-provider fallback dimension
const OPENROUTER_FALLBACK_MODELS: &[&str] = &[
    "meta-llama/llama-3.3-70b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "mistralai/mistral-7b-instruct:free",
];

/// Referer header value identifying the Kona app to OpenRouter
const KONA_APP_URL: &str = "https://konacoaching.app";

/// Title header value identifying the Kona app to OpenRouter
const KONA_APP_TITLE: &str = "Kona Coaching";

/// Connect timeout for cloud providers
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Message structure for OpenAI-compatible API
///
/// The system role is passed through verbatim; this wire family keeps system
/// instructions inline in the turn history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// API endpoint base URL
    pub base_url: String,
    /// Bearer API key
    pub api_key: String,
    /// Default model when the request does not name one
    pub default_model: String,
    /// Ordered alternative models for intra-provider fallback
    pub fallback_models: Vec<String>,
    /// Unique provider identifier
    pub provider_name: &'static str,
    /// Human-readable display name
    pub display_name: &'static str,
    /// Additional headers required by the vendor (name, value)
    pub extra_headers: Vec<(&'static str, String)>,
}

/// LLM provider for the OpenAI-compatible wire protocol family
pub struct OpenAiCompatibleProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from an explicit configuration
    #[must_use]
    pub fn new(config: OpenAiCompatibleConfig) -> Self {
        Self {
            config,
            client: Client::builder()
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create an `OpenAI` provider with the given API key
    #[must_use]
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(OpenAiCompatibleConfig {
            base_url: OPENAI_BASE_URL.to_owned(),
            api_key: api_key.into(),
            default_model: OPENAI_DEFAULT_MODEL.to_owned(),
            fallback_models: OPENAI_FALLBACK_MODELS
                .iter()
                .map(|&m| m.to_owned())
                .collect(),
            provider_name: "openai",
            display_name: "OpenAI",
            extra_headers: Vec::new(),
        })
    }

    /// Create an `OpenRouter` provider with the given API key
    ///
    /// OpenRouter requires `HTTP-Referer` and `X-Title` headers identifying
    /// the calling application; the wire format is otherwise identical.
    #[must_use]
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(OpenAiCompatibleConfig {
            base_url: OPENROUTER_BASE_URL.to_owned(),
            api_key: api_key.into(),
            default_model: OPENROUTER_DEFAULT_MODEL.to_owned(),
            fallback_models: OPENROUTER_FALLBACK_MODELS
                .iter()
                .map(|&m| m.to_owned())
                .collect(),
            provider_name: "openrouter",
            display_name: "OpenRouter",
            extra_headers: vec![
                ("HTTP-Referer", KONA_APP_URL.to_owned()),
                ("X-Title", KONA_APP_TITLE.to_owned()),
            ],
        })
    }

    /// Create an `OpenAI` provider from the `OPENAI_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn openai_from_env() -> Result<Self, AppError> {
        let api_key = env::var(OPENAI_API_KEY_ENV).map_err(|_| {
            AppError::config_missing(format!(
                "{OPENAI_API_KEY_ENV} environment variable not set"
            ))
        })?;
        Ok(Self::openai(api_key))
    }

    /// Create an `OpenRouter` provider from the `OPENROUTER_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn openrouter_from_env() -> Result<Self, AppError> {
        let api_key = env::var(OPENROUTER_API_KEY_ENV).map_err(|_| {
            AppError::config_missing(format!(
                "{OPENROUTER_API_KEY_ENV} environment variable not set"
            ))
        })?;
        Ok(Self::openrouter(api_key))
    }

    /// Set a custom default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    /// Build the chat-completions request body
    fn build_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        OpenAiRequest {
            model,
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.effective_temperature(),
            max_tokens: request.effective_max_tokens(),
        }
    }

    /// Extract text content from a parsed response
    fn extract_content(response: OpenAiResponse) -> Result<String, AppError> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::internal("no text content in chat completion response"))
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.provider_name
    }

    fn display_name(&self) -> &'static str {
        self.config.display_name
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn fallback_models(&self) -> Vec<String> {
        self.config.fallback_models.clone()
    }

    #[instrument(skip(self, request), fields(provider = self.config.provider_name, model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = self.build_request(request);

        debug!("Sending request to {}", self.config.display_name);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");
        for (name, value) in &self.config.extra_headers {
            builder = builder.header(*name, value);
        }

        let response = builder
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
            error!(status = %status, provider = self.config.provider_name, "Chat completion API error");
            return Err(AppError::provider(status.as_u16(), response_text));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(error = %e, "Failed to parse chat completion response");
            AppError::serialization(format!("Failed to parse chat completion response: {e}"))
        })?;

        Self::extract_content(parsed)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, AppError> {
        let url = format!("{}/models", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Health check failed: {e}")))?;

        Ok(response.status().is_success())
    }
}

impl Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("provider", &self.config.provider_name)
            .field("base_url", &self.config.base_url)
            .field("default_model", &self.config.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
