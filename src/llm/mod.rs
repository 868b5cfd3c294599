// ABOUTME: LLM provider abstraction layer for the Kona AI gateway
// ABOUTME: Defines the provider contract, canonical message types, and chat request/result shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # LLM Provider Service Provider Interface
//!
//! This module defines the contract that LLM providers must implement to
//! integrate with the Kona chat gateway, plus the canonical message shapes
//! shared by every adapter.
//!
//! ## Key Concepts
//!
//! - **`LlmProvider`**: Async trait for chat completion, one impl per wire
//!   protocol family
//! - **`ChatMessage`**: Role-based message structure for conversations
//! - **`ChatRequest`**: Request configuration including model, temperature, etc.
//! - **`ChatResult`**: Completion text plus the provider/model that actually
//!   answered, which may differ from the nominal default after fallback
//!
//! ## Example
//!
//! ```rust,no_run
//! use kona_ai::llm::{ChatMessage, ChatRequest};
//! use kona_ai::{chat, CredentialSet, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kona_ai::errors::AppError> {
//!     let credentials = CredentialSet::from_env();
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::system("You are a supportive personal coach."),
//!         ChatMessage::user("How was my week?"),
//!     ]);
//!     let result = chat(&request, &credentials, &GatewayConfig::default()).await?;
//!     println!("[{}/{}] {}", result.provider, result.model, result.text);
//!     Ok(())
//! }
//! ```

mod anthropic;
mod extract;
mod fallback;
mod gemini;
mod openai;
pub mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use extract::extract_json;
pub use fallback::{
    complete_with_model_fallback, complete_with_provider_fallback, Candidate,
};
pub use gemini::GeminiProvider;
pub use openai::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use provider::{chat, chat_with, fallback_chat_reply, ChatProvider, ProviderIdentity};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Default sampling temperature applied when the caller does not set one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default output-token cap applied when the caller does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Result Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages; at most one `system` message
    pub messages: Vec<ChatMessage>,
    /// Model identifier (provider-specific); `None` uses the provider default
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Effective temperature after applying the adapter-level default
    #[must_use]
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Effective max-token cap after applying the adapter-level default
    #[must_use]
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Result of a chat completion
///
/// The provider/model actually used is always surfaced because fallback may
/// silently substitute either at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    /// Generated message content
    pub text: String,
    /// Provider that actually answered
    pub provider: ProviderIdentity,
    /// Model that actually answered
    pub model: String,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// LLM provider trait for chat completion
///
/// Implement this trait to add a new LLM provider to Kona. One implementation
/// exists per wire protocol family; vendors sharing a wire format share an
/// implementation (see [`OpenAiCompatibleProvider`]).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "gemini", "openai", "anthropic")
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &'static str;

    /// Default model to use if not specified in request
    fn default_model(&self) -> &str;

    /// Alternative model names tried, in order, when the selected model is
    /// capacity-limited or unavailable for the account tier
    fn fallback_models(&self) -> Vec<String>;

    /// Perform a chat completion, returning the generated text
    ///
    /// Fails with a provider-classified [`AppError`] on any non-2xx response
    /// or on a response missing the expected text field.
    async fn complete(&self, request: &ChatRequest) -> Result<String, AppError>;

    /// Check if the provider is reachable and the API key is valid
    async fn health_check(&self) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        assert!((request.effective_temperature() - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.effective_max_tokens(), 1024);

        let tuned = request.with_temperature(0.2).with_max_tokens(64);
        assert!((tuned.effective_temperature() - 0.2).abs() < f32::EPSILON);
        assert_eq!(tuned.effective_max_tokens(), 64);
    }

    #[test]
    fn test_role_serialization() {
        let msg = ChatMessage::assistant("ok");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant\""));
    }
}
