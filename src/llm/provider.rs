// ABOUTME: Unified chat provider selector and the gateway's top-level chat entry point
// ABOUTME: Maps credentials onto concrete adapters and drives the fallback chain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Chat Provider Selector
//!
//! [`ProviderIdentity`] is the closed enumeration of supported providers.
//! [`ChatProvider`] wraps the three concrete adapters behind one type so the
//! fallback chain can hold heterogeneous candidates, and [`chat`] is the
//! single entry point used by onboarding, goal chat, plan generation, and
//! free chat.
//!
//! Callers must not assume the nominal default provider answered: the
//! returned [`ChatResult`](super::ChatResult) names the provider and model
//! that actually produced the text.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::fallback::{
    complete_with_model_fallback, complete_with_provider_fallback, Candidate,
};
use super::{AnthropicProvider, GeminiProvider, OpenAiCompatibleProvider};
use super::{ChatRequest, ChatResult, LlmProvider};
use crate::config::{CredentialSet, GatewayConfig, LlmCredentials};
use crate::errors::AppError;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderIdentity {
    /// Google Gemini (native wire format)
    Gemini,
    /// `OpenAI` (OpenAI-compatible wire format)
    OpenAi,
    /// Anthropic Claude (Messages API wire format)
    Anthropic,
    /// `OpenRouter` (OpenAI-compatible wire format plus identifying headers)
    OpenRouter,
}

impl ProviderIdentity {
    /// Get provider name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Parse provider name from string (case-insensitive)
    #[must_use]
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" | "gpt" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    /// Get environment variable name for this provider's API key
    #[must_use]
    pub const fn env_var_name(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified chat provider wrapping the concrete adapters
///
/// This enum provides a consistent interface regardless of which underlying
/// provider a credential resolves to. `OpenAI` and `OpenRouter` share the
/// OpenAI-compatible adapter with different configurations.
pub enum ChatProvider {
    /// Google Gemini provider
    Gemini(GeminiProvider),
    /// `OpenAI` provider
    OpenAi(OpenAiCompatibleProvider),
    /// Anthropic Claude provider
    Anthropic(AnthropicProvider),
    /// `OpenRouter` provider
    OpenRouter(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Create a provider from pre-fetched credentials
    ///
    /// A model override in the credentials replaces the provider default, so
    /// the intra-provider fallback dimension starts from the caller's choice.
    #[must_use]
    pub fn from_credentials(credentials: &LlmCredentials) -> Self {
        debug!(provider = %credentials.provider, "Creating chat provider from credentials");
        match credentials.provider {
            ProviderIdentity::Gemini => {
                let mut provider = GeminiProvider::new(&credentials.api_key);
                if let Some(model) = &credentials.model {
                    provider = provider.with_default_model(model);
                }
                Self::Gemini(provider)
            }
            ProviderIdentity::OpenAi => {
                let mut provider = OpenAiCompatibleProvider::openai(&credentials.api_key);
                if let Some(model) = &credentials.model {
                    provider = provider.with_default_model(model);
                }
                Self::OpenAi(provider)
            }
            ProviderIdentity::Anthropic => {
                let mut provider = AnthropicProvider::new(&credentials.api_key);
                if let Some(model) = &credentials.model {
                    provider = provider.with_default_model(model);
                }
                Self::Anthropic(provider)
            }
            ProviderIdentity::OpenRouter => {
                let mut provider = OpenAiCompatibleProvider::openrouter(&credentials.api_key);
                if let Some(model) = &credentials.model {
                    provider = provider.with_default_model(model);
                }
                Self::OpenRouter(provider)
            }
        }
    }

    /// Get the provider identity
    #[must_use]
    pub const fn identity(&self) -> ProviderIdentity {
        match self {
            Self::Gemini(_) => ProviderIdentity::Gemini,
            Self::OpenAi(_) => ProviderIdentity::OpenAi,
            Self::Anthropic(_) => ProviderIdentity::Anthropic,
            Self::OpenRouter(_) => ProviderIdentity::OpenRouter,
        }
    }
}

// Delegate LlmProvider trait methods to the underlying adapter
#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::OpenAi(p) | Self::OpenRouter(p) => p.name(),
            Self::Anthropic(p) => p.name(),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini(p) => p.display_name(),
            Self::OpenAi(p) | Self::OpenRouter(p) => p.display_name(),
            Self::Anthropic(p) => p.display_name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::Gemini(p) => p.default_model(),
            Self::OpenAi(p) | Self::OpenRouter(p) => p.default_model(),
            Self::Anthropic(p) => p.default_model(),
        }
    }

    fn fallback_models(&self) -> Vec<String> {
        match self {
            Self::Gemini(p) => p.fallback_models(),
            Self::OpenAi(p) | Self::OpenRouter(p) => p.fallback_models(),
            Self::Anthropic(p) => p.fallback_models(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AppError> {
        match self {
            Self::Gemini(p) => p.complete(request).await,
            Self::OpenAi(p) | Self::OpenRouter(p) => p.complete(request).await,
            Self::Anthropic(p) => p.complete(request).await,
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        match self {
            Self::Gemini(p) => p.health_check().await,
            Self::OpenAi(p) | Self::OpenRouter(p) => p.health_check().await,
            Self::Anthropic(p) => p.health_check().await,
        }
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini(_) => f.debug_tuple("ChatProvider::Gemini").finish(),
            Self::OpenAi(_) => f.debug_tuple("ChatProvider::OpenAi").finish(),
            Self::Anthropic(_) => f.debug_tuple("ChatProvider::Anthropic").finish(),
            Self::OpenRouter(_) => f.debug_tuple("ChatProvider::OpenRouter").finish(),
        }
    }
}

/// Perform a chat completion across all configured providers
///
/// Builds the inter-provider candidate list from whichever credentials are
/// configured, in the gateway's preference order, and walks it until one
/// provider answers. The returned result names the provider/model that
/// actually produced the text.
///
/// # Errors
///
/// Returns `ProvidersExhausted` when every configured provider fails, or when
/// no credentials are configured at all. This is an expected outcome in a
/// BYOK deployment; callers substitute [`fallback_chat_reply`] rather than
/// surfacing the error to the end user.
#[instrument(skip(request, credentials, config), fields(messages = request.messages.len()))]
pub async fn chat(
    request: &ChatRequest,
    credentials: &CredentialSet,
    config: &GatewayConfig,
) -> Result<ChatResult, AppError> {
    let mut candidates = Vec::new();
    for identity in &config.preference_order {
        if let Some(cred) = credentials.get(*identity) {
            let provider = ChatProvider::from_credentials(cred);
            let model = cred
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_owned());
            candidates.push(Candidate {
                identity: *identity,
                provider: Box::new(provider),
                model,
            });
        }
    }

    complete_with_provider_fallback(candidates, request, config).await
}

/// Perform a chat completion pinned to one provider, with model fallback
///
/// Used when the caller knows a provider is capable (e.g. structured
/// extraction tuned for a specific vendor) but a specific model may be
/// capacity-limited. Walks the caller-selected model followed by the
/// provider's alternative model list.
///
/// # Errors
///
/// Returns `ProvidersExhausted` when every model candidate fails with a
/// retryable classification, or the underlying error directly when the
/// failure is systemic for the provider.
pub async fn chat_with(
    credentials: &LlmCredentials,
    request: &ChatRequest,
    config: &GatewayConfig,
) -> Result<ChatResult, AppError> {
    let provider = ChatProvider::from_credentials(credentials);
    complete_with_model_fallback(provider.identity(), &provider, request, config).await
}

/// Deterministic caller-facing reply substituted when all providers fail
///
/// The end user must never see a raw provider error; every caller of [`chat`]
/// shares this canned response so the conversation can always continue.
#[must_use]
pub const fn fallback_chat_reply() -> &'static str {
    "I'm having trouble reaching my coaching brain right now. \
     Your data is safe, and everything else keeps working - \
     please try asking me again in a little while."
}
