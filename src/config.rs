// ABOUTME: Gateway configuration and provider credential resolution
// ABOUTME: Makes the provider preference order and retry timings explicit, testable inputs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Gateway Configuration
//!
//! [`GatewayConfig`] carries the knobs the fallback chain consults: the
//! ordered provider preference list, the per-attempt deadline, and the
//! backoff applied after a rate-limit classification. The preference order is
//! an explicit input rather than ambient environment state so tests can
//! exercise any ordering.
//!
//! [`CredentialSet`] holds the opaque per-provider secrets. Callers normally
//! resolve credentials themselves (per-user keys in a BYOK deployment);
//! [`CredentialSet::from_env`] covers deployments that configure keys through
//! the environment.

use std::env;
use std::time::Duration;

use crate::llm::ProviderIdentity;

/// Default per-attempt deadline
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

/// Default backoff after a rate-limit classification
const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 1000;

/// Configuration for the fallback chain
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider order walked by inter-provider fallback; providers without a
    /// configured credential are skipped
    pub preference_order: Vec<ProviderIdentity>,
    /// Deadline applied to each individual provider attempt
    pub attempt_timeout: Duration,
    /// Sleep inserted before the next candidate after a rate-limit failure;
    /// other failure classes advance without delay
    pub rate_limit_backoff: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            preference_order: vec![
                ProviderIdentity::Gemini,
                ProviderIdentity::OpenAi,
                ProviderIdentity::Anthropic,
                ProviderIdentity::OpenRouter,
            ],
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            rate_limit_backoff: Duration::from_millis(DEFAULT_RATE_LIMIT_BACKOFF_MS),
        }
    }
}

impl GatewayConfig {
    /// Override the provider preference order
    #[must_use]
    pub fn with_preference_order(mut self, order: Vec<ProviderIdentity>) -> Self {
        self.preference_order = order;
        self
    }

    /// Override the per-attempt deadline
    #[must_use]
    pub const fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Override the rate-limit backoff
    #[must_use]
    pub const fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }
}

/// Resolved credential for one provider
#[derive(Debug, Clone)]
pub struct LlmCredentials {
    /// Which provider this key belongs to
    pub provider: ProviderIdentity,
    /// Opaque API key
    pub api_key: String,
    /// Optional model override replacing the provider default
    pub model: Option<String>,
}

impl LlmCredentials {
    /// Create credentials for a provider
    pub fn new(provider: ProviderIdentity, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
        }
    }

    /// Set a model override
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Resolve a single provider's credential from its environment variable
    ///
    /// Returns `None` when the variable is missing or blank.
    #[must_use]
    pub fn from_env(provider: ProviderIdentity) -> Option<Self> {
        match env::var(provider.env_var_name()) {
            Ok(key) if !key.trim().is_empty() => Some(Self::new(provider, key)),
            _ => None,
        }
    }
}

/// Per-provider credentials available for a single gateway call
///
/// Holds at most one credential per provider. Which of these are present
/// determines the candidates the inter-provider fallback dimension walks.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    entries: Vec<LlmCredentials>,
}

impl CredentialSet {
    /// Create an empty credential set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the credential for a provider
    #[must_use]
    pub fn with_credential(mut self, credentials: LlmCredentials) -> Self {
        self.entries.retain(|c| c.provider != credentials.provider);
        self.entries.push(credentials);
        self
    }

    /// Get the credential for a provider, if configured
    #[must_use]
    pub fn get(&self, provider: ProviderIdentity) -> Option<&LlmCredentials> {
        self.entries.iter().find(|c| c.provider == provider)
    }

    /// True if no provider has a credential
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve credentials from the environment
    ///
    /// Checks each provider's API key variable (`GEMINI_API_KEY`,
    /// `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `OPENROUTER_API_KEY`). Missing
    /// or empty variables simply leave that provider unconfigured; an entirely
    /// empty set is valid and leads to the deterministic fallback behavior at
    /// the call site.
    #[must_use]
    pub fn from_env() -> Self {
        let mut set = Self::new();
        for provider in [
            ProviderIdentity::Gemini,
            ProviderIdentity::OpenAi,
            ProviderIdentity::Anthropic,
            ProviderIdentity::OpenRouter,
        ] {
            if let Some(credential) = LlmCredentials::from_env(provider) {
                set = set.with_credential(credential);
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_preference_order() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.preference_order,
            vec![
                ProviderIdentity::Gemini,
                ProviderIdentity::OpenAi,
                ProviderIdentity::Anthropic,
                ProviderIdentity::OpenRouter,
            ]
        );
    }

    #[test]
    fn test_credential_replacement() {
        let set = CredentialSet::new()
            .with_credential(LlmCredentials::new(ProviderIdentity::Gemini, "old"))
            .with_credential(LlmCredentials::new(ProviderIdentity::Gemini, "new"));
        assert_eq!(set.get(ProviderIdentity::Gemini).unwrap().api_key, "new");
        assert!(set.get(ProviderIdentity::OpenAi).is_none());
    }

    #[test]
    fn test_model_override() {
        let cred = LlmCredentials::new(ProviderIdentity::OpenAi, "key").with_model("gpt-4o");
        assert_eq!(cred.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    #[serial]
    fn test_from_env_picks_up_configured_providers() {
        env::set_var("GEMINI_API_KEY", "gk-test");
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("ANTHROPIC_API_KEY");
        env::remove_var("OPENROUTER_API_KEY");

        let set = CredentialSet::from_env();
        assert_eq!(set.get(ProviderIdentity::Gemini).unwrap().api_key, "gk-test");
        assert!(set.get(ProviderIdentity::OpenAi).is_none());

        env::remove_var("GEMINI_API_KEY");
    }

    #[test]
    #[serial]
    fn test_from_env_skips_blank_keys() {
        env::set_var("ANTHROPIC_API_KEY", "   ");
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("OPENROUTER_API_KEY");

        let set = CredentialSet::from_env();
        assert!(set.is_empty());

        env::remove_var("ANTHROPIC_API_KEY");
    }
}
