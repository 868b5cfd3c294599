// ABOUTME: Per-call retry loops implementing the two fallback dimensions of the gateway
// ABOUTME: Classifies attempt failures as retryable or fatal and reports which candidate answered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Model/Provider Fallback Chain
//!
//! A purely per-call, stateless retry loop with two dimensions:
//!
//! 1. **Intra-provider model fallback**: one provider is known capable but a
//!    specific model may be capacity-limited; walk the caller-selected model
//!    followed by the provider's fixed alternative list.
//! 2. **Inter-provider fallback**: the caller has not pinned a provider;
//!    walk an ordered candidate list built from whichever credentials are
//!    configured, in the gateway's preference order.
//!
//! Failure classification on each attempt:
//!
//! - rate-limit / quota (`429`, `RESOURCE_EXHAUSTED`): short fixed backoff,
//!   then the next candidate in the same dimension
//! - model not found (`404`): next candidate immediately, no backoff
//! - anything else: fatal for that provider. Propagated immediately in the
//!   intra-provider dimension (an auth or format error will not be fixed by
//!   changing models), logged and skipped in the inter-provider dimension
//! - per-attempt deadline expiry: exhausts the remaining attempts
//!
//! Attempts are strictly sequential; attempt N+1 begins only after attempt
//! N's failure has been classified.

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::{ChatRequest, ChatResult, LlmProvider, ProviderIdentity};
use crate::config::GatewayConfig;
use crate::errors::{AppError, ErrorCode};

/// One (provider, model) pair in the inter-provider dimension
pub struct Candidate {
    /// Provider identity reported in the final [`ChatResult`]
    pub identity: ProviderIdentity,
    /// Adapter that executes the attempt
    pub provider: Box<dyn LlmProvider>,
    /// Model attempted first for this provider; the provider's own model
    /// alternatives are not walked in this dimension
    pub model: String,
}

/// Run one attempt under the per-attempt deadline
///
/// Returns `Err(None)` when the deadline expired: the surrounding request is
/// presumed abandoned, so the chain stops rather than advancing.
async fn attempt(
    provider: &dyn LlmProvider,
    request: &ChatRequest,
    config: &GatewayConfig,
) -> Result<String, Option<AppError>> {
    match timeout(config.attempt_timeout, provider.complete(request)).await {
        Ok(result) => result.map_err(Some),
        Err(_) => Err(None),
    }
}

/// Error produced when an attempt's deadline expires
fn deadline_error(config: &GatewayConfig) -> AppError {
    AppError::new(
        ErrorCode::ExternalServiceError,
        format!(
            "provider attempt exceeded deadline of {}s",
            config.attempt_timeout.as_secs()
        ),
    )
}

/// Intra-provider model fallback
///
/// Walks the caller-selected model (or the provider default) followed by the
/// provider's fixed alternative model list. Rate-limit and model-not-found
/// failures advance to the next model; any other failure propagates
/// immediately, since a systemic auth/format error will not be fixed by
/// changing models.
///
/// # Errors
///
/// Returns `ProvidersExhausted` carrying the last underlying error when every
/// model candidate fails with a retryable classification.
pub async fn complete_with_model_fallback(
    identity: ProviderIdentity,
    provider: &dyn LlmProvider,
    request: &ChatRequest,
    config: &GatewayConfig,
) -> Result<ChatResult, AppError> {
    let mut models: Vec<String> = Vec::new();
    models.push(
        request
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_owned()),
    );
    for alternative in provider.fallback_models() {
        if !models.contains(&alternative) {
            models.push(alternative);
        }
    }

    let mut last_error: Option<AppError> = None;

    for model in models {
        let candidate_request = request.clone().with_model(model.clone());
        debug!(provider = provider.name(), model = %model, "Attempting model");

        match attempt(provider, &candidate_request, config).await {
            Ok(text) => {
                return Ok(ChatResult {
                    text,
                    provider: identity,
                    model,
                });
            }
            Err(None) => {
                warn!(provider = provider.name(), model = %model, "Attempt deadline expired");
                return Err(AppError::providers_exhausted(deadline_error(config)));
            }
            Err(Some(error)) if error.is_rate_limited() => {
                warn!(provider = provider.name(), model = %model, "Rate limited, backing off before next model");
                sleep(config.rate_limit_backoff).await;
                last_error = Some(error);
            }
            Err(Some(error)) if error.is_model_not_found() => {
                warn!(provider = provider.name(), model = %model, "Model not available for this account, trying next");
                last_error = Some(error);
            }
            Err(Some(error)) => return Err(error),
        }
    }

    Err(AppError::providers_exhausted(last_error.unwrap_or_else(
        || AppError::config_missing("no model candidates configured"),
    )))
}

/// Inter-provider fallback
///
/// Walks the ordered candidate list built from configured credentials. Every
/// failure class advances to the next provider (the failure may be
/// provider-specific), with a backoff inserted only after rate limiting.
///
/// # Errors
///
/// Returns `ProvidersExhausted` carrying the last underlying error when the
/// candidate list is empty or every candidate fails.
pub async fn complete_with_provider_fallback(
    candidates: Vec<Candidate>,
    request: &ChatRequest,
    config: &GatewayConfig,
) -> Result<ChatResult, AppError> {
    if candidates.is_empty() {
        return Err(AppError::providers_exhausted(AppError::config_missing(
            "no provider credentials configured",
        )));
    }

    let mut last_error: Option<AppError> = None;

    for candidate in candidates {
        let candidate_request = request.clone().with_model(candidate.model.clone());
        debug!(provider = %candidate.identity, model = %candidate.model, "Attempting provider");

        match attempt(candidate.provider.as_ref(), &candidate_request, config).await {
            Ok(text) => {
                info!(provider = %candidate.identity, model = %candidate.model, "Provider answered");
                return Ok(ChatResult {
                    text,
                    provider: candidate.identity,
                    model: candidate.model,
                });
            }
            Err(None) => {
                warn!(provider = %candidate.identity, "Attempt deadline expired");
                return Err(AppError::providers_exhausted(deadline_error(config)));
            }
            Err(Some(error)) if error.is_rate_limited() => {
                warn!(provider = %candidate.identity, "Rate limited, backing off before next provider");
                sleep(config.rate_limit_backoff).await;
                last_error = Some(error);
            }
            Err(Some(error)) if error.is_model_not_found() => {
                warn!(provider = %candidate.identity, model = %candidate.model, "Model not available, trying next provider");
                last_error = Some(error);
            }
            Err(Some(error)) => {
                warn!(provider = %candidate.identity, error = %error, "Provider failed, trying next");
                last_error = Some(error);
            }
        }
    }

    Err(AppError::providers_exhausted(last_error.unwrap_or_else(
        || AppError::config_missing("no provider credentials configured"),
    )))
}
