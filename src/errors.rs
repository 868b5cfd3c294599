// ABOUTME: Unified error handling for the Kona AI core library
// ABOUTME: Defines error codes, the AppError type, and retry classification for provider failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Unified Error Handling System
//!
//! Centralized error types for the AI gateway. Every fallible operation in
//! this crate returns [`AppError`], which carries a machine-readable
//! [`ErrorCode`], a human-readable message, and (for provider failures) the
//! upstream HTTP status. The fallback chain uses the classification helpers
//! (`is_rate_limited`, `is_model_not_found`) to decide whether a failed
//! attempt is worth retrying on the next candidate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // External Services (5000-5999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,
    #[serde(rename = "MODEL_NOT_FOUND")]
    ModelNotFound = 5004,
    #[serde(rename = "PROVIDERS_EXHAUSTED")]
    ProvidersExhausted = 5005,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    ///
    /// Used by the HTTP handlers that consume this library; the core itself
    /// owns no network surface.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::ModelNotFound => 404,
            Self::ExternalServiceError => 502,
            Self::ExternalRateLimited | Self::ProvidersExhausted => 503,
            Self::ConfigError | Self::ConfigMissing | Self::InternalError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::ExternalServiceError => "An AI provider encountered an error",
            Self::ExternalRateLimited => "AI provider rate limit exceeded",
            Self::ModelNotFound => "The requested model is not available",
            Self::ProvidersExhausted => "All configured AI providers failed",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigMissing => "Required configuration is missing",
            Self::InternalError => "An internal error occurred",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the library
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Upstream HTTP status, when the error originated at a provider boundary
    pub provider_status: Option<u16>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_status: None,
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Classify a raw provider failure from its HTTP status and response body
    ///
    /// 429 (or a quota message in the body) maps to `ExternalRateLimited`,
    /// 404 (or a vendor not-found code) maps to `ModelNotFound`, anything else
    /// to `ExternalServiceError`. The raw body is preserved in the message for
    /// diagnostics; it must never be shown to end users.
    pub fn provider(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let lowered = body.to_lowercase();
        let code = match status {
            429 => ErrorCode::ExternalRateLimited,
            404 => ErrorCode::ModelNotFound,
            _ if lowered.contains("resource_exhausted") || lowered.contains("rate limit") => {
                ErrorCode::ExternalRateLimited
            }
            _ if lowered.contains("not_found") || lowered.contains("model not found") => {
                ErrorCode::ModelNotFound
            }
            _ => ErrorCode::ExternalServiceError,
        };
        Self {
            code,
            message: format!("provider returned {status}: {body}"),
            provider_status: Some(status),
            source: None,
        }
    }

    /// True if this failure came from rate limiting or quota exhaustion
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.code == ErrorCode::ExternalRateLimited
    }

    /// True if the model name was rejected by the provider (invalid for this
    /// account tier)
    #[must_use]
    pub fn is_model_not_found(&self) -> bool {
        self.code == ErrorCode::ModelNotFound
    }

    /// True if the next candidate in the same fallback dimension may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limited() || self.is_model_not_found()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Missing configuration (e.g. no credential for a provider)
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Serialization failure
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Every candidate in the chosen fallback dimension failed
    ///
    /// Carries the last underlying error as the source for diagnostics.
    #[must_use]
    pub fn providers_exhausted(last: Self) -> Self {
        Self {
            code: ErrorCode::ProvidersExhausted,
            message: format!("all candidates failed, last error: {last}"),
            provider_status: last.provider_status,
            source: Some(Box::new(last)),
        }
    }
}

/// Conversion from `anyhow::Error` to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::ModelNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ExternalRateLimited.http_status(), 503);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_provider_error_classification() {
        assert!(AppError::provider(429, "slow down").is_rate_limited());
        assert!(AppError::provider(404, "no such model").is_model_not_found());
        assert!(AppError::provider(200, "RESOURCE_EXHAUSTED: quota").is_rate_limited());
        assert!(!AppError::provider(500, "boom").is_retryable());
    }

    #[test]
    fn test_providers_exhausted_keeps_last_error() {
        let last = AppError::provider(429, "quota");
        let exhausted = AppError::providers_exhausted(last);
        assert_eq!(exhausted.code, ErrorCode::ProvidersExhausted);
        assert_eq!(exhausted.provider_status, Some(429));
        assert!(exhausted.source.is_some());
    }
}
