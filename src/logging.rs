// ABOUTME: Logging configuration and structured logging setup for the library's host application
// ABOUTME: Configures log level filtering and output format via tracing-subscriber
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! Structured logging setup with environment-driven configuration
//!
//! The library itself only emits `tracing` events; hosts call
//! [`init_logging`] (or [`init_from_env`]) once at startup to install a
//! subscriber. Raw provider bodies and status codes appear only in these
//! logs, never in user-facing surfaces.

use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::AppError;

/// Environment variable selecting the log level filter
const LOG_LEVEL_ENV: &str = "KONA_LOG_LEVEL";

/// Environment variable selecting the log output format
const LOG_FORMAT_ENV: &str = "KONA_LOG_FORMAT";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines for log aggregation
    Json,
    /// Human-readable multi-line output for development
    Pretty,
    /// Single-line output
    Compact,
}

impl LogFormat {
    /// Parse a format name (defaults to `Compact` for unknown values)
    #[must_use]
    pub fn parse_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Returns an error if the level filter cannot be parsed or a global
/// subscriber is already installed.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| AppError::config(format!("invalid log level '{level}': {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|e| AppError::config(format!("failed to install subscriber: {e}")))
}

/// Initialize logging from `KONA_LOG_LEVEL` and `KONA_LOG_FORMAT`
///
/// Defaults to `info` level and compact format.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init_from_env() -> Result<(), AppError> {
    let level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_owned());
    let format = env::var(LOG_FORMAT_ENV)
        .map(|s| LogFormat::parse_str(&s))
        .unwrap_or(LogFormat::Compact);
    init_logging(&level, format)
}
