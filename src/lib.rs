// ABOUTME: Main library entry point for the Kona coaching AI core
// ABOUTME: Provides the provider-agnostic chat gateway, context condensation, and answer validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

#![deny(unsafe_code)]

//! # Kona AI Core
//!
//! The AI gateway of the Kona personal-coaching app: a resilient,
//! provider-agnostic chat-completion layer plus the structured-extraction and
//! validation pipeline that turns free-form user answers into typed data
//! without requiring a model call to succeed.
//!
//! ## Components
//!
//! - **Provider adapters** ([`llm`]): one adapter per wire protocol family
//!   (OpenAI-compatible, native Gemini, Anthropic), all speaking one
//!   canonical message format
//! - **Fallback chain**: walks model and provider candidates, classifying
//!   failures as retryable or fatal, and reports who actually answered
//! - **Structured response extractor** ([`llm::extract_json`]): recovers JSON
//!   from prose-wrapped model output, infallibly
//! - **Context builder and condenser** ([`context`]): compresses a growing
//!   history of goals, sessions, and profile fields into a bounded prompt
//!   fragment
//! - **Input validator** ([`validation`]): model-assisted with a fully
//!   offline heuristic fallback reaching the same contract, so the
//!   conversation never stalls
//!
//! ## Example
//!
//! ```rust,no_run
//! use kona_ai::llm::{ChatMessage, ChatRequest};
//! use kona_ai::{chat, fallback_chat_reply, CredentialSet, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let credentials = CredentialSet::from_env();
//!     let config = GatewayConfig::default();
//!     let request = ChatRequest::new(vec![ChatMessage::user("Plan my week")]);
//!
//!     let reply = match chat(&request, &credentials, &config).await {
//!         Ok(result) => result.text,
//!         // Expected outcome when a user configured no keys; never surface
//!         // the raw error
//!         Err(_) => fallback_chat_reply().to_owned(),
//!     };
//!     println!("{reply}");
//! }
//! ```

pub mod config;
pub mod context;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod validation;

pub use config::{CredentialSet, GatewayConfig, LlmCredentials};
pub use context::{
    build_user_context, generate_ai_summary, summarize_for_prompt, CondensedContext, UserContext,
};
pub use errors::{AppError, AppResult, ErrorCode};
pub use llm::{chat, chat_with, extract_json, fallback_chat_reply, ChatResult, ProviderIdentity};
pub use validation::{validate, ValidationContext, ValidationResult};
