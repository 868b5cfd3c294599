// ABOUTME: Input validation pipeline classifying free-text answers against a declared context
// ABOUTME: Model-assisted stage with an unconditional offline heuristic fallback stage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Input Validator
//!
//! Classifies a single piece of free-text user input against a declared
//! semantic context (e.g. "this answer should be a set of weekdays"),
//! producing a validity verdict, a normalized value, and - when invalid - a
//! follow-up question the caller can always show the user.
//!
//! Two stages satisfy the identical contract:
//!
//! 1. [`attempt_model_validation`] embeds the context, question, and raw
//!    input in a validation prompt, runs it through the fallback chain, and
//!    parses the reply through the structured response extractor.
//! 2. [`heuristic_validation`] is the fully offline fallback of last resort.
//!
//! [`validate`] wires them together: any failure in stage 1 - no credentials,
//! exhausted providers, unparseable reply - silently selects stage 2. The
//! conversation must always be able to continue; the end user never sees a
//! raw provider error.

mod heuristic;
mod model;

pub use heuristic::heuristic_validation;
pub use model::attempt_model_validation;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{CredentialSet, GatewayConfig};
use crate::llm::ChatMessage;

/// Closed tag identifying the expected answer shape
///
/// Determines both the strict/permissive validation policy and the shape of
/// the parsed value. The strict set is `{Name, DaysAvailable, YesNo,
/// Number}`; every other context accepts any non-empty input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationContext {
    /// A person's name
    Name,
    /// A set of weekdays
    DaysAvailable,
    /// A yes/no answer
    YesNo,
    /// An integer
    Number,
    /// Unconstrained free text
    FreeText,
    /// Comma/semicolon-separated interests
    Interests,
    /// Personality descriptor
    Personality,
    /// Physical limitations; negation words mean "none"
    PhysicalInfo,
    /// Past experience descriptor
    ExperienceLevel,
    /// Goal description
    GoalDescription,
    /// Session duration
    Duration,
    /// Time-of-day availability
    TimeAvailable,
}

impl ValidationContext {
    /// String tag used in stored rows and validation prompts
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DaysAvailable => "days_available",
            Self::YesNo => "yes_no",
            Self::Number => "number",
            Self::FreeText => "free_text",
            Self::Interests => "interests",
            Self::Personality => "personality",
            Self::PhysicalInfo => "physical_info",
            Self::ExperienceLevel => "experience_level",
            Self::GoalDescription => "goal_description",
            Self::Duration => "duration",
            Self::TimeAvailable => "time_available",
        }
    }

    /// Parse a stored tag; unrecognized tags fall back to the permissive
    /// `FreeText` policy
    #[must_use]
    pub fn parse_str(s: &str) -> Self {
        match s {
            "name" => Self::Name,
            "days_available" => Self::DaysAvailable,
            "yes_no" => Self::YesNo,
            "number" => Self::Number,
            "interests" => Self::Interests,
            "personality" => Self::Personality,
            "physical_info" => Self::PhysicalInfo,
            "experience_level" => Self::ExperienceLevel,
            "goal_description" => Self::GoalDescription,
            "duration" => Self::Duration,
            "time_available" => Self::TimeAvailable,
            _ => Self::FreeText,
        }
    }
}

/// Outcome of validating one answer
///
/// Invariants: `is_valid == false` implies `follow_up_question` is present
/// (the caller must always have something to show the user), and
/// `is_valid == true` implies `parsed_value` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the input satisfies the declared context
    pub is_valid: bool,
    /// Normalized value; shape depends on the context
    pub parsed_value: Option<Value>,
    /// Re-prompt shown to the user when invalid
    pub follow_up_question: Option<String>,
    /// Strength-of-match signal in [0, 1]; exact pattern matches outrank
    /// default acceptance
    pub confidence: f64,
    /// Free-text explanation, populated by the model-assisted stage
    pub reasoning: Option<String>,
}

impl ValidationResult {
    /// Accept the input with a normalized value
    #[must_use]
    pub fn valid(parsed_value: Value, confidence: f64) -> Self {
        Self {
            is_valid: true,
            parsed_value: Some(parsed_value),
            follow_up_question: None,
            confidence,
            reasoning: None,
        }
    }

    /// Reject the input with a follow-up question
    #[must_use]
    pub fn invalid(follow_up_question: impl Into<String>, confidence: f64) -> Self {
        Self {
            is_valid: false,
            parsed_value: None,
            follow_up_question: Some(follow_up_question.into()),
            confidence,
            reasoning: None,
        }
    }
}

/// Validate one free-text answer against its declared context
///
/// Tries the model-assisted stage first when at least one credential is
/// configured; any failure there degrades silently to the offline heuristic
/// stage so the conversation never stalls.
pub async fn validate(
    input: &str,
    context: ValidationContext,
    question: &str,
    prior_attempts: u32,
    history: &[ChatMessage],
    credentials: &CredentialSet,
    config: &GatewayConfig,
) -> ValidationResult {
    if !credentials.is_empty() {
        match attempt_model_validation(
            input,
            context,
            question,
            prior_attempts,
            history,
            credentials,
            config,
        )
        .await
        {
            Ok(result) => return result,
            Err(error) => {
                debug!(context = context.as_str(), error = %error, "Model validation unavailable, using heuristics");
            }
        }
    }

    heuristic_validation(input, context, question)
}
