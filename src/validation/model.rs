// ABOUTME: Model-assisted validation stage running the validation prompt through the fallback chain
// ABOUTME: Any failure here is an Unavailable signal; the caller degrades to the heuristic stage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

use serde_json::Value;
use tracing::{debug, instrument};

use super::{ValidationContext, ValidationResult};
use crate::config::{CredentialSet, GatewayConfig};
use crate::errors::AppError;
use crate::llm::prompts::validation_prompt;
use crate::llm::{chat, extract_json, ChatMessage, ChatRequest};

/// Temperature for validation calls; classification wants determinism
const VALIDATION_TEMPERATURE: f32 = 0.1;

/// Token cap for validation replies; the expected JSON is small
const VALIDATION_MAX_TOKENS: u32 = 256;

/// Attempt to validate one answer with a model
///
/// Builds the validation-instruction prompt, runs it through the fallback
/// chain, and parses the reply through the structured response extractor.
/// Returns an error when no provider answers or the reply carries no
/// usable JSON - the caller must then fall back to heuristics rather than
/// surface anything to the user.
///
/// # Errors
///
/// Returns the chain's error when all providers fail, or a serialization
/// error when the reply cannot be interpreted as a validation verdict.
#[instrument(skip_all, fields(context = context.as_str(), prior_attempts))]
pub async fn attempt_model_validation(
    input: &str,
    context: ValidationContext,
    question: &str,
    prior_attempts: u32,
    history: &[ChatMessage],
    credentials: &CredentialSet,
    config: &GatewayConfig,
) -> Result<ValidationResult, AppError> {
    let prompt = validation_prompt(input, context, question, prior_attempts, history);
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
        .with_temperature(VALIDATION_TEMPERATURE)
        .with_max_tokens(VALIDATION_MAX_TOKENS);

    let result = chat(&request, credentials, config).await?;
    debug!(provider = %result.provider, model = %result.model, "Validation reply received");

    let payload = extract_json(&result.text)
        .ok_or_else(|| AppError::serialization("validation reply carried no JSON payload"))?;

    parse_verdict(&payload, input, question)
        .ok_or_else(|| AppError::serialization("validation reply JSON missing isValid field"))
}

/// Interpret the model's JSON verdict, enforcing the result invariants
///
/// A valid verdict missing its parsed value falls back to the trimmed raw
/// input; an invalid verdict missing its follow-up gets a generic re-prompt
/// built from the original question. A payload without a recognizable
/// `isValid` field is rejected entirely.
fn parse_verdict(payload: &Value, input: &str, question: &str) -> Option<ValidationResult> {
    let is_valid = field(payload, &["isValid", "is_valid"])?.as_bool()?;

    let parsed_value = field(payload, &["parsedValue", "parsed_value"]).cloned();
    let follow_up_question = field(payload, &["followUpQuestion", "follow_up_question"])
        .and_then(Value::as_str)
        .map(str::to_owned);
    let confidence = field(payload, &["confidence"])
        .and_then(Value::as_f64)
        .map_or(0.5, |c| c.clamp(0.0, 1.0));
    let reasoning = field(payload, &["reasoning"])
        .and_then(Value::as_str)
        .map(str::to_owned);

    let parsed_value = if is_valid {
        Some(parsed_value.unwrap_or_else(|| Value::from(input.trim())))
    } else {
        parsed_value
    };
    let follow_up_question = if is_valid {
        follow_up_question
    } else {
        Some(follow_up_question.unwrap_or_else(|| {
            format!("Could you try answering that again? {question}")
        }))
    };

    Some(ValidationResult {
        is_valid,
        parsed_value,
        follow_up_question,
        confidence,
        reasoning,
    })
}

fn field<'a>(payload: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| payload.get(name))
        .filter(|v| !v.is_null())
}
