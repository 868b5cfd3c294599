// ABOUTME: Prompt construction for coaching chat and answer validation
// ABOUTME: Pure functions from structured inputs to text, kept separate from transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # Prompts
//!
//! Every prompt in the gateway is a pure function from structured input
//! records to text, with no transport dependency, so prompt content can be
//! tested without any network access.

use std::fmt::Write as _;

use super::ChatMessage;
use crate::context::CondensedContext;
use crate::validation::ValidationContext;

/// Number of trailing history turns echoed into the validation prompt
const VALIDATION_HISTORY_WINDOW: usize = 4;

/// Build the coaching system prompt with the condensed user context injected
///
/// The condensed fragment is token-bounded by construction; only fields that
/// are present contribute lines.
#[must_use]
pub fn coaching_system_prompt(context: &CondensedContext) -> String {
    let mut prompt = String::from(
        "You are Kona, a warm, practical personal coach. Keep replies short, \
         concrete, and encouraging. Never invent data about the user.\n",
    );

    if let Some(name) = &context.name {
        let _ = writeln!(prompt, "User name: {name}");
    }
    if !context.summary.is_empty() {
        let _ = writeln!(prompt, "About the user: {}", context.summary);
    }
    if !context.current_goals.is_empty() {
        let _ = writeln!(prompt, "Current goals: {}", context.current_goals.join("; "));
    }
    let _ = writeln!(prompt, "Recent activity: {}", context.recent_performance);
    if !context.key_traits.is_empty() {
        let _ = writeln!(prompt, "Coaching tone hints: {}", context.key_traits.join(", "));
    }

    prompt
}

/// Build the validation-instruction prompt for one answer
///
/// Embeds the context tag, the original question, the raw input, and a short
/// window of recent history, and instructs the model to reply with a single
/// JSON object matching the validation verdict shape.
#[must_use]
pub fn validation_prompt(
    input: &str,
    context: ValidationContext,
    question: &str,
    prior_attempts: u32,
    history: &[ChatMessage],
) -> String {
    let mut prompt = String::from(
        "You validate one answer a user gave during coaching onboarding.\n",
    );
    let _ = writeln!(prompt, "Expected answer shape: {}", context.as_str());
    let _ = writeln!(prompt, "Question asked: {question}");
    let _ = writeln!(prompt, "User answer: {input}");
    if prior_attempts > 0 {
        let _ = writeln!(
            prompt,
            "The user already failed {prior_attempts} attempt(s); be lenient where reasonable."
        );
    }

    if !history.is_empty() {
        prompt.push_str("Recent conversation:\n");
        let start = history.len().saturating_sub(VALIDATION_HISTORY_WINDOW);
        for message in &history[start..] {
            let _ = writeln!(prompt, "{}: {}", message.role.as_str(), message.content);
        }
    }

    prompt.push_str(
        "\nReply with ONLY a JSON object, no prose:\n\
         {\"isValid\": bool, \"parsedValue\": <normalized value or null>, \
         \"followUpQuestion\": <string or null>, \"confidence\": <0..1>, \
         \"reasoning\": <short string>}\n\
         If isValid is false, followUpQuestion must be a friendly re-prompt.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[test]
    fn test_validation_prompt_embeds_inputs() {
        let prompt = validation_prompt(
            "mon and wed",
            ValidationContext::DaysAvailable,
            "Which days can you train?",
            1,
            &[ChatMessage::assistant("Which days can you train?")],
        );
        assert!(prompt.contains("days_available"));
        assert!(prompt.contains("Which days can you train?"));
        assert!(prompt.contains("mon and wed"));
        assert!(prompt.contains("failed 1 attempt"));
        assert!(prompt.contains("\"isValid\""));
    }

    #[test]
    fn test_system_prompt_omits_absent_fields() {
        let context = CondensedContext {
            name: None,
            summary: String::new(),
            current_goals: Vec::new(),
            recent_performance: "No recent sessions.".to_owned(),
            key_traits: Vec::new(),
        };
        let prompt = coaching_system_prompt(&context);
        assert!(!prompt.contains("User name:"));
        assert!(!prompt.contains("Current goals:"));
        assert!(prompt.contains("No recent sessions."));
    }
}
