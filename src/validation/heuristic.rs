// ABOUTME: Fully offline heuristic validator, the fallback of last resort when no model is reachable
// ABOUTME: Deliberately asymmetric - strict on name/days/yes-no/number, permissive on everything else
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use super::{ValidationContext, ValidationResult};

/// Confidence for an exact token-list match (yes/no)
const CONFIDENCE_EXACT: f64 = 1.0;

/// Confidence for a pattern match (name, weekday tokens, integer)
const CONFIDENCE_PATTERN: f64 = 0.9;

/// Confidence for a rejection by a strict rule
const CONFIDENCE_REJECT: f64 = 0.8;

/// Confidence for unconditional catch-all acceptance
const CONFIDENCE_DEFAULT: f64 = 0.7;

/// Weekdays in canonical order, used to normalize expanded day sets
const WEEK: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Affirmative tokens accepted for yes/no answers
const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "definitely", "absolutely",
];

/// Negative tokens accepted for yes/no answers
const NEGATIVE: &[&str] = &["no", "n", "nope", "nah", "not really", "never"];

/// Negation words mapping physical-info answers to "no limitations"
const NO_LIMITATIONS: &[&str] = &["none", "no", "nothing", "n/a", "na"];

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z' \-]*$").expect("valid regex"))
}

fn day_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sat|sunday|sun|weekdays|weekday|weekends|weekend|everyday|every day|daily|any day)\b",
        )
        .expect("valid regex")
    })
}

/// Validate one answer using offline rules only
///
/// Empty or whitespace-only input is always invalid regardless of context.
/// The strict contexts (`name`, `days_available`, `yes_no`, `number`) apply
/// real rules; every remaining context accepts any non-empty input, since a
/// wrong acceptance there costs little while a wrong rejection stalls the
/// conversation.
#[must_use]
pub fn heuristic_validation(
    input: &str,
    context: ValidationContext,
    question: &str,
) -> ValidationResult {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid(
            format!("I didn't catch that - could you answer again? {question}"),
            CONFIDENCE_EXACT,
        );
    }

    match context {
        ValidationContext::Name => validate_name(trimmed),
        ValidationContext::DaysAvailable => validate_days(trimmed),
        ValidationContext::YesNo => validate_yes_no(trimmed),
        ValidationContext::Number => validate_number(trimmed),
        ValidationContext::Interests => {
            let interests: Vec<String> = trimmed
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
            ValidationResult::valid(json!(interests), CONFIDENCE_DEFAULT)
        }
        ValidationContext::PhysicalInfo => {
            let limitations: Vec<String> = if NO_LIMITATIONS.contains(&trimmed.to_lowercase().as_str()) {
                Vec::new()
            } else {
                vec![trimmed.to_owned()]
            };
            ValidationResult::valid(json!(limitations), CONFIDENCE_DEFAULT)
        }
        // Permissive catch-all: free text and descriptor contexts accept
        // any non-empty input
        ValidationContext::FreeText
        | ValidationContext::Personality
        | ValidationContext::ExperienceLevel
        | ValidationContext::GoalDescription
        | ValidationContext::Duration
        | ValidationContext::TimeAvailable => {
            ValidationResult::valid(json!(trimmed), CONFIDENCE_DEFAULT)
        }
    }
}

fn validate_name(trimmed: &str) -> ValidationResult {
    if trimmed.len() >= 2 && name_pattern().is_match(trimmed) {
        ValidationResult::valid(json!(trimmed), CONFIDENCE_PATTERN)
    } else {
        ValidationResult::invalid(
            "That doesn't quite look like a name. What should I call you?",
            CONFIDENCE_REJECT,
        )
    }
}

fn validate_days(trimmed: &str) -> ValidationResult {
    let mut days: Vec<&str> = Vec::new();
    for capture in day_token_pattern().find_iter(trimmed) {
        let token = capture.as_str().to_lowercase();
        let expansion: &[&str] = match token.as_str() {
            "monday" | "mon" => &["monday"],
            "tuesday" | "tues" | "tue" => &["tuesday"],
            "wednesday" | "wed" => &["wednesday"],
            "thursday" | "thurs" | "thur" | "thu" => &["thursday"],
            "friday" | "fri" => &["friday"],
            "saturday" | "sat" => &["saturday"],
            "sunday" | "sun" => &["sunday"],
            "weekday" | "weekdays" => &WEEK[0..5],
            "weekend" | "weekends" => &WEEK[5..7],
            _ => &WEEK, // everyday / every day / daily / any day
        };
        for day in expansion {
            if !days.contains(day) {
                days.push(*day);
            }
        }
    }

    if days.is_empty() {
        ValidationResult::invalid(
            "Which days work for you? For example: 'Monday, Wednesday, Friday', \
             'weekdays', or 'every day'.",
            CONFIDENCE_REJECT,
        )
    } else {
        ValidationResult::valid(json!(days), CONFIDENCE_PATTERN)
    }
}

fn validate_yes_no(trimmed: &str) -> ValidationResult {
    let lowered = trimmed.to_lowercase();
    if AFFIRMATIVE.contains(&lowered.as_str()) {
        ValidationResult::valid(json!({ "value": true }), CONFIDENCE_EXACT)
    } else if NEGATIVE.contains(&lowered.as_str()) {
        ValidationResult::valid(json!({ "value": false }), CONFIDENCE_EXACT)
    } else {
        ValidationResult::invalid(
            "A simple yes or no works best here - which is it?",
            CONFIDENCE_REJECT,
        )
    }
}

fn validate_number(trimmed: &str) -> ValidationResult {
    match trimmed.parse::<i64>() {
        Ok(value) => ValidationResult::valid(Value::from(value), CONFIDENCE_PATTERN),
        Err(_) => ValidationResult::invalid(
            "I need a number here - for example '3'.",
            CONFIDENCE_REJECT,
        ),
    }
}
