// ABOUTME: Derives the two smaller projections of a UserContext
// ABOUTME: CondensedContext bounds prompt size; the AI summary is the persisted superset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

use super::{CondensedContext, UserContext};

/// Streak length above which the "consistent" trait is attributed
const CONSISTENT_STREAK_THRESHOLD: u32 = 3;

/// Average energy at or above which the "high-energy" trait is attributed
const HIGH_ENERGY_THRESHOLD: f64 = 7.0;

/// Character budget for the echoed AI feedback snippet
const FEEDBACK_SNIPPET_CHARS: usize = 100;

/// Derive the token-bounded prompt fragment from a full context
///
/// Only fields whose source value is present contribute to `summary`; an
/// absent field contributes nothing, never a placeholder string. Traits are
/// appended in a fixed order so the fragment is stable across regenerations.
#[must_use]
pub fn summarize_for_prompt(context: &UserContext) -> CondensedContext {
    let profile = &context.profile;

    let mut key_traits = Vec::new();
    if let Some(personality) = &profile.personality {
        key_traits.push(personality.clone());
    }
    if let Some(lifestyle) = &profile.lifestyle {
        key_traits.push(lifestyle.clone());
    }
    if context.stats.current_streak > CONSISTENT_STREAK_THRESHOLD {
        key_traits.push("consistent".to_owned());
    }
    if context
        .stats
        .average_energy_level
        .is_some_and(|avg| avg >= HIGH_ENERGY_THRESHOLD)
    {
        key_traits.push("high-energy".to_owned());
    }

    let current_goals: Vec<String> = context
        .active_goals()
        .iter()
        .map(|g| format!("{} ({}, {}%)", g.title, g.goal_type, g.progress))
        .collect();

    let recent_performance = if context.recent_sessions.is_empty() {
        "No recent sessions.".to_owned()
    } else {
        let latest_feedback = context
            .recent_sessions
            .iter()
            .max_by_key(|s| s.completed_at)
            .and_then(|s| s.ai_feedback.as_deref());
        match latest_feedback {
            Some(feedback) => format!(
                "{} session(s) this week. Latest feedback: {}",
                context.recent_sessions.len(),
                truncate(feedback, FEEDBACK_SNIPPET_CHARS)
            ),
            None => format!("{} session(s) this week.", context.recent_sessions.len()),
        }
    };

    let mut summary_parts = Vec::new();
    if let Some(motivation) = &profile.motivation {
        summary_parts.push(format!("Motivation: {motivation}."));
    }
    if let Some(availability) = &profile.availability {
        if !availability.days.is_empty() {
            summary_parts.push(format!("Available: {}.", availability.days.join(", ")));
        }
    }
    if !profile.limitations.is_empty() {
        summary_parts.push(format!("Limitations: {}.", profile.limitations.join(", ")));
    }
    let active_count = context.active_goals().len();
    if active_count > 0 {
        summary_parts.push(format!("{active_count} active goal(s)."));
    }

    CondensedContext {
        name: profile.name.clone(),
        summary: summary_parts.join(" "),
        current_goals,
        recent_performance,
        key_traits,
    }
}

/// Generate the durable textual summary of a context
///
/// Superset of [`summarize_for_prompt`], newline-joined, intended for
/// storage. Regenerated and overwritten whenever profile or goal data changes
/// materially, not on every request.
#[must_use]
pub fn generate_ai_summary(context: &UserContext) -> String {
    let profile = &context.profile;
    let mut lines = Vec::new();

    if let Some(name) = &profile.name {
        lines.push(format!("User: {name}"));
    }
    if let Some(motivation) = &profile.motivation {
        lines.push(format!("Motivation: {motivation}"));
    }
    if !profile.interests.is_empty() {
        lines.push(format!("Interests: {}", profile.interests.join(", ")));
    }
    if let Some(availability) = &profile.availability {
        if !availability.days.is_empty() {
            let mut line = format!("Available: {}", availability.days.join(", "));
            if let Some(pref) = &availability.time_preference {
                line.push_str(&format!(" ({pref})"));
            }
            lines.push(line);
        }
    }
    if !profile.limitations.is_empty() {
        lines.push(format!("Limitations: {}", profile.limitations.join(", ")));
    }

    if !context.goals.is_empty() {
        lines.push("Goals:".to_owned());
        for goal in &context.goals {
            lines.push(format!(
                "- {} [{}] {}% ({})",
                goal.title,
                goal.goal_type,
                goal.progress,
                goal.status.as_str()
            ));
        }
    }

    lines.push(format!("Total sessions: {}", context.stats.total_sessions));
    lines.push(format!(
        "Completed this week: {}",
        context.stats.completed_this_week
    ));
    lines.push(format!("Current streak: {}", context.stats.current_streak));
    if let Some(avg) = context.stats.average_energy_level {
        lines.push(format!("Average energy level: {avg:.1}"));
    }

    lines.join("\n")
}

/// Truncate to a character budget without splitting a UTF-8 code point
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Goal, GoalStatus, SessionLog, UserProfile, UserStats};
    use chrono::Utc;
    use uuid::Uuid;

    fn bare_context() -> UserContext {
        UserContext {
            user_id: Uuid::new_v4(),
            profile: UserProfile::default(),
            goals: Vec::new(),
            recent_sessions: Vec::new(),
            stats: UserStats::default(),
        }
    }

    fn session(ai_feedback: Option<&str>) -> SessionLog {
        SessionLog {
            id: Uuid::new_v4(),
            session_title: "Session".to_owned(),
            completed_at: Utc::now(),
            metrics_result: None,
            user_feedback: None,
            ai_feedback: ai_feedback.map(str::to_owned),
            energy_level: None,
        }
    }

    #[test]
    fn test_absent_fields_contribute_nothing() {
        let condensed = summarize_for_prompt(&bare_context());
        assert!(condensed.summary.is_empty());
        assert!(!condensed.summary.contains("Limitations:"));
        assert_eq!(condensed.recent_performance, "No recent sessions.");
        assert!(condensed.key_traits.is_empty());
    }

    #[test]
    fn test_trait_order_and_thresholds() {
        let mut context = bare_context();
        context.profile.personality = Some("playful".to_owned());
        context.profile.lifestyle = Some("busy parent".to_owned());
        context.stats.current_streak = 4;
        context.stats.average_energy_level = Some(7.0);
        let condensed = summarize_for_prompt(&context);
        assert_eq!(
            condensed.key_traits,
            vec!["playful", "busy parent", "consistent", "high-energy"]
        );

        // Streak of exactly 3 does not qualify; neither does energy below 7
        context.stats.current_streak = 3;
        context.stats.average_energy_level = Some(6.9);
        let condensed = summarize_for_prompt(&context);
        assert_eq!(condensed.key_traits, vec!["playful", "busy parent"]);
    }

    #[test]
    fn test_feedback_truncated_to_100_chars() {
        let long = "x".repeat(250);
        let mut context = bare_context();
        context.recent_sessions.push(session(Some(&long)));
        let condensed = summarize_for_prompt(&context);
        let snippet: String = "x".repeat(100);
        assert!(condensed.recent_performance.ends_with(&snippet));
        assert!(!condensed.recent_performance.ends_with(&"x".repeat(101)));
    }

    #[test]
    fn test_ai_summary_includes_goal_lines() {
        let mut context = bare_context();
        context.goals.push(Goal {
            id: Uuid::new_v4(),
            title: "Run a 10k".to_owned(),
            goal_type: "endurance".to_owned(),
            description: None,
            current_level: None,
            target_level: None,
            status: GoalStatus::Active,
            progress: 40,
            created_at: Utc::now(),
            conversation_log: Vec::new(),
        });
        let summary = generate_ai_summary(&context);
        assert!(summary.contains("- Run a 10k [endurance] 40% (active)"));
        assert!(summary.contains("Total sessions: 0"));
    }

    #[test]
    fn test_condensed_goal_format() {
        let mut context = bare_context();
        context.goals.push(Goal {
            id: Uuid::new_v4(),
            title: "Sleep earlier".to_owned(),
            goal_type: "habit".to_owned(),
            description: None,
            current_level: None,
            target_level: None,
            status: GoalStatus::Active,
            progress: 10,
            created_at: Utc::now(),
            conversation_log: Vec::new(),
        });
        context.goals.push(Goal {
            id: Uuid::new_v4(),
            title: "Done already".to_owned(),
            goal_type: "habit".to_owned(),
            description: None,
            current_level: None,
            target_level: None,
            status: GoalStatus::Completed,
            progress: 100,
            created_at: Utc::now(),
            conversation_log: Vec::new(),
        });
        let condensed = summarize_for_prompt(&context);
        assert_eq!(condensed.current_goals, vec!["Sleep earlier (habit, 10%)"]);
    }
}
