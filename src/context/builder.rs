// ABOUTME: Builds a UserContext from loosely-typed rows supplied by the data-access collaborator
// ABOUTME: Tolerant of nulls and missing columns; absent fields become None, never errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{
    Availability, Goal, GoalStatus, SessionLog, UserContext, UserProfile, UserStats,
};
use crate::llm::{ChatMessage, MessageRole};

/// Build a [`UserContext`] from raw data-store rows
///
/// Pure transform over already-fetched records. Every column is optional:
/// null or missing values become `None` / empty collections, never an error.
/// `average_energy_level` is the arithmetic mean of the energy ratings that
/// are present in the recent window; unrated sessions are excluded from both
/// numerator and denominator. The caller supplies `session_rows` already
/// windowed to the last 7 days, along with the other pre-computed counters in
/// `stats_row`.
#[must_use]
pub fn build_user_context(
    user_id: Uuid,
    profile_row: Option<&Value>,
    goal_rows: &[Value],
    session_rows: &[Value],
    stats_row: Option<&Value>,
) -> UserContext {
    let profile = profile_row.map(parse_profile).unwrap_or_default();
    let goals: Vec<Goal> = goal_rows.iter().map(parse_goal).collect();
    let recent_sessions: Vec<SessionLog> = session_rows.iter().map(parse_session).collect();

    let ratings: Vec<f64> = recent_sessions
        .iter()
        .filter_map(|s| s.energy_level)
        .map(f64::from)
        .collect();
    let average_energy_level = if ratings.is_empty() {
        None
    } else {
        #[allow(clippy::cast_precision_loss)]
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let stats = UserStats {
        total_sessions: stats_row.and_then(|r| u32_field(r, "total_sessions")).unwrap_or(0),
        completed_this_week: stats_row
            .and_then(|r| u32_field(r, "completed_this_week"))
            .unwrap_or(0),
        current_streak: stats_row
            .and_then(|r| u32_field(r, "current_streak"))
            .unwrap_or(0),
        average_energy_level,
    };

    debug!(
        %user_id,
        goals = goals.len(),
        recent_sessions = recent_sessions.len(),
        "Built user context"
    );

    UserContext {
        user_id,
        profile,
        goals,
        recent_sessions,
        stats,
    }
}

fn parse_profile(row: &Value) -> UserProfile {
    let availability = row.get("availability").filter(|v| !v.is_null()).map(|v| {
        Availability {
            days: string_list(v.get("days")),
            time_preference: v
                .get("time_preference")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    });

    UserProfile {
        name: str_field(row, "name"),
        motivation: str_field(row, "motivation"),
        interests: string_list(row.get("interests")),
        lifestyle: str_field(row, "lifestyle"),
        past_experience: str_field(row, "past_experience"),
        personality: str_field(row, "personality"),
        availability,
        limitations: string_list(row.get("limitations")),
        short_term_goal: str_field(row, "short_term_goal"),
        long_term_goal: str_field(row, "long_term_goal"),
        physical_stats: str_field(row, "physical_stats"),
    }
}

fn parse_goal(row: &Value) -> Goal {
    Goal {
        id: uuid_field(row, "id"),
        title: str_field(row, "title").unwrap_or_default(),
        goal_type: str_field(row, "goal_type").unwrap_or_else(|| "general".to_owned()),
        description: str_field(row, "description"),
        current_level: str_field(row, "current_level"),
        target_level: str_field(row, "target_level"),
        status: str_field(row, "status")
            .map(|s| GoalStatus::parse_str(&s))
            .unwrap_or(GoalStatus::Active),
        progress: progress_field(row),
        created_at: datetime_field(row, "created_at"),
        conversation_log: conversation_field(row.get("conversation_log")),
    }
}

fn parse_session(row: &Value) -> SessionLog {
    SessionLog {
        id: uuid_field(row, "id"),
        session_title: str_field(row, "session_title").unwrap_or_default(),
        completed_at: datetime_field(row, "completed_at"),
        metrics_result: str_field(row, "metrics_result"),
        user_feedback: str_field(row, "user_feedback"),
        ai_feedback: str_field(row, "ai_feedback"),
        energy_level: row
            .get("energy_level")
            .and_then(Value::as_u64)
            .filter(|&n| (1..=10).contains(&n))
            .and_then(|n| u8::try_from(n).ok()),
    }
}

// ============================================================================
// Row field helpers
// ============================================================================

fn str_field(row: &Value, name: &str) -> Option<String> {
    row.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn u32_field(row: &Value, name: &str) -> Option<u32> {
    row.get(name)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn uuid_field(row: &Value, name: &str) -> Uuid {
    row.get(name)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn datetime_field(row: &Value, name: &str) -> DateTime<Utc> {
    row.get(name)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}

fn progress_field(row: &Value) -> u8 {
    row.get("progress")
        .and_then(Value::as_u64)
        .map_or(0, |n| u8::try_from(n.min(100)).unwrap_or(100))
}

/// Read a list column that may be stored either as a JSON array or, from the
/// legacy schema, as a JSON-encoded string like `'["darts","running"]'`
fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Value::String(s) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            } else if s.trim().is_empty() {
                Vec::new()
            } else {
                vec![s.clone()]
            }
        }
        _ => Vec::new(),
    }
}

/// Read the conversation log column, stored as an array of role/content pairs
fn conversation_field(value: Option<&Value>) -> Vec<ChatMessage> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let role = match item.get("role").and_then(Value::as_str)? {
                "system" => MessageRole::System,
                "assistant" => MessageRole::Assistant,
                _ => MessageRole::User,
            };
            let content = item.get("content").and_then(Value::as_str)?;
            Some(ChatMessage::new(role, content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interests_stored_as_json_string_are_parsed() {
        let row = json!({ "interests": "[\"darts\",\"running\"]" });
        let profile = parse_profile(&row);
        assert_eq!(profile.interests, vec!["darts", "running"]);
    }

    #[test]
    fn test_null_columns_become_none() {
        let row = json!({ "name": null, "motivation": "get fit" });
        let profile = parse_profile(&row);
        assert!(profile.name.is_none());
        assert_eq!(profile.motivation.as_deref(), Some("get fit"));
        assert!(profile.availability.is_none());
        assert!(profile.limitations.is_empty());
    }

    #[test]
    fn test_energy_average_skips_unrated_sessions() {
        let sessions = vec![
            json!({ "session_title": "run", "energy_level": 8 }),
            json!({ "session_title": "lift" }),
            json!({ "session_title": "swim", "energy_level": 6 }),
        ];
        let ctx = build_user_context(Uuid::new_v4(), None, &[], &sessions, None);
        assert_eq!(ctx.stats.average_energy_level, Some(7.0));
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let row = json!({ "title": "Run a 10k", "progress": 250 });
        assert_eq!(parse_goal(&row).progress, 100);
    }
}
