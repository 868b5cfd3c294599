// ABOUTME: Integration tests building user context from raw rows and condensing it for prompts
// ABOUTME: Covers tolerant row parsing, derived stats, and absent-field behaviour
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use kona_ai::context::{Availability, GoalStatus, SessionLog, UserContext, UserProfile, UserStats};
use kona_ai::{build_user_context, generate_ai_summary, summarize_for_prompt};
use serde_json::json;
use uuid::Uuid;

fn profile_row() -> serde_json::Value {
    json!({
        "name": "Jamie",
        "motivation": "be less tired all the time",
        "interests": "[\"darts\",\"running\"]",
        "lifestyle": "desk job",
        "personality": "analytical",
        "limitations": ["bad left knee"],
    })
}

fn goal_row(status: &str, progress: u64) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": "Run a 5k",
        "goal_type": "endurance",
        "status": status,
        "progress": progress,
        "created_at": "2025-06-01T09:00:00Z",
    })
}

fn session_row(energy: Option<u64>, ai_feedback: &str) -> serde_json::Value {
    let mut row = json!({
        "id": Uuid::new_v4().to_string(),
        "session_title": "Easy run",
        "completed_at": "2025-08-28T18:30:00Z",
        "ai_feedback": ai_feedback,
    });
    if let Some(energy) = energy {
        row["energy_level"] = json!(energy);
    }
    row
}

#[test]
fn builder_tolerates_string_encoded_arrays() {
    let context = build_user_context(Uuid::new_v4(), Some(&profile_row()), &[], &[], None);
    assert_eq!(context.profile.name.as_deref(), Some("Jamie"));
    assert_eq!(context.profile.interests, vec!["darts", "running"]);
    assert_eq!(context.profile.limitations, vec!["bad left knee"]);
}

#[test]
fn builder_averages_only_rated_sessions() {
    let sessions = vec![
        session_row(Some(8), "good"),
        session_row(None, "unrated"),
        session_row(Some(6), "ok"),
    ];
    let context = build_user_context(Uuid::new_v4(), None, &[], &sessions, None);
    assert_eq!(context.recent_sessions.len(), 3);
    assert_eq!(context.stats.average_energy_level, Some(7.0));
}

#[test]
fn builder_clamps_goal_progress() {
    let context = build_user_context(
        Uuid::new_v4(),
        None,
        &[goal_row("active", 250)],
        &[],
        None,
    );
    assert_eq!(context.goals[0].progress, 100);
    assert_eq!(context.goals[0].status, GoalStatus::Active);
}

#[test]
fn builder_with_no_rows_yields_empty_context() {
    let context = build_user_context(Uuid::new_v4(), None, &[], &[], None);
    assert!(context.profile.name.is_none());
    assert!(context.goals.is_empty());
    assert!(context.recent_sessions.is_empty());
    assert_eq!(context.stats.average_energy_level, None);
}

fn context_from_rows() -> UserContext {
    let goals = vec![goal_row("active", 40), goal_row("completed", 100)];
    let sessions = vec![session_row(Some(9), &"x".repeat(150))];
    let stats = json!({
        "total_sessions": 20,
        "completed_this_week": 1,
        "current_streak": 5,
    });
    build_user_context(
        Uuid::new_v4(),
        Some(&profile_row()),
        &goals,
        &sessions,
        Some(&stats),
    )
}

#[test]
fn condenser_orders_key_traits() {
    let context = context_from_rows();
    let condensed = summarize_for_prompt(&context);
    // personality, lifestyle, then derived tags
    assert_eq!(
        condensed.key_traits,
        vec!["analytical", "desk job", "consistent", "high-energy"]
    );
}

#[test]
fn condenser_truncates_long_feedback() {
    let condensed = summarize_for_prompt(&context_from_rows());
    assert!(condensed.recent_performance.starts_with("1 session(s) this week."));
    let snippet = condensed
        .recent_performance
        .split("Latest feedback: ")
        .nth(1)
        .unwrap();
    assert_eq!(snippet.chars().count(), 100);
}

#[test]
fn condenser_only_lists_active_goals() {
    let condensed = summarize_for_prompt(&context_from_rows());
    assert_eq!(condensed.current_goals, vec!["Run a 5k (endurance, 40%)"]);
    assert!(condensed.summary.contains("1 active goal(s)."));
}

#[test]
fn absent_fields_leave_no_trace_in_summary() {
    let context = UserContext {
        user_id: Uuid::new_v4(),
        profile: UserProfile {
            motivation: Some("keep moving".to_owned()),
            ..UserProfile::default()
        },
        goals: Vec::new(),
        recent_sessions: Vec::new(),
        stats: UserStats::default(),
    };
    let condensed = summarize_for_prompt(&context);
    assert_eq!(condensed.summary, "Motivation: keep moving.");
    assert!(!condensed.summary.contains("Limitations:"));
    assert!(!condensed.summary.contains("Available:"));
    assert_eq!(condensed.recent_performance, "No recent sessions.");
    assert!(condensed.key_traits.is_empty());
}

#[test]
fn availability_days_appear_when_present() {
    let context = UserContext {
        user_id: Uuid::new_v4(),
        profile: UserProfile {
            availability: Some(Availability {
                days: vec!["monday".to_owned(), "thursday".to_owned()],
                time_preference: None,
            }),
            ..UserProfile::default()
        },
        goals: Vec::new(),
        recent_sessions: Vec::new(),
        stats: UserStats::default(),
    };
    let condensed = summarize_for_prompt(&context);
    assert_eq!(condensed.summary, "Available: monday, thursday.");
}

#[test]
fn ai_summary_includes_goal_lines_and_counters() {
    let context = context_from_rows();
    let summary = generate_ai_summary(&context);
    assert!(summary.contains("Run a 5k"));
    assert!(summary.contains("40%"));
    assert!(summary.contains("active"));
}

#[test]
fn session_log_survives_missing_optionals() {
    let row = json!({
        "id": Uuid::new_v4().to_string(),
        "session_title": "Stretching",
        "completed_at": "2025-08-29T08:00:00Z",
    });
    let context = build_user_context(Uuid::new_v4(), None, &[], &[row], None);
    let session: &SessionLog = &context.recent_sessions[0];
    assert_eq!(session.session_title, "Stretching");
    assert!(session.energy_level.is_none());
    assert!(session.user_feedback.is_none());
}
