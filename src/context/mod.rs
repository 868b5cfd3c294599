// ABOUTME: User context value types aggregated per request from persisted coaching records
// ABOUTME: Profile, goals, session logs, derived stats, and the condensed prompt projection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Kona Coaching

//! # User Context
//!
//! Value objects reconstructed per request from records owned by the external
//! data store. The core never owns durable storage; [`UserContext`] and its
//! children live only for the request, and the sole persisted derivative is
//! the textual summary produced by
//! [`generate_ai_summary`](crate::context::generate_ai_summary).
//!
//! Every profile field is optional: absence means "not yet known", never an
//! error. Onboarding fills these in gradually through the validated chat flow.

mod builder;
mod condenser;

pub use builder::build_user_context;
pub use condenser::{generate_ai_summary, summarize_for_prompt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::ChatMessage;

/// Weekly availability captured during onboarding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Availability {
    /// Ordered set of weekday names (lowercase)
    pub days: Vec<String>,
    /// Preferred time of day, free text ("mornings", "after work", ...)
    pub time_preference: Option<String>,
}

/// Structured subset of onboarding answers
///
/// All fields optional; the validated chat flow fills them in over time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Preferred name
    pub name: Option<String>,
    /// Why the user is here, in their own words
    pub motivation: Option<String>,
    /// Interests / activities the user enjoys
    #[serde(default)]
    pub interests: Vec<String>,
    /// Lifestyle descriptor ("desk job, two kids", ...)
    pub lifestyle: Option<String>,
    /// Past training/coaching experience descriptor
    pub past_experience: Option<String>,
    /// Personality descriptor used to tune coaching tone
    pub personality: Option<String>,
    /// Weekly availability
    pub availability: Option<Availability>,
    /// Physical limitations; empty means "none reported"
    #[serde(default)]
    pub limitations: Vec<String>,
    /// Short-term goal text
    pub short_term_goal: Option<String>,
    /// Long-term goal text
    pub long_term_goal: Option<String>,
    /// Physical stats free text ("178cm, 74kg", ...)
    pub physical_stats: Option<String>,
}

/// Lifecycle status of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Being actively pursued
    Active,
    /// Reached
    Completed,
    /// Set aside for now
    Paused,
}

impl GoalStatus {
    /// Parse from the status column (defaults to `Active` for unknown values)
    #[must_use]
    pub fn parse_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" => Self::Completed,
            "paused" => Self::Paused,
            _ => Self::Active,
        }
    }

    /// String representation matching the stored column values
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }
}

/// A coaching goal with its refinement conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    ///Stable identifier
    pub id: Uuid,
    /// Short title
    pub title: String,
    /// Type tag ("endurance", "strength", "habit", ...)
    pub goal_type: String,
    /// Free text description
    pub description: Option<String>,
    /// Where the user is today
    pub current_level: Option<String>,
    /// Where the user wants to be
    pub target_level: Option<String>,
    /// Lifecycle status
    pub status: GoalStatus,
    /// Progress 0-100
    pub progress: u8,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Append-only conversation log captured during goal refinement
    #[serde(default)]
    pub conversation_log: Vec<ChatMessage>,
}

/// Record of one completed coaching session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    /// Stable identifier
    pub id: Uuid,
    /// Title of the linked session
    pub session_title: String,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
    /// Free-form metrics result ("3x8 @ 60kg", "5k in 27:40", ...)
    pub metrics_result: Option<String>,
    /// What the user said about the session
    pub user_feedback: Option<String>,
    /// What the coach said back
    pub ai_feedback: Option<String>,
    /// Self-reported energy level 1-10, absent if not rated
    pub energy_level: Option<u8>,
}

/// Derived activity counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    /// All-time completed sessions
    pub total_sessions: u32,
    /// Sessions completed in the current week
    pub completed_this_week: u32,
    /// Consecutive days with a completed session
    pub current_streak: u32,
    /// Mean of the energy ratings present in the recent window; `None` when
    /// no recent session carries a rating
    pub average_energy_level: Option<f64>,
}

/// Aggregate user context, rebuilt fresh on every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// User identity
    pub user_id: Uuid,
    /// Structured onboarding answers
    pub profile: UserProfile,
    /// All goals, newest first
    pub goals: Vec<Goal>,
    /// Sessions from the last 7 days, as supplied by the data collaborator
    pub recent_sessions: Vec<SessionLog>,
    /// Derived counters
    pub stats: UserStats,
}

impl UserContext {
    /// Goals currently being pursued
    #[must_use]
    pub fn active_goals(&self) -> Vec<&Goal> {
        self.goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .collect()
    }
}

/// Token-bounded projection of [`UserContext`] injected into system prompts
///
/// Strictly smaller than the full context; regenerated on demand, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondensedContext {
    /// Preferred name, if known
    pub name: Option<String>,
    /// Space-joined summary of the profile fields that are present
    pub summary: String,
    /// Active goals as "title (type, progress%)" lines
    pub current_goals: Vec<String>,
    /// One-line description of recent session activity
    pub recent_performance: String,
    /// Trait tags used to tune coaching tone
    pub key_traits: Vec<String>,
}
