use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::streak::{ProgressPolicy, StreakEvaluator, WeekEvaluator};
use crate::error::ValidationError;
use crate::session::ExerciseSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub const INTERMEDIATE_AT: u32 = 20;
    pub const ADVANCED_AT: u32 = 50;

    pub fn from_total_sessions(total: u32) -> Self {
        if total >= Self::ADVANCED_AT {
            SkillLevel::Advanced
        } else if total >= Self::INTERMEDIATE_AT {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            other => Err(ValidationError::InvalidValue {
                field: "level".to_string(),
                message: format!("unknown level '{other}'"),
            }),
        }
    }
}

/// Rolling summary of one user's sessions.
///
/// `level` is derived from `total_sessions` and has no setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub total_sessions: u32,
    /// Minutes.
    pub total_time: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_goal: u32,
    pub sessions_this_week: u32,
    level: SkillLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_at: Option<DateTime<Utc>>,
}

impl UserProgress {
    pub const DEFAULT_WEEKLY_GOAL: u32 = 5;

    pub fn with_weekly_goal(weekly_goal: u32) -> Self {
        Self {
            weekly_goal,
            ..Self::default()
        }
    }

    pub fn level(&self) -> SkillLevel {
        self.level
    }

    /// Re-establish the derived fields after loading from storage.
    pub fn normalized(mut self) -> Self {
        self.level = SkillLevel::from_total_sessions(self.total_sessions);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self
    }

    pub fn weekly_goal_met(&self) -> bool {
        self.sessions_this_week >= self.weekly_goal
    }
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            total_sessions: 0,
            total_time: 0,
            current_streak: 0,
            longest_streak: 0,
            weekly_goal: Self::DEFAULT_WEEKLY_GOAL,
            sessions_this_week: 0,
            level: SkillLevel::Beginner,
            last_session_at: None,
        }
    }
}

/// Fold one session into the aggregate using the default
/// (always-increment) streak and week policies.
pub fn apply_session(progress: &UserProgress, session: &ExerciseSession) -> UserProgress {
    apply_session_with(progress, session, &ProgressPolicy::default())
}

/// Fold one session into the aggregate. Pure.
pub fn apply_session_with(
    progress: &UserProgress,
    session: &ExerciseSession,
    policy: &ProgressPolicy,
) -> UserProgress {
    let last = progress.last_session_at;
    let total_sessions = progress.total_sessions.saturating_add(1);
    let current_streak = policy
        .streak
        .next_streak(progress.current_streak, last, session.date);
    let sessions_this_week =
        policy
            .week
            .next_week_count(progress.sessions_this_week, last, session.date);

    UserProgress {
        total_sessions,
        total_time: progress
            .total_time
            .saturating_add(rounded_minutes(session.duration_secs())),
        current_streak,
        longest_streak: progress.longest_streak.max(current_streak),
        weekly_goal: progress.weekly_goal,
        sessions_this_week,
        level: SkillLevel::from_total_sessions(total_sessions),
        last_session_at: Some(last.map_or(session.date, |l| l.max(session.date))),
    }
}

/// Nearest whole minute, halves rounding up.
fn rounded_minutes(secs: u64) -> u64 {
    secs.saturating_add(30) / 60
}
