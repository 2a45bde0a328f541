//! Read-side view over a session log for the history screen.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::aggregate::SkillLevel;
use super::streak::same_iso_week;
use crate::session::ExerciseSession;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_sessions: usize,
    pub total_secs: u64,
    pub sessions_this_week: usize,
    pub weekly_goal: u32,
    pub weekly_goal_met: bool,
    /// Consecutive calendar days (UTC) with a session, ending today or
    /// yesterday.
    pub day_streak: u32,
    pub level: SkillLevel,
    /// Newest first.
    pub sessions: Vec<ExerciseSession>,
}

/// Derive history figures from a raw session log as of `now`.
pub fn summarize(
    mut sessions: Vec<ExerciseSession>,
    now: DateTime<Utc>,
    weekly_goal: u32,
) -> HistorySummary {
    sessions.sort_by(|a, b| b.date.cmp(&a.date));

    let sessions_this_week = sessions
        .iter()
        .filter(|s| same_iso_week(s.date, now))
        .count();
    let days: BTreeSet<NaiveDate> = sessions.iter().map(|s| s.date.date_naive()).collect();

    HistorySummary {
        total_sessions: sessions.len(),
        total_secs: sessions.iter().map(ExerciseSession::duration_secs).sum(),
        sessions_this_week,
        weekly_goal,
        weekly_goal_met: sessions_this_week as u32 >= weekly_goal,
        day_streak: day_streak(&days, now.date_naive()),
        level: SkillLevel::from_total_sessions(sessions.len() as u32),
        sessions,
    }
}

fn day_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };
    let mut streak = 0;
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}
