//! Streak and weekly-count policies.
//!
//! The defaults only ever increment, matching how progress has always been
//! counted. Calendar-aware policies reset the counters when a day or an ISO
//! week is skipped.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Decides the streak after a new session lands at `now`.
pub trait StreakEvaluator {
    fn next_streak(&self, current: u32, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32;
}

/// Decides the "sessions this week" counter after a new session.
pub trait WeekEvaluator {
    fn next_week_count(
        &self,
        current: u32,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakPolicy {
    /// Every session extends the streak.
    #[default]
    Unbounded,
    /// Streak counts calendar days (UTC). A gap longer than
    /// `1 + grace_days` days restarts it; extra sessions on the same day
    /// don't extend it.
    Daily { grace_days: u32 },
}

impl StreakEvaluator for StreakPolicy {
    fn next_streak(&self, current: u32, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
        match *self {
            StreakPolicy::Unbounded => current.saturating_add(1),
            StreakPolicy::Daily { grace_days } => {
                let Some(last) = last else {
                    return 1;
                };
                let gap = (now.date_naive() - last.date_naive()).num_days();
                if gap <= 0 {
                    current.max(1)
                } else if gap <= 1 + i64::from(grace_days) {
                    current.saturating_add(1)
                } else {
                    1
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekPolicy {
    /// Never resets.
    #[default]
    Unbounded,
    /// Resets when the session falls in a different ISO week than the
    /// previous one.
    IsoWeek,
}

impl WeekEvaluator for WeekPolicy {
    fn next_week_count(
        &self,
        current: u32,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> u32 {
        match self {
            WeekPolicy::Unbounded => current.saturating_add(1),
            WeekPolicy::IsoWeek => match last {
                Some(last) if same_iso_week(last, now) => current.saturating_add(1),
                _ => 1,
            },
        }
    }
}

pub(crate) fn same_iso_week(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    let (a, b) = (a.iso_week(), b.iso_week());
    a.year() == b.year() && a.week() == b.week()
}

/// Streak and week evaluators applied together by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressPolicy {
    #[serde(default)]
    pub week: WeekPolicy,
    #[serde(default)]
    pub streak: StreakPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        // January 2024: the 1st is a Monday.
        Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn unbounded_always_increments() {
        let p = StreakPolicy::Unbounded;
        assert_eq!(p.next_streak(3, Some(day(1)), day(30)), 4);
        assert_eq!(WeekPolicy::Unbounded.next_week_count(7, Some(day(1)), day(30)), 8);
    }

    #[test]
    fn daily_streak_rules() {
        let p = StreakPolicy::Daily { grace_days: 0 };
        assert_eq!(p.next_streak(0, None, day(1)), 1);
        assert_eq!(p.next_streak(2, Some(day(1)), day(1)), 2);
        assert_eq!(p.next_streak(2, Some(day(1)), day(2)), 3);
        assert_eq!(p.next_streak(2, Some(day(1)), day(3)), 1);
    }

    #[test]
    fn daily_grace_allows_skipped_day() {
        let p = StreakPolicy::Daily { grace_days: 1 };
        assert_eq!(p.next_streak(5, Some(day(1)), day(3)), 6);
        assert_eq!(p.next_streak(5, Some(day(1)), day(4)), 1);
    }

    #[test]
    fn iso_week_resets_on_new_week() {
        let p = WeekPolicy::IsoWeek;
        assert_eq!(p.next_week_count(0, None, day(1)), 1);
        assert_eq!(p.next_week_count(3, Some(day(1)), day(7)), 4);
        assert_eq!(p.next_week_count(3, Some(day(7)), day(8)), 1);
    }

    #[test]
    fn policy_toml_shape() {
        let policy = ProgressPolicy {
            streak: StreakPolicy::Daily { grace_days: 1 },
            week: WeekPolicy::IsoWeek,
        };
        let text = toml::to_string(&policy).unwrap();
        let back: ProgressPolicy = toml::from_str(&text).unwrap();
        assert_eq!(back, policy);
    }
}
