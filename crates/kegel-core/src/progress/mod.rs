//! Progress aggregation over recorded sessions.
//!
//! The per-user session log is the source of truth. [`UserProgress`] is a
//! derived aggregate that can be folded forward one session at a time or
//! rebuilt from the whole log, see [`AggregationStrategy`].

mod aggregate;
mod history;
mod streak;
mod tracker;

pub use aggregate::{apply_session, apply_session_with, SkillLevel, UserProgress};
pub use history::{summarize, HistorySummary};
pub use streak::{ProgressPolicy, StreakEvaluator, StreakPolicy, WeekEvaluator, WeekPolicy};
pub use tracker::{AggregationStrategy, ProgressTracker};
