use serde::{Deserialize, Serialize};

use super::aggregate::{apply_session_with, UserProgress};
use super::streak::ProgressPolicy;
use crate::identity::AuthContext;
use crate::session::ExerciseSession;
use crate::storage::{KeyValueStore, ProgressStore};

/// How the stored aggregate is kept in step with the session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Fold each new session into the last stored aggregate.
    #[default]
    Incremental,
    /// Rebuild the aggregate from the full session log every time.
    Recompute,
}

/// Keeps the persisted [`UserProgress`] in step with recorded sessions.
pub struct ProgressTracker<'s, S: KeyValueStore> {
    store: &'s ProgressStore<S>,
    strategy: AggregationStrategy,
    policy: ProgressPolicy,
    weekly_goal: u32,
}

impl<'s, S: KeyValueStore> ProgressTracker<'s, S> {
    pub fn new(store: &'s ProgressStore<S>) -> Self {
        Self {
            store,
            strategy: AggregationStrategy::default(),
            policy: ProgressPolicy::default(),
            weekly_goal: UserProgress::DEFAULT_WEEKLY_GOAL,
        }
    }

    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_policy(mut self, policy: ProgressPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_weekly_goal(mut self, weekly_goal: u32) -> Self {
        self.weekly_goal = weekly_goal;
        self
    }

    pub fn strategy(&self) -> AggregationStrategy {
        self.strategy
    }

    /// Current aggregate for the caller. Defaults when nothing is stored.
    pub fn progress(&self, ctx: &AuthContext) -> UserProgress {
        match self.strategy {
            AggregationStrategy::Incremental => self.stored_or_default(ctx),
            AggregationStrategy::Recompute => self.recompute(ctx, None),
        }
    }

    /// Fold a just-recorded session into the caller's aggregate and persist
    /// it. The returned value is what was (attempted to be) stored.
    pub fn record(&self, ctx: &AuthContext, session: &ExerciseSession) -> UserProgress {
        let updated = match self.strategy {
            AggregationStrategy::Incremental => {
                apply_session_with(&self.stored_or_default(ctx), session, &self.policy)
            }
            AggregationStrategy::Recompute => self.recompute(ctx, Some(session)),
        };
        if !self.store.store_progress_for(ctx.user_id(), &updated) {
            tracing::warn!("progress aggregate not persisted");
        }
        updated
    }

    /// The configured goal always wins over whatever was stored with the
    /// aggregate.
    fn stored_or_default(&self, ctx: &AuthContext) -> UserProgress {
        match self.store.progress_for(ctx.user_id()) {
            Some(mut stored) => {
                stored.weekly_goal = self.weekly_goal;
                stored
            }
            None => UserProgress::with_weekly_goal(self.weekly_goal),
        }
    }

    /// Fold the whole log oldest-first. `extra` is included if the log
    /// doesn't already hold it (e.g. its write failed).
    fn recompute(&self, ctx: &AuthContext, extra: Option<&ExerciseSession>) -> UserProgress {
        let mut sessions = self.store.sessions_for(ctx.user_id());
        if let Some(extra) = extra {
            if !sessions.iter().any(|s| s.id == extra.id) {
                sessions.push(extra.clone());
            }
        }
        sessions.sort_by_key(|s| s.date);

        let start = UserProgress::with_weekly_goal(self.weekly_goal);
        sessions
            .iter()
            .fold(start, |acc, s| apply_session_with(&acc, s, &self.policy))
    }
}
