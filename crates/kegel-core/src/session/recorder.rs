use chrono::Utc;

use super::record::{ExerciseSession, SessionId};
use crate::identity::AuthContext;
use crate::storage::{KeyValueStore, ProgressStore};
use crate::timer::ExerciseProtocol;

/// Turns a completed run into a stored [`ExerciseSession`].
///
/// Best effort: a failed write is logged and the id is still returned, so
/// the caller can show the run as completed regardless.
pub struct SessionRecorder<'s, S: KeyValueStore> {
    store: &'s ProgressStore<S>,
}

impl<'s, S: KeyValueStore> SessionRecorder<'s, S> {
    pub fn new(store: &'s ProgressStore<S>) -> Self {
        Self { store }
    }

    pub fn record_session(
        &self,
        ctx: &AuthContext,
        repetitions: u32,
        contraction_duration: u32,
        relaxation_duration: u32,
    ) -> SessionId {
        let session = ExerciseSession::new(
            ctx.user_id().cloned(),
            repetitions,
            contraction_duration,
            relaxation_duration,
            Utc::now(),
        );
        self.append(ctx, &session);
        session.id
    }

    /// Record a run of `protocol` and hand back the full record.
    pub fn record_protocol(
        &self,
        ctx: &AuthContext,
        protocol: &ExerciseProtocol,
    ) -> ExerciseSession {
        let owner = ctx.user_id().cloned();
        let session = ExerciseSession::from_protocol(owner, protocol, Utc::now());
        self.append(ctx, &session);
        session
    }

    fn append(&self, ctx: &AuthContext, session: &ExerciseSession) {
        if !ctx.is_authenticated() {
            tracing::warn!(session = %session.id, "recording session without a signed-in user");
        }
        if self.store.append_session(ctx.user_id(), session) {
            tracing::info!(
                session = %session.id,
                repetitions = session.repetitions,
                "session saved"
            );
        } else {
            tracing::error!(session = %session.id, "session could not be saved");
        }
    }
}
