//! Typed JSON persistence over a [`KeyValueStore`].
//!
//! Every failure here is logged and swallowed: readers get `None` or an
//! empty list, writers get `false`. Callers treat "failed" and "nothing
//! stored yet" the same way.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::kv::KeyValueStore;
use crate::error::Result;
use crate::identity::{AuthContext, UserId};
use crate::progress::UserProgress;
use crate::session::ExerciseSession;

/// Installation-wide progress blob.
pub const PROGRESS_KEY: &str = "@kegel_progress";
/// Installation-wide session list; also where runs without a user land.
pub const SESSIONS_KEY: &str = "@kegel_sessions";
pub const USER_SESSIONS_PREFIX: &str = "kegel_sessions_";
pub const USER_PROGRESS_PREFIX: &str = "kegel_progress_";

pub fn user_sessions_key(user: &UserId) -> String {
    format!("{USER_SESSIONS_PREFIX}{user}")
}

pub fn user_progress_key(user: &UserId) -> String {
    format!("{USER_PROGRESS_PREFIX}{user}")
}

/// Session log key for a caller; the installation list when anonymous.
pub fn sessions_key_for(owner: Option<&UserId>) -> String {
    owner.map_or_else(|| SESSIONS_KEY.to_string(), user_sessions_key)
}

/// Progress key for a caller; the installation blob when anonymous.
pub fn progress_key_for(owner: Option<&UserId>) -> String {
    owner.map_or_else(|| PROGRESS_KEY.to_string(), user_progress_key)
}

pub struct ProgressStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Raw read. `None` on absence or failure.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, "error reading store: {e}");
                None
            }
        }
    }

    /// Raw write. `false` on failure.
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.backend.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, "error writing store: {e}");
                false
            }
        }
    }

    /// Absent is `Ok(None)`; a failed read or undecodable blob is an error.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read_json(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, "error reading stored value: {e}");
                None
            }
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, &json),
            Err(e) => {
                tracing::error!(key, "error encoding value: {e}");
                false
            }
        }
    }

    fn sessions_at(&self, key: &str) -> Vec<ExerciseSession> {
        self.get_json(key).unwrap_or_default()
    }

    /// Read-modify-write append. Last writer wins. Nothing is written when
    /// the existing log can't be read, so it is never replaced by a partial one.
    fn append_at(&self, key: &str, session: &ExerciseSession) -> bool {
        let mut sessions: Vec<ExerciseSession> = match self.read_json(key) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                tracing::error!(
                    key,
                    session = %session.id,
                    "existing log unreadable, not appending: {e}"
                );
                return false;
            }
        };
        sessions.push(session.clone());
        self.set_json(key, &sessions)
    }

    // ── Installation-wide ────────────────────────────────────────────

    pub fn stored_progress(&self) -> Option<UserProgress> {
        self.get_json::<UserProgress>(PROGRESS_KEY)
            .map(UserProgress::normalized)
    }

    pub fn store_progress(&self, progress: &UserProgress) -> bool {
        self.set_json(PROGRESS_KEY, progress)
    }

    pub fn stored_sessions(&self) -> Vec<ExerciseSession> {
        self.sessions_at(SESSIONS_KEY)
    }

    pub fn store_session(&self, session: &ExerciseSession) -> bool {
        self.append_at(SESSIONS_KEY, session)
    }

    // ── Per-user ─────────────────────────────────────────────────────

    /// Sessions of the signed-in user. Empty when nobody is signed in.
    pub fn user_sessions(&self, ctx: &AuthContext) -> Vec<ExerciseSession> {
        match ctx.user_id() {
            Some(user) => self.sessions_at(&user_sessions_key(user)),
            None => Vec::new(),
        }
    }

    /// Append to the owner's log, or to the installation list when there is
    /// no owner.
    pub fn append_session(&self, owner: Option<&UserId>, session: &ExerciseSession) -> bool {
        self.append_at(&sessions_key_for(owner), session)
    }

    /// Session log for `owner`, including the anonymous installation list.
    pub fn sessions_for(&self, owner: Option<&UserId>) -> Vec<ExerciseSession> {
        self.sessions_at(&sessions_key_for(owner))
    }

    /// Stored aggregate for the signed-in user, `None` when anonymous or
    /// nothing is stored.
    pub fn user_progress(&self, ctx: &AuthContext) -> Option<UserProgress> {
        let user = ctx.user_id()?;
        self.progress_for(Some(user))
    }

    pub fn progress_for(&self, owner: Option<&UserId>) -> Option<UserProgress> {
        self.get_json::<UserProgress>(&progress_key_for(owner))
            .map(UserProgress::normalized)
    }

    pub fn store_progress_for(&self, owner: Option<&UserId>, progress: &UserProgress) -> bool {
        self.set_json(&progress_key_for(owner), progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::identity::User;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Locked)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    /// Memory store whose next read can be made to fail once.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_next_get.swap(false, Ordering::SeqCst) {
                return Err(StorageError::Locked);
            }
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn ctx(id: &str) -> AuthContext {
        AuthContext::for_user(User {
            id: UserId::new(id),
            email: format!("{id}@example.com"),
        })
    }

    fn session(owner: Option<&str>) -> ExerciseSession {
        ExerciseSession::new(owner.map(UserId::new), 10, 5, 5, Utc::now())
    }

    #[test]
    fn keys_are_namespaced_per_user() {
        let user = UserId::new("abc");
        assert_eq!(user_sessions_key(&user), "kegel_sessions_abc");
        assert_eq!(sessions_key_for(None), "@kegel_sessions");
        assert_eq!(progress_key_for(Some(&user)), "kegel_progress_abc");
    }

    #[test]
    fn empty_reads_are_defaults() {
        let store = ProgressStore::new(MemoryStore::new());
        assert!(store.user_sessions(&ctx("u1")).is_empty());
        assert!(store.user_progress(&ctx("u1")).is_none());
        assert!(store.stored_progress().is_none());
        assert!(store.stored_sessions().is_empty());
    }

    #[test]
    fn anonymous_reads_are_empty() {
        let store = ProgressStore::new(MemoryStore::new());
        store.append_session(None, &session(None));
        assert!(store.user_sessions(&AuthContext::anonymous()).is_empty());
        assert!(store.user_progress(&AuthContext::anonymous()).is_none());
        assert_eq!(store.stored_sessions().len(), 1);
    }

    #[test]
    fn append_keeps_users_apart() {
        let store = ProgressStore::new(MemoryStore::new());
        let a = UserId::new("a");
        assert!(store.append_session(Some(&a), &session(Some("a"))));
        assert!(store.append_session(Some(&a), &session(Some("a"))));
        assert!(store.append_session(Some(&UserId::new("b")), &session(Some("b"))));
        assert_eq!(store.user_sessions(&ctx("a")).len(), 2);
        assert_eq!(store.user_sessions(&ctx("b")).len(), 1);
    }

    #[test]
    fn failures_are_swallowed() {
        let store = ProgressStore::new(BrokenStore);
        assert!(!store.store_progress(&UserProgress::default()));
        assert!(!store.append_session(None, &session(None)));
        assert!(store.stored_progress().is_none());
        assert!(store.user_sessions(&ctx("u1")).is_empty());
    }

    #[test]
    fn corrupt_blob_reads_as_empty() {
        let store = ProgressStore::new(MemoryStore::new());
        store.set("kegel_sessions_u1", "not json");
        assert!(store.user_sessions(&ctx("u1")).is_empty());
    }

    #[test]
    fn failed_read_does_not_clobber_log() {
        let flaky = FlakyStore::default();
        let store = ProgressStore::new(&flaky);
        let owner = UserId::new("u1");
        for _ in 0..5 {
            assert!(store.append_session(Some(&owner), &session(Some("u1"))));
        }

        flaky.fail_next_get.store(true, Ordering::SeqCst);
        assert!(!store.append_session(Some(&owner), &session(Some("u1"))));
        assert_eq!(store.user_sessions(&ctx("u1")).len(), 5);

        assert!(store.append_session(Some(&owner), &session(Some("u1"))));
        assert_eq!(store.user_sessions(&ctx("u1")).len(), 6);
    }

    #[test]
    fn corrupt_log_is_left_in_place() {
        let store = ProgressStore::new(MemoryStore::new());
        store.set("kegel_sessions_u1", "not json");
        assert!(!store.append_session(Some(&UserId::new("u1")), &session(Some("u1"))));
        assert_eq!(store.get("kegel_sessions_u1").as_deref(), Some("not json"));
    }

    #[test]
    fn progress_roundtrip() {
        let store = ProgressStore::new(MemoryStore::new());
        let progress = UserProgress::with_weekly_goal(3);
        assert!(store.store_progress(&progress));
        assert_eq!(store.stored_progress(), Some(progress));
    }
}
