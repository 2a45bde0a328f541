//! # Kegel Coach Core Library
//!
//! Core logic for a pelvic-floor exercise coach. Front ends (the bundled
//! CLI, or any UI) drive a [`PhaseEngine`] and render what it reports;
//! everything that has to be correct lives here.
//!
//! ## Architecture
//!
//! - **Phase Engine**: contract/relax state machine with an owned,
//!   cancellable countdown. The caller (or a tokio interval) delivers ticks.
//! - **Session Recorder**: writes one [`ExerciseSession`] per completed run
//!   into the signed-in user's log.
//! - **Progress**: pure aggregation of sessions into [`UserProgress`], with
//!   pluggable streak/week policies and incremental or recomputed strategies.
//! - **Storage**: JSON blobs in a key/value store (SQLite or in-memory) and
//!   TOML configuration.
//!
//! ## Key Components
//!
//! - [`Coach`]: engine plus notifications, recording and progress
//! - [`ProgressStore`]: typed, failure-swallowing persistence
//! - [`Config`]: application configuration management
//! - [`IdentityProvider`]: source of the signed-in user

pub mod coach;
pub mod error;
pub mod events;
pub mod exercises;
pub mod identity;
pub mod notify;
pub mod progress;
pub mod session;
pub mod storage;
pub mod timer;

pub use coach::{interval_coach, run_live, Coach, Control};
pub use error::{ConfigError, CoreError, IdentityError, StorageError, ValidationError};
pub use events::Event;
pub use exercises::Exercise;
pub use identity::{AuthContext, IdentityProvider, LocalIdentity, User, UserId};
pub use notify::{LogNotifier, NotificationKind, Notifier, NullNotifier};
pub use progress::{apply_session, AggregationStrategy, ProgressTracker, SkillLevel, UserProgress};
pub use session::{ExerciseSession, SessionId, SessionRecorder};
pub use storage::{Config, KeyValueStore, MemoryStore, ProgressStore, SqliteStore};
pub use timer::{ExerciseProtocol, Phase, PhaseEngine, TimerState};
